//! `help.links`: a button template pointing at configured help pages.

use {
    async_trait::async_trait,
    relay_config::HelpLink,
    relay_messenger::{MessengerOutbound, TemplateButton},
};

use {
    super::{ActionHandler, ActionRequest, ResolvedParams},
    crate::{
        classify::{ButtonAction, classify_button},
        error::{Error, Result},
    },
};

pub const ACTION: &str = "help.links";

pub struct HelpLinksHandler {
    text: String,
    links: Vec<HelpLink>,
}

impl HelpLinksHandler {
    pub fn new(text: String, links: Vec<HelpLink>) -> Self {
        Self { text, links }
    }
}

#[async_trait]
impl ActionHandler for HelpLinksHandler {
    async fn handle(
        &self,
        request: &ActionRequest<'_>,
        _params: &ResolvedParams,
        outbound: &dyn MessengerOutbound,
    ) -> Result<()> {
        if self.links.is_empty() {
            return Err(Error::handler("no help links configured"));
        }
        let buttons: Vec<TemplateButton> = self
            .links
            .iter()
            .map(|link| match classify_button(&link.url) {
                ButtonAction::Navigate => TemplateButton::WebUrl {
                    title: link.title.clone(),
                    url: link.url.clone(),
                },
                ButtonAction::Postback => TemplateButton::Postback {
                    title: link.title.clone(),
                    payload: link.url.clone(),
                },
            })
            .collect();
        outbound
            .send_button_template(request.recipient, &self.text, &buttons)
            .await?;
        Ok(())
    }
}
