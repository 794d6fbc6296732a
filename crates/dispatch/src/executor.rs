//! One outbound call per dispatch unit.

use std::sync::Arc;

use {
    relay_messenger::{MessengerOutbound, QuickReply, TemplateButton, TemplateElement},
    relay_nlu::{Button, Card, MessageFragment},
    tracing::{debug, warn},
};

use crate::{
    aggregate::DispatchPayload,
    classify::{ButtonAction, classify_button},
    error::{Error, Result},
    pacer::DispatchUnit,
};

/// Renders dispatch units into outbound calls.
#[derive(Clone)]
pub struct Executor {
    outbound: Arc<dyn MessengerOutbound>,
}

impl Executor {
    pub fn new(outbound: Arc<dyn MessengerOutbound>) -> Self {
        Self { outbound }
    }

    pub fn outbound(&self) -> &Arc<dyn MessengerOutbound> {
        &self.outbound
    }

    /// Send one unit. Failures are logged and never retried.
    pub async fn execute(&self, unit: DispatchUnit) {
        let label = unit.payload.label();
        match self.send(&unit.recipient, unit.payload).await {
            Ok(()) => debug!(recipient = %unit.recipient, unit = label, "dispatched"),
            Err(e) => warn!(
                recipient = %unit.recipient,
                unit = label,
                error = %e,
                "dispatch failed"
            ),
        }
    }

    /// Map a payload to its call shape and send it.
    pub async fn send(&self, recipient: &str, payload: DispatchPayload) -> Result<()> {
        let out = self.outbound.as_ref();
        match payload {
            DispatchPayload::Carousel(cards) => send_cards(out, recipient, cards).await?,
            DispatchPayload::Single(fragment) => match fragment {
                MessageFragment::PlainText { text } => out.send_text(recipient, &text).await?,
                MessageFragment::QuickReplyPrompt { title, options } => {
                    let replies: Vec<QuickReply> = options
                        .into_iter()
                        .map(|o| QuickReply::new(o.label, o.value))
                        .collect();
                    out.send_quick_replies(recipient, &title, &replies).await?;
                },
                MessageFragment::Image { url } => out.send_image(recipient, &url).await?,
                MessageFragment::CustomPayload { body } => out.send_raw(recipient, &body).await?,
                // `aggregate` never emits this; a hand-built unit is a
                // one-card carousel.
                MessageFragment::CardContent(card) => send_cards(out, recipient, vec![card]).await?,
                MessageFragment::Unknown { tag } => {
                    return Err(Error::UnknownFragmentKind { tag });
                },
            },
        }
        Ok(())
    }
}

async fn send_cards(
    out: &dyn MessengerOutbound,
    recipient: &str,
    cards: Vec<Card>,
) -> Result<()> {
    let elements: Vec<TemplateElement> = cards.into_iter().map(card_element).collect();
    out.send_generic_template(recipient, &elements).await?;
    Ok(())
}

fn card_element(card: Card) -> TemplateElement {
    TemplateElement {
        title: card.title,
        subtitle: card.subtitle,
        image_url: card.image_url,
        buttons: card.buttons.into_iter().map(template_button).collect(),
    }
}

fn template_button(button: Button) -> TemplateButton {
    match classify_button(&button.target) {
        ButtonAction::Navigate => TemplateButton::WebUrl {
            title: button.label,
            url: button.target,
        },
        ButtonAction::Postback => TemplateButton::Postback {
            title: button.label,
            payload: button.target,
        },
    }
}
