//! Recording outbound used by the unit tests in this crate.

use std::sync::Mutex;

use {
    async_trait::async_trait,
    relay_messenger::{
        MessengerOutbound, QuickReply, SenderAction, TemplateButton, TemplateElement,
    },
    serde_json::Value,
    tokio::time::{Duration, Instant},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    QuickReplies(String, Vec<QuickReply>),
    Image(String),
    Generic(Vec<TemplateElement>),
    Buttons(String, Vec<TemplateButton>),
    Raw(Value),
    Action(SenderAction),
}

/// Records every call with its recipient and the time it landed.
pub struct RecordingOutbound {
    started: Instant,
    calls: Mutex<Vec<(Duration, String, Sent)>>,
    /// Text sends with exactly this body fail.
    fail_text: Option<String>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            calls: Mutex::new(Vec::new()),
            fail_text: None,
        }
    }

    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_text: Some(text.to_string()),
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, s)| s.clone())
            .collect()
    }

    pub fn timeline(&self) -> Vec<(Duration, Sent)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _, s)| (*at, s.clone()))
            .collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r, _)| r.clone())
            .collect()
    }

    fn record(&self, recipient: &str, sent: Sent) {
        self.calls
            .lock()
            .unwrap()
            .push((self.started.elapsed(), recipient.to_string(), sent));
    }
}

#[async_trait]
impl MessengerOutbound for RecordingOutbound {
    async fn send_text(&self, recipient: &str, text: &str) -> relay_messenger::Result<()> {
        if self.fail_text.as_deref() == Some(text) {
            return Err(relay_messenger::Error::Api {
                status: 500,
                body: "boom".into(),
            });
        }
        self.record(recipient, Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::QuickReplies(text.to_string(), replies.to_vec()));
        Ok(())
    }

    async fn send_image(&self, recipient: &str, url: &str) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::Image(url.to_string()));
        Ok(())
    }

    async fn send_generic_template(
        &self,
        recipient: &str,
        elements: &[TemplateElement],
    ) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::Generic(elements.to_vec()));
        Ok(())
    }

    async fn send_button_template(
        &self,
        recipient: &str,
        text: &str,
        buttons: &[TemplateButton],
    ) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::Buttons(text.to_string(), buttons.to_vec()));
        Ok(())
    }

    async fn send_raw(&self, recipient: &str, message: &Value) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::Raw(message.clone()));
        Ok(())
    }

    async fn send_sender_action(
        &self,
        recipient: &str,
        action: SenderAction,
    ) -> relay_messenger::Result<()> {
        self.record(recipient, Sent::Action(action));
        Ok(())
    }
}
