use {async_trait::async_trait, serde::Serialize, serde_json::Value};

use crate::error::Result;

/// Send messages to one Messenger recipient.
///
/// One method per outbound call shape. Implementations perform exactly one
/// API call per invocation and never retry.
#[async_trait]
pub trait MessengerOutbound: Send + Sync {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<()>;

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<()>;

    /// Image attachment referenced by URL.
    async fn send_image(&self, recipient: &str, url: &str) -> Result<()>;

    /// Generic template: a horizontally scrollable carousel of elements.
    async fn send_generic_template(
        &self,
        recipient: &str,
        elements: &[TemplateElement],
    ) -> Result<()>;

    /// Button template: text with up to three buttons.
    async fn send_button_template(
        &self,
        recipient: &str,
        text: &str,
        buttons: &[TemplateButton],
    ) -> Result<()>;

    /// Send a prebuilt `message` object untouched.
    async fn send_raw(&self, recipient: &str, message: &Value) -> Result<()>;

    /// Typing indicators and read receipts. No-op by default.
    async fn send_sender_action(&self, _recipient: &str, _action: SenderAction) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub title: String,
    pub payload: String,
}

impl QuickReply {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateElement {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<TemplateButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateButton {
    /// Opens a link in the in-app browser.
    WebUrl { title: String, url: String },
    /// Sends `payload` back to the webhook as a postback event.
    Postback { title: String, payload: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}
