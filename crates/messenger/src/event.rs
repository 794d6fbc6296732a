//! Inbound webhook payloads.

use {serde::Deserialize, serde_json::Value};

/// Top-level webhook body: a batch of entries.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: String,
}

/// One messaging event. Exactly one of the optional members is set by the
/// platform; [`MessagingEvent::kind`] resolves which.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    pub recipient: Participant,
    #[serde(default)]
    pub timestamp: i64,
    optin: Option<Optin>,
    message: Option<InboundMessage>,
    delivery: Option<Delivery>,
    postback: Option<Postback>,
    read: Option<Read>,
}

/// Resolved event variant.
#[derive(Debug, Clone, Copy)]
pub enum EventKind<'a> {
    Optin(&'a Optin),
    Message(&'a InboundMessage),
    Delivery(&'a Delivery),
    Postback(&'a Postback),
    Read(&'a Read),
    Unsupported,
}

impl MessagingEvent {
    pub fn kind(&self) -> EventKind<'_> {
        if let Some(optin) = &self.optin {
            EventKind::Optin(optin)
        } else if let Some(message) = &self.message {
            EventKind::Message(message)
        } else if let Some(delivery) = &self.delivery {
            EventKind::Delivery(delivery)
        } else if let Some(postback) = &self.postback {
            EventKind::Postback(postback)
        } else if let Some(read) = &self.read {
            EventKind::Read(read)
        } else {
            EventKind::Unsupported
        }
    }
}

/// Authentication callback from the "Send to Messenger" plugin.
#[derive(Debug, Clone, Deserialize)]
pub struct Optin {
    #[serde(rename = "ref", default)]
    pub data_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Set when the page itself sent the message.
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub app_id: Option<u64>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyPayload>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickReplyPayload {
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub attachment_type: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl InboundMessage {
    /// Text to forward to the NLU service.
    ///
    /// A tapped quick reply carries its payload, which takes precedence over
    /// the displayed label.
    pub fn utterance(&self) -> Option<&str> {
        self.quick_reply
            .as_ref()
            .map(|q| q.payload.as_str())
            .or(self.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub mids: Vec<String>,
    pub watermark: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    #[serde(default)]
    pub title: Option<String>,
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Read {
    pub watermark: i64,
}
