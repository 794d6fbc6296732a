//! Graph Send API client.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{debug, warn},
};

use relay_config::MessengerConfig;

use crate::{
    error::{Error, Result},
    outbound::{MessengerOutbound, QuickReply, SenderAction, TemplateButton, TemplateElement},
};

/// Platform caps; anything past them is dropped with a warning rather than
/// letting the whole call be rejected.
const MAX_TEXT_CHARS: usize = 2000;
const MAX_QUICK_REPLIES: usize = 11;
const MAX_QUICK_REPLY_TITLE_CHARS: usize = 20;
const MAX_TEMPLATE_ELEMENTS: usize = 10;
const MAX_TEMPLATE_BUTTONS: usize = 3;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    recipient_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

/// Outbound sender backed by `POST /me/messages`.
pub struct GraphSendApi {
    http: reqwest::Client,
    base_url: String,
    page_access_token: Secret<String>,
}

impl GraphSendApi {
    pub fn new(config: &MessengerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &MessengerConfig) -> Self {
        Self {
            http,
            base_url: config.graph_api_url.trim_end_matches('/').to_string(),
            page_access_token: config.page_access_token.clone(),
        }
    }

    async fn call_send_api(&self, body: Value) -> Result<()> {
        let url = format!("{}/me/messages", self.base_url);
        let resp = self
            .http
            .post(url)
            .query(&[("access_token", self.page_access_token.expose_secret())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let sent: SendResponse = resp.json().await?;
        match sent.message_id {
            Some(message_id) => debug!(
                recipient = sent.recipient_id.as_deref().unwrap_or(""),
                message_id, "Send API accepted message"
            ),
            None => debug!(
                recipient = sent.recipient_id.as_deref().unwrap_or(""),
                "Send API accepted call"
            ),
        }
        Ok(())
    }

    async fn send_message(&self, recipient: &str, message: Value) -> Result<()> {
        self.call_send_api(json!({
            "recipient": { "id": recipient },
            "message": message,
        }))
        .await
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn capped<'a, T>(items: &'a [T], max: usize, what: &str) -> &'a [T] {
    if items.len() > max {
        warn!(count = items.len(), max, "dropping {what} over the platform limit");
        &items[..max]
    } else {
        items
    }
}

fn limit_text(text: &str) -> String {
    if text.chars().count() > MAX_TEXT_CHARS {
        warn!(max = MAX_TEXT_CHARS, "truncating outbound text");
    }
    truncate_chars(text, MAX_TEXT_CHARS)
}

#[async_trait]
impl MessengerOutbound for GraphSendApi {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<()> {
        self.send_message(recipient, json!({ "text": limit_text(text) }))
            .await
    }

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        replies: &[QuickReply],
    ) -> Result<()> {
        let quick_replies: Vec<Value> = capped(replies, MAX_QUICK_REPLIES, "quick replies")
            .iter()
            .map(|r| {
                json!({
                    "content_type": "text",
                    "title": truncate_chars(&r.title, MAX_QUICK_REPLY_TITLE_CHARS),
                    "payload": r.payload,
                })
            })
            .collect();
        self.send_message(
            recipient,
            json!({ "text": limit_text(text), "quick_replies": quick_replies }),
        )
        .await
    }

    async fn send_image(&self, recipient: &str, url: &str) -> Result<()> {
        self.send_message(
            recipient,
            json!({
                "attachment": {
                    "type": "image",
                    "payload": { "url": url },
                },
            }),
        )
        .await
    }

    async fn send_generic_template(
        &self,
        recipient: &str,
        elements: &[TemplateElement],
    ) -> Result<()> {
        let elements: Vec<TemplateElement> =
            capped(elements, MAX_TEMPLATE_ELEMENTS, "template elements")
                .iter()
                .map(|e| TemplateElement {
                    buttons: capped(&e.buttons, MAX_TEMPLATE_BUTTONS, "element buttons").to_vec(),
                    ..e.clone()
                })
                .collect();
        self.send_message(
            recipient,
            json!({
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "generic",
                        "elements": elements,
                    },
                },
            }),
        )
        .await
    }

    async fn send_button_template(
        &self,
        recipient: &str,
        text: &str,
        buttons: &[TemplateButton],
    ) -> Result<()> {
        self.send_message(
            recipient,
            json!({
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "button",
                        "text": limit_text(text),
                        "buttons": capped(buttons, MAX_TEMPLATE_BUTTONS, "template buttons"),
                    },
                },
            }),
        )
        .await
    }

    async fn send_raw(&self, recipient: &str, message: &Value) -> Result<()> {
        self.send_message(recipient, message.clone()).await
    }

    async fn send_sender_action(&self, recipient: &str, action: SenderAction) -> Result<()> {
        self.call_send_api(json!({
            "recipient": { "id": recipient },
            "sender_action": action,
        }))
        .await
    }
}
