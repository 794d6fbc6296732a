//! Wire shapes of the `query` endpoint and their conversion into
//! [`NluResponse`].

use {
    serde::Deserialize,
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::types::{Button, Card, Context, MessageFragment, NluResponse, QuickReplyOption};

/// Action the service reports when no intent matched.
const FALLBACK_ACTION: &str = "input.unknown";

/// Platform whose scoped messages this relay renders.
const PLATFORM: &str = "facebook";

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub result: Option<QueryResult>,
    #[serde(default)]
    pub status: Option<QueryStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryStatus {
    pub code: u16,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_details: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct QueryResult {
    pub action: Option<String>,
    pub parameters: Map<String, Value>,
    pub contexts: Vec<WireContext>,
    pub metadata: Option<WireMetadata>,
    pub fulfillment: Option<WireFulfillment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireMetadata {
    pub intent_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireContext {
    pub name: String,
    pub parameters: Map<String, Value>,
    pub lifespan: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireFulfillment {
    pub speech: String,
    pub data: Option<Value>,
    pub messages: Vec<Value>,
}

impl QueryStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn describe(&self) -> String {
        match (&self.error_type, &self.error_details) {
            (Some(kind), Some(details)) => format!("{kind}: {details}"),
            (Some(kind), None) => kind.clone(),
            (None, Some(details)) => details.clone(),
            (None, None) => "unknown error".into(),
        }
    }
}

impl From<QueryResult> for NluResponse {
    fn from(result: QueryResult) -> Self {
        let fulfillment = result.fulfillment.unwrap_or_default();
        let action = result
            .action
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && a != FALLBACK_ACTION);

        Self {
            speech: fulfillment.speech,
            structured_data: fulfillment.data.filter(|d| !d.is_null()),
            fragments: decode_messages(&fulfillment.messages),
            action,
            contexts: result
                .contexts
                .into_iter()
                .map(|c| Context {
                    name: c.name,
                    parameters: c.parameters,
                    lifespan: c.lifespan,
                })
                .collect(),
            parameters: result.parameters,
            intent_name: result.metadata.and_then(|m| m.intent_name),
        }
    }
}

/// Decode the fulfillment message list.
///
/// When any message is scoped to this relay's platform, only those are kept;
/// otherwise the unscoped (default) messages are used.
pub(crate) fn decode_messages(messages: &[Value]) -> Vec<MessageFragment> {
    let platform_of = |m: &Value| m.get("platform").and_then(Value::as_str).map(str::to_owned);
    let has_platform_specific = messages
        .iter()
        .any(|m| platform_of(m).as_deref() == Some(PLATFORM));

    messages
        .iter()
        .filter(|m| match platform_of(m) {
            Some(p) => p == PLATFORM,
            None => !has_platform_specific,
        })
        .map(decode_message)
        .collect()
}

fn message_tag(message: &Value) -> String {
    match message.get("type") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::from("missing"),
    }
}

fn str_field(message: &Value, key: &str) -> Option<String> {
    message
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn decode_message(message: &Value) -> MessageFragment {
    let tag = message_tag(message);
    match tag.as_str() {
        "0" => MessageFragment::PlainText {
            text: str_field(message, "speech").unwrap_or_default(),
        },
        "1" => MessageFragment::CardContent(Card {
            title: str_field(message, "title").unwrap_or_default(),
            subtitle: str_field(message, "subtitle"),
            image_url: str_field(message, "imageUrl"),
            buttons: message
                .get("buttons")
                .and_then(Value::as_array)
                .map(|buttons| buttons.iter().filter_map(decode_button).collect())
                .unwrap_or_default(),
        }),
        "2" => MessageFragment::QuickReplyPrompt {
            title: str_field(message, "title").unwrap_or_default(),
            options: message
                .get("replies")
                .and_then(Value::as_array)
                .map(|replies| {
                    replies
                        .iter()
                        .filter_map(Value::as_str)
                        .map(QuickReplyOption::echo)
                        .collect()
                })
                .unwrap_or_default(),
        },
        "3" => match str_field(message, "imageUrl") {
            Some(url) => MessageFragment::Image { url },
            None => MessageFragment::Unknown { tag },
        },
        "4" => {
            let payload = message.get("payload").cloned().unwrap_or(Value::Null);
            let body = payload.get(PLATFORM).cloned().unwrap_or(payload);
            MessageFragment::CustomPayload { body }
        },
        _ => {
            debug!(tag, "unrecognized NLU message type");
            MessageFragment::Unknown { tag }
        },
    }
}

fn decode_button(button: &Value) -> Option<Button> {
    let label = str_field(button, "text")?;
    let target = str_field(button, "postback").unwrap_or_else(|| label.clone());
    Some(Button { label, target })
}
