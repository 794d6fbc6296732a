use serde_json::{Map, Value};

/// The decoded result of one NLU query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NluResponse {
    /// Spoken reply text; may be empty.
    pub speech: String,
    /// Opaque platform payloads keyed by platform name (e.g. `facebook`).
    pub structured_data: Option<Value>,
    /// Rich message fragments in the order the service returned them.
    pub fragments: Vec<MessageFragment>,
    /// Action directive. Fallback intents and empty strings decode to `None`.
    pub action: Option<String>,
    pub contexts: Vec<Context>,
    pub parameters: Map<String, Value>,
    /// Name of the matched intent, for logging.
    pub intent_name: Option<String>,
}

impl NluResponse {
    /// The `facebook` member of the structured payload, when present.
    #[must_use]
    pub fn platform_data(&self) -> Option<&Value> {
        self.structured_data.as_ref()?.get("facebook")
    }

    /// Look up a context by name, case-insensitively.
    ///
    /// Context names come back lowercased from the service regardless of how
    /// they were declared.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        find_context(&self.contexts, name)
    }
}

/// Find a context by name in an ordered context list, case-insensitively.
pub fn find_context<'a>(contexts: &'a [Context], name: &str) -> Option<&'a Context> {
    contexts.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// An active conversation context with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub name: String,
    pub parameters: Map<String, Value>,
    pub lifespan: Option<u32>,
}

impl Context {
    /// A parameter rendered as a non-empty string.
    ///
    /// Numbers are rendered with their JSON representation; empty strings,
    /// nulls and structured values count as absent.
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<String> {
        match self.parameters.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One unit of platform-agnostic reply content.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageFragment {
    PlainText {
        text: String,
    },
    QuickReplyPrompt {
        title: String,
        options: Vec<QuickReplyOption>,
    },
    Image {
        url: String,
    },
    CardContent(Card),
    /// Platform payload forwarded untouched.
    CustomPayload {
        body: Value,
    },
    /// A message type this relay does not know how to render.
    Unknown {
        tag: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReplyOption {
    pub label: String,
    pub value: String,
}

impl QuickReplyOption {
    /// An option whose payload is its own label.
    #[must_use]
    pub fn echo(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub buttons: Vec<Button>,
}

/// A card button. Whether `target` is a link or a postback token is decided
/// by the dispatcher, not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub target: String,
}
