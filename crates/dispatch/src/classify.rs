//! Presentation kind of a reply fragment.

use relay_nlu::MessageFragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Text,
    QuickReply,
    Image,
    CustomPayload,
    Card,
    Unknown,
}

impl FragmentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::QuickReply => "quick_reply",
            Self::Image => "image",
            Self::CustomPayload => "custom_payload",
            Self::Card => "card",
            Self::Unknown => "unknown",
        }
    }
}

#[must_use]
pub fn classify(fragment: &MessageFragment) -> FragmentKind {
    match fragment {
        MessageFragment::PlainText { .. } => FragmentKind::Text,
        MessageFragment::QuickReplyPrompt { .. } => FragmentKind::QuickReply,
        MessageFragment::Image { .. } => FragmentKind::Image,
        MessageFragment::CustomPayload { .. } => FragmentKind::CustomPayload,
        MessageFragment::CardContent(_) => FragmentKind::Card,
        MessageFragment::Unknown { .. } => FragmentKind::Unknown,
    }
}

/// What tapping a card button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Open the target as a link.
    Navigate,
    /// Send the target back as a postback token.
    Postback,
}

/// Targets starting with `http` are links; anything else is a postback token.
#[must_use]
pub fn classify_button(target: &str) -> ButtonAction {
    if target.starts_with("http") {
        ButtonAction::Navigate
    } else {
        ButtonAction::Postback
    }
}
