use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The platform member of the structured payload could not be rendered as
    /// text.
    #[error("malformed structured payload: {reason}")]
    MalformedStructuredPayload { reason: String },

    #[error("unknown fragment kind '{tag}'")]
    UnknownFragmentKind { tag: String },

    #[error("unknown action '{action}'")]
    UnknownAction { action: String },

    #[error("action '{action}' needs parameter '{parameter}' from context '{context}'")]
    MissingParameter {
        action: String,
        context: String,
        parameter: String,
    },

    #[error(transparent)]
    Outbound(#[from] relay_messenger::Error),

    /// A side-effecting action handler failed.
    #[error("{message}")]
    Handler { message: String },
}

impl Error {
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedStructuredPayload {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }
}

impl relay_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Handler { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

relay_common::impl_context!();
