use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("NLU request failed ({status}): {body}")]
    Api { status: u16, body: String },

    /// The service answered 200 but reported a failure in its status block.
    #[error("NLU query rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl relay_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

relay_common::impl_context!();
