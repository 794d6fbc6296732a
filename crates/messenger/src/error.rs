use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// `X-Hub-Signature` header absent on a signed webhook.
    #[error("missing webhook signature")]
    SignatureMissing,

    /// Signature present but does not match the body.
    #[error("invalid webhook signature: {reason}")]
    SignatureInvalid { reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Send API request failed ({status}): {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn signature_invalid(reason: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
