use thiserror::Error;

/// Why the text generator produced nothing usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("generation is disabled (no API key)")]
    Disabled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty response")]
    Empty,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}
