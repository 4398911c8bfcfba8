use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("DISCORD_WEBHOOK_URL is not set")]
    MissingWebhook,

    #[error("Config could not be loaded: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("RSS parse error: {0}")]
    RssError(#[from] rss::Error),

    #[error("{url} responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("No data returned for {0}")]
    NoData(String),
}
