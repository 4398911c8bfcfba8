use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::fmt;

use crate::error::SettingsError;

pub const DEFAULT_CONFIG_PATH: &str = "review.toml";
/// About one trading year of daily bars.
pub const MAX_AVG_VOLUME_WINDOW: usize = 260;

/// API keys and the webhook target. Read from the process environment only,
/// never from the config file.
#[derive(Clone, Default)]
pub struct Secrets {
    pub discord_webhook_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub news_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            discord_webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            news_api_key: non_empty_var("NEWS_API_KEY"),
        }
    }

    pub fn webhook_url(&self) -> &str {
        self.discord_webhook_url.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Secrets")
            .field("discord_webhook_url", &redact(&self.discord_webhook_url))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("news_api_key", &redact(&self.news_api_key))
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) market-review/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub chart_base_url: String,
    pub symbol: String,
    pub sector_symbol: String,
    pub sector_name: String,
    pub benchmark_symbol: String,
    pub benchmark_name: String,
    pub lookback: String,
    pub interval: String,
    pub avg_volume_window: usize,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            chart_base_url: "https://query1.finance.yahoo.com".to_string(),
            symbol: "NVDA".to_string(),
            sector_symbol: "^SOX".to_string(),
            sector_name: "SOX index".to_string(),
            benchmark_symbol: "^IXIC".to_string(),
            benchmark_name: "NASDAQ".to_string(),
            lookback: "10d".to_string(),
            interval: "1d".to_string(),
            avg_volume_window: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub api_base_url: String,
    /// Search query. Defaults to the reviewed symbol plus the sector keyword.
    pub query: Option<String>,
    pub limit: usize,
    /// RSS feeds. Defaults to the headline feed for the reviewed symbol plus
    /// the semiconductor industry and politics feeds.
    pub rss_feeds: Option<Vec<String>>,
    pub per_feed: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://newsapi.org".to_string(),
            query: None,
            limit: 9,
            rss_feeds: None,
            per_feed: 3,
        }
    }
}

impl NewsSettings {
    pub fn query_for(&self, symbol: &str) -> String {
        self.query
            .clone()
            .unwrap_or_else(|| format!("{symbol} OR semiconductor"))
    }

    pub fn feeds_for(&self, symbol: &str) -> Vec<String> {
        self.rss_feeds.clone().unwrap_or_else(|| {
            vec![
                format!("https://finance.yahoo.com/rss/headline?s={symbol}"),
                "https://finance.yahoo.com/rss/industry?s=semiconductors".to_string(),
                "https://finance.yahoo.com/rss/politics".to_string(),
            ]
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 700,
            system_prompt: "You are a professional US equity market analyst.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub utc_offset_hours: i32,
    pub zone_label: String,
    /// Local hours strictly below this are MORNING.
    pub morning_cutoff_hour: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
            zone_label: "JST".to_string(),
            morning_cutoff_hour: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookFormat {
    #[default]
    Content,
    Embed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub format: WebhookFormat,
    pub notify_on_error: bool,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            format: WebhookFormat::Content,
            notify_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    pub secrets: Secrets,
    pub http: HttpSettings,
    pub market: MarketSettings,
    pub news: NewsSettings,
    pub generation: GenerationSettings,
    pub report: ReportSettings,
    pub webhook: WebhookSettings,
}

impl Settings {
    /// Load `.env`, then `review.toml` (or `$REVIEW_CONFIG`), then `REVIEW__*`
    /// overrides. Fails before any network access when the webhook is unset.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let path = env::var("REVIEW_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let builder = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("REVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder, Secrets::from_env())
    }

    pub fn from_toml(toml: &str, secrets: Secrets) -> Result<Self, SettingsError> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::from_builder(builder, secrets)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        secrets: Secrets,
    ) -> Result<Self, SettingsError> {
        if secrets.discord_webhook_url.is_none() {
            return Err(SettingsError::MissingWebhook);
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.secrets = secrets;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_AVG_VOLUME_WINDOW).contains(&self.market.avg_volume_window) {
            return Err(SettingsError::Invalid(format!(
                "market.avg_volume_window must be between 1 and {}, got {}",
                MAX_AVG_VOLUME_WINDOW, self.market.avg_volume_window
            )));
        }
        if self.report.morning_cutoff_hour > 24 {
            return Err(SettingsError::Invalid(format!(
                "report.morning_cutoff_hour {} is not an hour of the day",
                self.report.morning_cutoff_hour
            )));
        }
        if !(-23..=23).contains(&self.report.utc_offset_hours) {
            return Err(SettingsError::Invalid(format!(
                "report.utc_offset_hours {} is out of range",
                self.report.utc_offset_hours
            )));
        }
        Ok(())
    }
}
