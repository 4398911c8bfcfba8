use analysis::error::AnalysisError;
use analysis::mode::{Mode, ModeSelector};
use chrono::{DateTime, FixedOffset, Utc};
use market_data::config::{Secrets, Settings};

/// Optional collaborators enabled for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub generation: bool,
    pub news_search: bool,
}

impl Capabilities {
    pub fn detect(secrets: &Secrets) -> Self {
        Self {
            generation: secrets.openai_api_key.is_some(),
            news_search: secrets.news_api_key.is_some(),
        }
    }
}

/// Everything a run reads, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub capabilities: Capabilities,
    pub local_now: DateTime<FixedOffset>,
    pub mode: Mode,
}

impl RunContext {
    pub fn new(settings: Settings, now: DateTime<Utc>) -> Result<Self, AnalysisError> {
        let selector = ModeSelector::new(
            settings.report.utc_offset_hours,
            settings.report.morning_cutoff_hour,
        )?;

        Ok(Self {
            capabilities: Capabilities::detect(&settings.secrets),
            local_now: selector.local_time(now),
            mode: selector.select(now),
            settings,
        })
    }

    /// e.g. `06:00 JST`
    pub fn time_label(&self) -> String {
        format!("{} {}", self.mode.slot(), self.settings.report.zone_label)
    }

    pub fn sent_at(&self) -> String {
        format!(
            "{} {}",
            self.local_now.format("%Y-%m-%d %H:%M"),
            self.settings.report.zone_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings(secrets: Secrets) -> Settings {
        Settings::from_toml("", secrets).unwrap()
    }

    fn webhook_only() -> Secrets {
        Secrets {
            discord_webhook_url: Some("https://discord.test/hook".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn capabilities_follow_optional_keys() {
        assert_eq!(
            Capabilities::detect(&webhook_only()),
            Capabilities {
                generation: false,
                news_search: false
            }
        );

        let secrets = Secrets {
            openai_api_key: Some("sk-test".to_string()),
            news_api_key: Some("news".to_string()),
            ..webhook_only()
        };
        assert_eq!(
            Capabilities::detect(&secrets),
            Capabilities {
                generation: true,
                news_search: true
            }
        );
    }

    #[test]
    fn labels_use_local_time() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 21, 5, 0).unwrap();
        let ctx = RunContext::new(settings(webhook_only()), now).unwrap();

        assert_eq!(ctx.mode, Mode::Morning);
        assert_eq!(ctx.time_label(), "06:00 JST");
        assert_eq!(ctx.sent_at(), "2025-03-15 06:05 JST");
    }
}
