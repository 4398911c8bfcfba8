use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::fmt;

use crate::error::AnalysisError;

/// Which edition of the review is being produced. Only template and prompt
/// choice depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Morning,
    Evening,
}

impl Mode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Evening => "EVENING",
        }
    }

    /// Scheduled delivery slot used in headings.
    pub const fn slot(&self) -> &'static str {
        match self {
            Self::Morning => "06:00",
            Self::Evening => "18:00",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModeSelector {
    offset: FixedOffset,
    cutoff_hour: u32,
}

impl ModeSelector {
    pub fn new(utc_offset_hours: i32, cutoff_hour: u32) -> Result<Self, AnalysisError> {
        if cutoff_hour > 24 {
            return Err(AnalysisError::InvalidCutoff(cutoff_hour));
        }
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(AnalysisError::InvalidOffset(utc_offset_hours))?;

        Ok(Self {
            offset,
            cutoff_hour,
        })
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    pub fn select(&self, now: DateTime<Utc>) -> Mode {
        if self.local_time(now).hour() < self.cutoff_hour {
            Mode::Morning
        } else {
            Mode::Evening
        }
    }
}
