use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Need at least two bars to build a snapshot, got {bars}")]
    InsufficientHistory { bars: usize },

    #[error("Bar {index} is invalid: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Average volume window must be at least 1")]
    InvalidWindow,

    #[error("UTC offset of {0} hours is out of range")]
    InvalidOffset(i32),

    #[error("Cutoff hour {0} is not an hour of the day")]
    InvalidCutoff(u32),
}
