pub mod context;
pub mod error;
pub mod generator;
pub mod notifier;
pub mod pipeline;
pub mod report;
