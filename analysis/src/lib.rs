pub mod error;
pub mod mode;
pub mod signals;
pub mod snapshot;
