pub mod config;
pub mod error;
pub mod model;
pub mod retry;

pub use config::Config;
pub use error::{ConfigError, EventError};
pub use model::{AbandonReason, CommandStatus, LifecycleEvent, Outcome};
pub use retry::{Backoff, RetryPolicy};
