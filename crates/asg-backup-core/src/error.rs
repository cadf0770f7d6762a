use thiserror::Error;

/// Errors raised while validating an inbound lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event has no `detail` object")]
    MissingDetail,

    #[error("event detail is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("event detail field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("event is not a lifecycle action: {0}")]
    Malformed(String),
}

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse duration `{value}`")]
    InvalidDuration { var: &'static str, value: String },

    #[error("{var}: duration must be greater than zero")]
    ZeroDuration { var: &'static str },

    #[error("{var}: command timeout {secs}s is outside the allowed range of 30s..=30d")]
    CommandTimeoutOutOfRange { var: &'static str, secs: u64 },

    #[error("{var}: document name must not be empty")]
    EmptyDocumentName { var: &'static str },
}
