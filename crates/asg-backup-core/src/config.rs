use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// SSM document run on terminating instances unless overridden.
pub const DEFAULT_DOCUMENT_NAME: &str = "ASGLogBackup";

/// Execution timeout passed to SendCommand: 120 seconds.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// SendCommand accepts timeouts between 30 seconds and 30 days.
pub const MIN_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_COMMAND_TIMEOUT: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub const DOCUMENT_NAME_VAR: &str = "BACKUP_DOCUMENT_NAME";
pub const COMMAND_TIMEOUT_VAR: &str = "BACKUP_COMMAND_TIMEOUT";
pub const INITIAL_DELAY_VAR: &str = "BACKUP_RETRY_INITIAL_DELAY";
pub const MAX_DELAY_VAR: &str = "BACKUP_RETRY_MAX_DELAY";
pub const MAX_ELAPSED_VAR: &str = "BACKUP_RETRY_MAX_ELAPSED";

/// Runtime settings for the backup orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the SSM document that performs the backup.
    pub document_name: String,
    /// Execution timeout for the dispatched command.
    pub command_timeout: Duration,
    /// Backoff used by both polling loops.
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Unset
    /// variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let document_name = match lookup(DOCUMENT_NAME_VAR) {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::EmptyDocumentName {
                    var: DOCUMENT_NAME_VAR,
                });
            }
            Some(name) => name.trim().to_string(),
            None => defaults.document_name,
        };

        let command_timeout =
            duration_var(&lookup, COMMAND_TIMEOUT_VAR)?.unwrap_or(defaults.command_timeout);
        if command_timeout < MIN_COMMAND_TIMEOUT || command_timeout > MAX_COMMAND_TIMEOUT {
            return Err(ConfigError::CommandTimeoutOutOfRange {
                var: COMMAND_TIMEOUT_VAR,
                secs: command_timeout.as_secs(),
            });
        }

        let retry = RetryPolicy {
            initial_delay: duration_var(&lookup, INITIAL_DELAY_VAR)?
                .unwrap_or(defaults.retry.initial_delay),
            max_delay: duration_var(&lookup, MAX_DELAY_VAR)?.unwrap_or(defaults.retry.max_delay),
            max_elapsed: duration_var(&lookup, MAX_ELAPSED_VAR)?
                .unwrap_or(defaults.retry.max_elapsed),
        };

        Ok(Self {
            document_name,
            command_timeout,
            retry,
        })
    }
}

/// Read a non-zero duration variable, if set.
fn duration_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    let duration = parse_duration(&value).ok_or_else(|| ConfigError::InvalidDuration {
        var,
        value: value.clone(),
    })?;

    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration { var });
    }

    Ok(Some(duration))
}

/// Parse a duration string.
///
/// Accepts either:
/// - Human-readable shorthand via `humantime` (e.g. "90s", "2m", "1m30s")
/// - Raw seconds as a plain integer (e.g. "120")
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    if let Ok(d) = humantime::parse_duration(s) {
        return Some(d);
    }

    s.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.document_name, "ASGLogBackup");
        assert_eq!(config.command_timeout, Duration::from_secs(120));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DOCUMENT_NAME_VAR, "NightlyLogs"),
            (COMMAND_TIMEOUT_VAR, "5m"),
            (INITIAL_DELAY_VAR, "500ms"),
            (MAX_DELAY_VAR, "10"),
            (MAX_ELAPSED_VAR, "2m"),
        ]))
        .unwrap();

        assert_eq!(config.document_name, "NightlyLogs");
        assert_eq!(config.command_timeout, Duration::from_secs(300));
        assert_eq!(config.retry.initial_delay, Duration::from_millis(500));
        assert_eq!(config.retry.max_delay, Duration::from_secs(10));
        assert_eq!(config.retry.max_elapsed, Duration::from_secs(120));
    }

    #[test]
    fn rejects_unparseable_duration() {
        let err = Config::from_lookup(lookup(&[(MAX_ELAPSED_VAR, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDuration {
                var: MAX_ELAPSED_VAR,
                value: "soon".into()
            }
        );
    }

    #[test]
    fn rejects_zero_delay() {
        let err = Config::from_lookup(lookup(&[(INITIAL_DELAY_VAR, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroDuration { var: INITIAL_DELAY_VAR });
    }

    #[test]
    fn rejects_command_timeout_out_of_range() {
        let err = Config::from_lookup(lookup(&[(COMMAND_TIMEOUT_VAR, "10s")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::CommandTimeoutOutOfRange {
                var: COMMAND_TIMEOUT_VAR,
                secs: 10
            }
        );
    }

    #[test]
    fn rejects_blank_document_name() {
        let err = Config::from_lookup(lookup(&[(DOCUMENT_NAME_VAR, " ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyDocumentName { var: DOCUMENT_NAME_VAR });
    }

    #[test]
    fn parse_duration_forms() {
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("foo"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-5"), None);
    }
}
