use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

pub const HOOK_NAME_FIELD: &str = "LifecycleHookName";
pub const GROUP_NAME_FIELD: &str = "AutoScalingGroupName";
pub const INSTANCE_ID_FIELD: &str = "EC2InstanceId";

/// A validated instance-terminate lifecycle action.
///
/// Built once per invocation from the EventBridge payload; every required
/// field is guaranteed present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    pub hook_name: String,
    pub group_name: String,
    pub instance_id: String,
    /// Token identifying the specific lifecycle action, when the event carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_token: Option<String>,
}

/// The `detail` object as it arrives, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawDetail {
    #[serde(rename = "LifecycleHookName")]
    hook_name: Option<String>,
    #[serde(rename = "AutoScalingGroupName")]
    group_name: Option<String>,
    #[serde(rename = "EC2InstanceId")]
    instance_id: Option<String>,
    #[serde(rename = "LifecycleActionToken")]
    action_token: Option<String>,
}

impl LifecycleEvent {
    /// Create a new `LifecycleEvent` after validation.
    pub fn new(
        hook_name: impl Into<String>,
        group_name: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            hook_name: required(Some(hook_name.into()), HOOK_NAME_FIELD)?,
            group_name: required(Some(group_name.into()), GROUP_NAME_FIELD)?,
            instance_id: required(Some(instance_id.into()), INSTANCE_ID_FIELD)?,
            action_token: None,
        })
    }

    /// Attach a lifecycle action token. Empty tokens are dropped.
    pub fn with_action_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.action_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Parse and validate a raw event payload of the form
    /// `{ "detail": { "LifecycleHookName": .., "AutoScalingGroupName": .., "EC2InstanceId": .. } }`.
    pub fn from_value(value: &Value) -> Result<Self, EventError> {
        let detail = value
            .get("detail")
            .filter(|detail| !detail.is_null())
            .ok_or(EventError::MissingDetail)?;

        let raw: RawDetail = serde_json::from_value(detail.clone())
            .map_err(|e| EventError::Malformed(e.to_string()))?;

        let event = Self {
            hook_name: required(raw.hook_name, HOOK_NAME_FIELD)?,
            group_name: required(raw.group_name, GROUP_NAME_FIELD)?,
            instance_id: required(raw.instance_id, INSTANCE_ID_FIELD)?,
            action_token: None,
        };

        Ok(match raw.action_token {
            Some(token) => event.with_action_token(token),
            None => event,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, EventError> {
    match value {
        None => Err(EventError::MissingField(field)),
        Some(v) if v.trim().is_empty() => Err(EventError::EmptyField(field)),
        Some(v) => Ok(v),
    }
}

// ---------------------------------------------------------------------------
// CommandStatus
// ---------------------------------------------------------------------------

/// Status of a command invocation on one instance, as reported by SSM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandStatus {
    Pending,
    InProgress,
    Delayed,
    Success,
    Cancelled,
    Cancelling,
    TimedOut,
    Failed,
    /// A status string this crate does not know about.
    Other(String),
}

impl CommandStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Delayed => "Delayed",
            Self::Success => "Success",
            Self::Cancelled => "Cancelled",
            Self::Cancelling => "Cancelling",
            Self::TimedOut => "TimedOut",
            Self::Failed => "Failed",
            Self::Other(s) => s,
        }
    }

    /// The invocation has not started yet; keep polling.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The backup is running or has finished successfully.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::InProgress | Self::Success)
    }
}

impl From<&str> for CommandStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "InProgress" => Self::InProgress,
            "Delayed" => Self::Delayed,
            "Success" => Self::Success,
            "Cancelled" => Self::Cancelled,
            "Cancelling" => Self::Cancelling,
            "TimedOut" => Self::TimedOut,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CommandStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<CommandStatus> for String {
    fn from(status: CommandStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a lifecycle hook was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbandonReason {
    /// The document catalog answered, but the backup document is not in it.
    DocumentMissing,
    /// The document catalog could not be queried.
    DocumentUnknown { error: String },
    /// The document never showed up as ready within the retry budget.
    DocumentTimeout { error: String },
    /// SendCommand failed.
    DispatchFailed { error: String },
    /// The command reached a status other than InProgress or Success.
    CommandFailed { status: CommandStatus },
    /// The command stayed pending (or unqueryable) for the whole retry budget.
    StatusTimeout { error: String },
}

/// Result of handling one lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Backup confirmed; the hook is left alone so termination proceeds.
    Proceeded {
        command_id: String,
        status: CommandStatus,
    },
    /// The hook was abandoned (`completed` is false if that call failed too).
    Abandoned {
        reason: AbandonReason,
        completed: bool,
    },
    /// The event was invalid; nothing was called.
    Rejected { error: String },
}
