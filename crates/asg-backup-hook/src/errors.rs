use std::time::Duration;

/// Errors from the SSM and Auto Scaling calls made by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// SSM API or transport error.
    #[error("SSM error: {0}")]
    Ssm(#[from] aws_sdk_ssm::Error),
    /// Auto Scaling API or transport error.
    #[error("Auto Scaling error: {0}")]
    AutoScaling(#[from] aws_sdk_autoscaling::Error),
    /// A successful response lacked a field the orchestration needs.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    /// A polling loop spent its whole retry budget.
    #[error("{operation} did not settle within {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
}
