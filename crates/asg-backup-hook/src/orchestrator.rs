use asg_backup_core::{AbandonReason, CommandStatus, Config, LifecycleEvent, Outcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::errors::BackupError;
use crate::services::{CommandService, LifecycleService};

/// Result of the document existence check.
#[derive(Debug)]
pub enum DocumentState {
    /// At least one matching document is listed.
    Exists,
    /// The catalog answered without a match.
    Missing,
    /// The catalog could not be queried.
    Unknown(BackupError),
}

/// What one invocation did, returned as the Lambda response body.
#[derive(Debug, Serialize)]
pub struct InvocationReport {
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Drives the backup of a terminating instance.
///
/// Holds borrowed clients so the Lambda runtime can construct them once per
/// cold start and tests can pass in fakes.
pub struct Orchestrator<'a> {
    commands: &'a dyn CommandService,
    lifecycle: &'a dyn LifecycleService,
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        commands: &'a dyn CommandService,
        lifecycle: &'a dyn LifecycleService,
        config: &'a Config,
    ) -> Self {
        Self {
            commands,
            lifecycle,
            config,
        }
    }

    /// Handle a raw lifecycle event payload.
    ///
    /// Invalid events are logged once and rejected before any API call.
    pub async fn handle(&self, payload: &Value) -> InvocationReport {
        let started_at = Utc::now();
        debug!(event = %payload, "received lifecycle event");

        let outcome = match LifecycleEvent::from_value(payload) {
            Ok(event) => self.run(&event).await,
            Err(e) => {
                error!(error = %e, "invalid lifecycle event");
                Outcome::Rejected {
                    error: e.to_string(),
                }
            }
        };

        InvocationReport {
            started_at,
            outcome,
        }
    }

    /// Run the backup for a validated event.
    ///
    /// 1. Confirm the backup document exists
    /// 2. Wait for it to be listed, then dispatch it to the instance
    /// 3. Poll until the command leaves `Pending`
    /// 4. Leave the hook alone on InProgress/Success, abandon it otherwise
    pub async fn run(&self, event: &LifecycleEvent) -> Outcome {
        info!(
            instance_id = %event.instance_id,
            hook = %event.hook_name,
            group = %event.group_name,
            document = %self.config.document_name,
            "backup orchestration start"
        );

        match self.check_document().await {
            DocumentState::Exists => {}
            DocumentState::Missing => {
                return self
                    .abandon_lifecycle(event, AbandonReason::DocumentMissing)
                    .await;
            }
            DocumentState::Unknown(e) => {
                let reason = AbandonReason::DocumentUnknown {
                    error: e.to_string(),
                };
                return self.abandon_lifecycle(event, reason).await;
            }
        }

        let command_id = match self.send_command(&event.instance_id).await {
            Ok(id) => id,
            Err(e @ BackupError::Timeout { .. }) => {
                let reason = AbandonReason::DocumentTimeout {
                    error: e.to_string(),
                };
                return self.abandon_lifecycle(event, reason).await;
            }
            Err(e) => {
                let reason = AbandonReason::DispatchFailed {
                    error: e.to_string(),
                };
                return self.abandon_lifecycle(event, reason).await;
            }
        };

        match self.check_command(&command_id, &event.instance_id).await {
            Ok(status) if status.is_confirmed() => {
                info!(
                    instance_id = %event.instance_id,
                    command_id = %command_id,
                    status = %status,
                    "backup confirmed, lifecycle left to proceed"
                );
                Outcome::Proceeded { command_id, status }
            }
            Ok(status) => {
                self.abandon_lifecycle(event, AbandonReason::CommandFailed { status })
                    .await
            }
            Err(e) => {
                let reason = AbandonReason::StatusTimeout {
                    error: e.to_string(),
                };
                self.abandon_lifecycle(event, reason).await
            }
        }
    }

    /// Look the backup document up once. No retries.
    pub async fn check_document(&self) -> DocumentState {
        match self.commands.list_documents(&self.config.document_name).await {
            Ok(names) if !names.is_empty() => {
                info!(document = %self.config.document_name, "backup document exists");
                DocumentState::Exists
            }
            Ok(_) => {
                error!(document = %self.config.document_name, "backup document not found");
                DocumentState::Missing
            }
            Err(e) => {
                error!(
                    document = %self.config.document_name,
                    error = %e,
                    "backup document lookup failed"
                );
                DocumentState::Unknown(e)
            }
        }
    }

    /// Wait until the document is listed, then dispatch it to the instance.
    ///
    /// Dispatch itself is attempted exactly once.
    pub async fn send_command(&self, instance_id: &str) -> Result<String, BackupError> {
        self.wait_for_document().await?;

        match self
            .commands
            .send_command(
                instance_id,
                &self.config.document_name,
                self.config.command_timeout,
            )
            .await
        {
            Ok(command_id) => {
                info!(instance_id, command_id = %command_id, "backup command sent");
                Ok(command_id)
            }
            Err(e) => {
                error!(instance_id, error = %e, "backup command could not be sent");
                Err(e)
            }
        }
    }

    async fn wait_for_document(&self) -> Result<(), BackupError> {
        let started = Instant::now();
        let mut backoff = self.config.retry.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.commands.list_documents(&self.config.document_name).await {
                Ok(names) if !names.is_empty() => return Ok(()),
                Ok(_) => debug!(attempt, "backup document not listed yet"),
                // Listing errors here are treated as "not ready yet"
                Err(e) => warn!(attempt, error = %e, "document listing failed while waiting"),
            }

            let Some(delay) = backoff.next() else {
                error!(attempt, "backup document never became ready");
                return Err(BackupError::Timeout {
                    operation: "document readiness",
                    elapsed: started.elapsed(),
                });
            };
            sleep(delay).await;
        }
    }

    /// Poll the invocation until it leaves `Pending` and return that status.
    ///
    /// Query errors and unregistered invocations are retried until the
    /// retry budget runs out.
    pub async fn check_command(
        &self,
        command_id: &str,
        instance_id: &str,
    ) -> Result<CommandStatus, BackupError> {
        let started = Instant::now();
        let mut backoff = self.config.retry.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.commands.invocation_status(command_id, instance_id).await {
                Ok(Some(status)) if status.is_pending() => {
                    debug!(attempt, command_id, "backup command pending");
                }
                Ok(Some(status)) => {
                    if status.is_confirmed() {
                        info!(command_id, status = %status, "backup command running");
                    } else {
                        error!(command_id, status = %status, "backup command did not run");
                    }
                    return Ok(status);
                }
                Ok(None) => debug!(attempt, command_id, "invocation not registered yet"),
                Err(e) => warn!(attempt, command_id, error = %e, "status query failed, retrying"),
            }

            let Some(delay) = backoff.next() else {
                error!(attempt, command_id, "backup command status never settled");
                return Err(BackupError::Timeout {
                    operation: "command status",
                    elapsed: started.elapsed(),
                });
            };
            sleep(delay).await;
        }
    }

    /// Abandon the lifecycle hook. The result is only logged.
    pub async fn abandon_lifecycle(&self, event: &LifecycleEvent, reason: AbandonReason) -> Outcome {
        warn!(
            instance_id = %event.instance_id,
            hook = %event.hook_name,
            group = %event.group_name,
            reason = ?reason,
            "abandoning lifecycle hook"
        );

        let completed = match self.lifecycle.abandon(event).await {
            Ok(()) => {
                info!(instance_id = %event.instance_id, "lifecycle hook abandoned");
                true
            }
            Err(e) => {
                error!(
                    instance_id = %event.instance_id,
                    error = %e,
                    "lifecycle hook could not be abandoned"
                );
                false
            }
        };

        Outcome::Abandoned { reason, completed }
    }
}
