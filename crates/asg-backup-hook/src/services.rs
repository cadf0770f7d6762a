use std::time::Duration;

use asg_backup_core::{CommandStatus, LifecycleEvent};
use async_trait::async_trait;

use crate::errors::BackupError;

/// Remote command execution: the three SSM calls the orchestrator makes.
#[async_trait]
pub trait CommandService: Send + Sync {
    /// Names of the documents in the catalog matching `name`.
    async fn list_documents(&self, name: &str) -> Result<Vec<String>, BackupError>;

    /// Run `document_name` on one instance and return the command id.
    async fn send_command(
        &self,
        instance_id: &str,
        document_name: &str,
        timeout: Duration,
    ) -> Result<String, BackupError>;

    /// Status of the command on the instance, or `None` if no invocation is
    /// registered for it yet.
    async fn invocation_status(
        &self,
        command_id: &str,
        instance_id: &str,
    ) -> Result<Option<CommandStatus>, BackupError>;
}

/// Lifecycle hook completion.
#[async_trait]
pub trait LifecycleService: Send + Sync {
    /// Complete the event's lifecycle action with result `ABANDON`.
    async fn abandon(&self, event: &LifecycleEvent) -> Result<(), BackupError>;
}
