use asg_backup_core::LifecycleEvent;
use async_trait::async_trait;
use aws_sdk_autoscaling::Client;

use crate::errors::BackupError;
use crate::services::LifecycleService;

/// Lifecycle action result that lets the paused transition continue.
pub const ABANDON: &str = "ABANDON";

/// Auto Scaling client wrapper for completing lifecycle actions.
#[derive(Clone)]
pub struct AutoScalingLifecycle {
    client: Client,
}

impl AutoScalingLifecycle {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LifecycleService for AutoScalingLifecycle {
    async fn abandon(&self, event: &LifecycleEvent) -> Result<(), BackupError> {
        self.client
            .complete_lifecycle_action()
            .lifecycle_hook_name(&event.hook_name)
            .auto_scaling_group_name(&event.group_name)
            .instance_id(&event.instance_id)
            .set_lifecycle_action_token(event.action_token.clone())
            .lifecycle_action_result(ABANDON)
            .send()
            .await
            .map_err(aws_sdk_autoscaling::Error::from)?;

        Ok(())
    }
}
