use asg_backup_core::Config;
use asg_backup_hook::logging::init_logging;
use asg_backup_hook::{AutoScalingLifecycle, InvocationReport, Orchestrator, SsmCommands};
use aws_config::BehaviorVersion;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = Config::from_env()?;
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let commands = SsmCommands::new(aws_sdk_ssm::Client::new(&sdk_config));
    let lifecycle = AutoScalingLifecycle::new(aws_sdk_autoscaling::Client::new(&sdk_config));

    info!(
        document = %config.document_name,
        command_timeout = ?config.command_timeout,
        max_elapsed = ?config.retry.max_elapsed,
        "backup hook ready"
    );

    let orchestrator = Orchestrator::new(&commands, &lifecycle, &config);
    let orchestrator = &orchestrator;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<InvocationReport, Error>(orchestrator.handle(&event.payload).await)
    }))
    .await
}
