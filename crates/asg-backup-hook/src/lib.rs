pub mod autoscaling;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod services;
pub mod ssm;

pub use autoscaling::AutoScalingLifecycle;
pub use errors::BackupError;
pub use orchestrator::{DocumentState, InvocationReport, Orchestrator};
pub use services::{CommandService, LifecycleService};
pub use ssm::SsmCommands;
