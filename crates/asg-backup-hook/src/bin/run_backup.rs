use asg_backup_core::{Config, LifecycleEvent};
use asg_backup_hook::logging::init_logging;
use asg_backup_hook::{AutoScalingLifecycle, InvocationReport, Orchestrator, SsmCommands};
use chrono::Utc;

const USAGE: &str =
    "usage: run-backup --hook <name> --group <name> --instance <id> [--token <token>]";

/// Flags accepted on the command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    hook: Option<String>,
    group: Option<String>,
    instance: Option<String>,
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    init_logging();

    let event = match parse_args(std::env::args().skip(1)).and_then(build_event) {
        Ok(event) => event,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize AWS SDK
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let commands = SsmCommands::new(aws_sdk_ssm::Client::new(&sdk_config));
    let lifecycle = AutoScalingLifecycle::new(aws_sdk_autoscaling::Client::new(&sdk_config));

    let started_at = Utc::now();
    let outcome = Orchestrator::new(&commands, &lifecycle, &config)
        .run(&event)
        .await;
    let report = InvocationReport {
        started_at,
        outcome,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to render outcome: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse `--hook`, `--group`, `--instance` and `--token` flags.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--hook" => &mut parsed.hook,
            "--group" => &mut parsed.group,
            "--instance" => &mut parsed.instance,
            "--token" => &mut parsed.token,
            _ => return Err(format!("unrecognised argument `{arg}`")),
        };
        *slot = iter.next();
    }
    Ok(parsed)
}

fn build_event(args: Args) -> Result<LifecycleEvent, String> {
    let hook = args.hook.ok_or("--hook is mandatory")?;
    let group = args.group.ok_or("--group is mandatory")?;
    let instance = args.instance.ok_or("--instance is mandatory")?;

    let event = LifecycleEvent::new(hook, group, instance).map_err(|e| e.to_string())?;
    Ok(match args.token {
        Some(token) => event.with_action_token(token),
        None => event,
    })
}
