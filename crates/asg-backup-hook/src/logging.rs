use tracing_subscriber::EnvFilter;

/// Install the JSON tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Output goes to stderr
/// so `run-backup` can print its report on stdout. No timestamps or ANSI
/// colours; CloudWatch adds its own.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .with_current_span(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
