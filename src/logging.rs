use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TRAINING_FEES_LOG";

/// Installs the stderr subscriber. Filtering comes from `TRAINING_FEES_LOG`
/// and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
