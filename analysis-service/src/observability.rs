use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "analysis_service=info,amr_core=info";

/// Install the global fmt subscriber, logging to stderr so that stdout stays
/// free for the batch CLI's JSON summary. `RUST_LOG` replaces the defaults.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
