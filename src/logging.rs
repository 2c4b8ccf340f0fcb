use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "engagement_scores=info";

/// Installs the stderr subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "engagement_scores=debug"
    } else {
        DEFAULT_FILTER
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
