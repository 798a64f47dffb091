//! Structured logging initialization via `tracing`.

/// Initialize the tracing subscriber.
///
/// `format` selects "human" or "json" output; the `RUST_LOG` environment
/// variable overrides `default_level` for filtering.
pub fn init_tracing(format: &str, default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
