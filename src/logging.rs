use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "LEGEND_CACHE_LOG";

/// Installs a stderr fmt subscriber. `LEGEND_CACHE_LOG` wins over `RUST_LOG`; default is `info`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
