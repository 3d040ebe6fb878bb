use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

pub const ENV_LOG: &str = "RANGELOG_LOG";

/// Picks the filter directive: `RANGELOG_LOG` wins, then `-v` flags, then the
/// config file, then `warn`.
pub fn filter_directive(env_value: Option<&str>, verbosity: u8, configured: Option<&str>) -> String {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    match verbosity {
        0 => configured.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs a stderr subscriber. Calling it again is a no-op.
pub fn init_logging(verbosity: u8, configured: Option<&str>) {
    let env_value = std::env::var(ENV_LOG).ok();
    let directive = filter_directive(env_value.as_deref(), verbosity, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A subscriber may already be installed (tests, embedding callers).
    let _ = Registry::default().with(filter).with(stderr_layer).try_init();
}
