use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging with JSON output (production mode)
pub fn init_tracing(level: &str) -> Result<()> {
    Registry::default()
        .with(env_filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(true)
                .with_target(true),
        )
        .init();

    tracing::info!("Structured logging initialized with JSON output");
    Ok(())
}

/// Initialize console-friendly logging for development
pub fn init_console_tracing(level: &str) -> Result<()> {
    Registry::default()
        .with(env_filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true),
        )
        .init();

    tracing::info!("Console logging initialized");
    Ok(())
}

/// `RUST_LOG` wins over the configured level when set.
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}")),
    }
}
