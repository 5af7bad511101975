// Logging setup shared by the Lambda handler and the local runner

use compactor_config::{LogConfig, LogFormat};

/// Initialize tracing/logging from the log section of RuntimeConfig
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.format {
        // CloudWatch adds its own timestamps and does not render ANSI
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_ansi(false).without_time()),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
