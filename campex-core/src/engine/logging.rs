//! Standardized logging setup: human-readable by default, JSON on request,
//! level controlled by `RUST_LOG`.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes human-readable logging. Defaults to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initializes JSON logging for log aggregators, same level rules as [`init_logging`].
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
