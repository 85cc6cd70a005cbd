//! Centralized logging configuration for apex-trajectory binaries
//!
//! Provides a consistent tracing setup with a default INFO level.

use tracing::Level;

/// Initialize the tracing subscriber with the standard configuration
///
/// Default log level: INFO (overrideable via RUST_LOG environment variable)
///
/// # Example
/// ```no_run
/// use apex_trajectory::init_logger;
///
/// fn main() {
///     init_logger();
///     tracing::info!("Application started");
/// }
/// ```
///
/// # Environment Variables
/// ```bash
/// RUST_LOG=debug transform_trajectory relativize -i in.txt -o out.txt
/// RUST_LOG=apex_trajectory=trace transform_trajectory extrinsic ...
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// # Arguments
/// * `default_level` - The default log level (overrideable via RUST_LOG)
pub fn init_logger_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    // try_init: a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
