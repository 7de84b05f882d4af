pub mod authorization;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the host process.
///
/// Uses `RUST_LOG` when set, otherwise [`config::default_log_filter`].
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
