//! Logging setup utilities for the Hiroba chat relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is enabled at the default level.
const LOG_TARGETS: [&str; 3] = ["hiroba_server", "hiroba_shared", "tower_http"];

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every crate in [`LOG_TARGETS`] plus the binary itself is enabled at
/// `default_log_level`. A binary that shares its crate's name is listed once.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets: Vec<&str> = LOG_TARGETS.to_vec();
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }
    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
