//! Logging infrastructure for the hybrid RAG tool.
//!
//! This module initializes the tracing subscriber for structured logging.
//! All logs are emitted to stderr so that answers printed on stdout stay clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber with stderr output.
///
/// This sets up structured logging with:
/// - Output to stderr (stdout is reserved for answers)
/// - Environment-based filtering (RUST_LOG or provided level)
/// - Optional ANSI color control
///
/// # Arguments
/// * `log_level` - Optional log level override (e.g., "debug", "info")
/// * `no_color` - Disable colored output
///
/// # Example
/// ```no_run
/// use hybrid_rag_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Check if the terminal supports color output.
fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Shorten a secret-like value for log output, keeping only its first
/// `visible` characters.
pub fn redact(value: &str, visible: usize) -> String {
    let prefix: String = value.chars().take(visible).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // The first call may race with other tests; the second always fails
        let _ = init_logging(Some("info"), true);

        match init_logging(Some("info"), true) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Failed to init logging")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let result = init_logging(Some("hybrid_rag=notalevel"), true);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_redact_keeps_prefix() {
        assert_eq!(redact("my-deployment:abcdef123456", 10), "my-deploym...");
        assert_eq!(redact("short", 10), "short...");
    }
}
