//! Tracing subscriber setup. Logs go to stderr so command output on stdout
//! stays machine-readable.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::error::AppError;

/// Parse a filter directive such as `info` or `otpdeck_totp=debug,warn`.
pub fn build_filter(directive: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(directive)
        .map_err(|e| AppError::Logging(format!("invalid log filter '{directive}': {e}")))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(directive: &str, format: LogFormat) -> Result<(), AppError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(directive)?)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}
