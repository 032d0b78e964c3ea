use std::path::PathBuf;

use otpdeck_totp::totp::TotpError;

/// Host-level error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    /// An entry was refused; the message is user-facing.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Totp(#[from] TotpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
