use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not authorized (status {status})")]
    Unauthorized { status: u16 },

    #[error("Not found")]
    NotFound,

    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by callers to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    Storage,
    Config,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Http(_) | AppError::NotFound | AppError::Api { .. } | AppError::Decode(_) => {
                ErrorKind::Network
            }
            AppError::Unauthorized { .. } => ErrorKind::Auth,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Database(_) | AppError::Migrate(_) => ErrorKind::Storage,
            AppError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}

/// Error body returned by the backend on non-success responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn into_detail(self) -> Option<String> {
        self.detail.or(self.message)
    }
}
