//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, GeogasError>;

/// Errors raised by the shared infrastructure (configuration parsing, logging setup)
#[derive(Error, Debug)]
pub enum GeogasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidSetting { key: &'static str, value: String },

    #[error("Invalid log filter directive: {0}")]
    FilterDirective(#[from] tracing_subscriber::filter::ParseError),

    #[error("Logging already initialized: {0}")]
    LoggingInit(String),
}

impl GeogasError {
    /// Build an `InvalidSetting` error for an environment variable
    pub fn invalid_setting(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key,
            value: value.into(),
        }
    }
}
