//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Dispatcher setup or shutdown error
    #[error("Dispatcher error: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
