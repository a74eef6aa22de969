//! Dispatcher error types

use std::time::Duration;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Tick interval must be non-zero
    #[error("invalid tick interval {interval:?}: must be > 0")]
    InvalidInterval { interval: Duration },

    /// Driver task ended abnormally
    #[error("tick driver failed: {message}")]
    Driver { message: String },

    /// Contract violation (e.g. empty topic)
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a driver failure error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}
