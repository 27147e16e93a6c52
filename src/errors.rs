//! Error types for the decision support engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type shared by every engine in the crate
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CdssError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Alert not found: {id}")]
    AlertNotFound { id: String },
}

impl CdssError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Crate-wide result alias
pub type CdssResult<T> = Result<T, CdssError>;
