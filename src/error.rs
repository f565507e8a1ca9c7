//! Error types for the ranking engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranking scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("Comparison references unknown entity \"{entity_id}\"")]
    ReferentialIntegrity { entity_id: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid comparison: {reason}")]
    InvalidComparison { reason: String },

    #[error("Comparison group not found: {group_id}")]
    GroupNotFound { group_id: String },

    #[error("Invalid comparison id: {value}")]
    InvalidComparisonId { value: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl RankingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_comparison(reason: impl Into<String>) -> Self {
        Self::InvalidComparison {
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
