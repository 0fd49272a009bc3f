//! Error types for the leaders clustering pipeline.
//!
//! Every failure here is fatal: this is a single-shot offline job with no
//! retry policy and no partial-progress checkpoint. Callers restart from the
//! beginning.

use thiserror::Error;

/// Result alias for clustering operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors raised by the clustering pipeline.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Rejected configuration value (K, tau, subsample ratio, sample size).
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// What was rejected and the accepted range
        message: String,
    },

    /// Point and vocabulary sources have differing lengths.
    #[error("input mismatch: {points} points vs {vocab} vocabulary entries")]
    InputMismatch {
        /// Number of point rows
        points: usize,
        /// Number of vocabulary entries
        vocab: usize,
    },

    /// A point row's dimension differs from the store dimension.
    #[error("dimension mismatch at row {row}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Offending row index
        row: usize,
        /// Store dimension
        expected: usize,
        /// Row dimension
        actual: usize,
    },

    /// Missing or unreadable data or index artifact.
    #[error("io error while {context}: {source}")]
    Io {
        /// What was being read or written
        context: String,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },

    /// Artifact bytes could not be encoded or decoded.
    #[error("serialization error while {context}: {message}")]
    Serialization {
        /// What was being encoded or decoded
        context: String,
        /// Underlying codec error
        message: String,
    },
}

impl ClusterError {
    /// Build an `InvalidParameter` error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Build an `Io` error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a `Serialization` error with context.
    pub fn serialization(context: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Serialization {
            context: context.into(),
            message: source.to_string(),
        }
    }
}
