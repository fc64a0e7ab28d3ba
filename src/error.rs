//! Custom error types for Simulotto
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. The audit-related variants are kept distinct
//! so callers can match on the kind of failure instead of its message.

use thiserror::Error;

/// The main error type for Simulotto operations
#[derive(Error, Debug)]
pub enum SimulottoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and capture input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Domain store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record state could not be canonicalized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The audit store could not durably accept a record
    #[error("Audit write error: {0}")]
    AuditWrite(String),

    /// Attempt to alter or remove an existing audit record
    #[error("Modification not permitted on audit record {record_id}")]
    ImmutabilityViolation { record_id: String },

    /// Malformed audit query filter
    #[error("Query error: {0}")]
    Query(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl SimulottoError {
    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for game types
    pub fn game_type_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "GameType",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for draws
    pub fn draw_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Draw",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for bets
    pub fn bet_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bet",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for audit records
    pub fn audit_record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "AuditRecord",
            identifier: identifier.into(),
        }
    }

    /// Create an immutability violation for the given audit record
    pub fn immutable(record_id: impl Into<String>) -> Self {
        Self::ImmutabilityViolation {
            record_id: record_id.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a canonical serialization failure
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Check if this is an audit store write failure
    pub fn is_audit_write(&self) -> bool {
        matches!(self, Self::AuditWrite(_))
    }

    /// Check if this is a rejected modification of an audit record
    pub fn is_immutability_violation(&self) -> bool {
        matches!(self, Self::ImmutabilityViolation { .. })
    }

    /// Check if this is a malformed query
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Whether repeating the operation could ever succeed
    ///
    /// Immutability violations are terminal; everything else depends on the
    /// state of the stores.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::AuditWrite(_) | Self::Io(_) | Self::Storage(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for SimulottoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SimulottoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Simulotto operations
pub type SimulottoResult<T> = Result<T, SimulottoError>;
