//! Error types for the document store
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two failure shapes exist and they are deliberately distinct:
//!
//! - Malformed operations (a path that does not resolve, a list command
//!   against a non-list) are `Err` values, fatal to the in-progress
//!   transaction, which the caller must discard.
//! - Authorization outcomes are data: the reducer reports
//!   `Rejected(RejectReason)` as a value so batch logic can decide what to do
//!   with it. `Error::OperationRejected` only appears once the transaction
//!   layer has decided to abort the batch.

use crate::path::RecordPath;
use crate::record::Role;
use thiserror::Error;

/// Result type alias for document-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why the reducer refused to apply an operation to a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The record's role does not permit mutation
    #[error("record is read-only under role {role:?}")]
    ReadOnlyRecord {
        /// The role that blocked the mutation
        role: Role,
    },
    /// The record carries no access at all
    #[error("no access to record")]
    NoAccess,
}

/// Error types for the document store
#[derive(Debug, Error)]
pub enum Error {
    /// Operation shape/kind mismatch against the record's actual shape
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Path does not resolve against the record value
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that failed to resolve
        path: RecordPath,
    },

    /// Wrong value type encountered during path traversal
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Path at which the mismatch occurred
        path: RecordPath,
        /// Expected type name
        expected: &'static str,
        /// Actual type name found
        found: &'static str,
    },

    /// List index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The list length
        len: usize,
    },

    /// List anchor element not present
    #[error("anchor element not found in list at {path}")]
    AnchorNotFound {
        /// Path of the list
        path: RecordPath,
    },

    /// The batch was aborted because an operation was rejected
    #[error("operation rejected: {0}")]
    OperationRejected(#[from] RejectReason),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage provider error
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
