//! Error types for `Tabula`.
//!
//! A single error enum covers every fallible table, index and planner
//! operation. Error codes follow the pattern `TABULA-XXX`.

use thiserror::Error;

use crate::value::ColumnType;

/// Result type alias for `Tabula` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `Tabula` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Column not found (TABULA-001).
    #[error("[TABULA-001] Column '{0}' not found")]
    ColumnNotFound(String),

    /// Column already exists (TABULA-002).
    #[error("[TABULA-002] Column '{0}' already exists")]
    ColumnExists(String),

    /// Row is not a valid (occupied) row (TABULA-003).
    #[error("[TABULA-003] Row {0} is not a valid row")]
    InvalidRow(i32),

    /// Value type does not match the column type (TABULA-004).
    #[error("[TABULA-004] Type mismatch on column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Column being read or written.
        column: String,
        /// Declared column type.
        expected: ColumnType,
        /// Type of the value provided or requested.
        actual: String,
    },

    /// Comparator cannot order the column's values (TABULA-005).
    #[error("[TABULA-005] Comparator '{comparator}' cannot order column '{column}' of type {column_type}")]
    IncompatibleComparator {
        /// Indexed column.
        column: String,
        /// Column type.
        column_type: ColumnType,
        /// Comparator name.
        comparator: String,
    },

    /// Table changed underneath a detached iterator (TABULA-006).
    #[error("[TABULA-006] Concurrent modification: table changed from version {expected} to {actual}")]
    ConcurrentModification {
        /// Modification count captured by the iterator.
        expected: u64,
        /// Modification count observed on the table.
        actual: u64,
    },

    /// Invalid sort specification (TABULA-007).
    #[error("[TABULA-007] Invalid sort specification: {0}")]
    InvalidSort(String),

    /// Invalid traversal request (TABULA-008).
    #[error("[TABULA-008] Invalid traversal: {0}")]
    InvalidTraversal(String),

    /// Configuration error (TABULA-009).
    #[error("[TABULA-009] Configuration error: {0}")]
    Config(String),

    /// Internal error (TABULA-010).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[TABULA-010] Internal error: {0}")]
    Internal(String),

    /// Record cannot be turned into a row (TABULA-011).
    #[error("[TABULA-011] Invalid record: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Returns the error code (e.g., "TABULA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "TABULA-001",
            Self::ColumnExists(_) => "TABULA-002",
            Self::InvalidRow(_) => "TABULA-003",
            Self::TypeMismatch { .. } => "TABULA-004",
            Self::IncompatibleComparator { .. } => "TABULA-005",
            Self::ConcurrentModification { .. } => "TABULA-006",
            Self::InvalidSort(_) => "TABULA-007",
            Self::InvalidTraversal(_) => "TABULA-008",
            Self::Config(_) => "TABULA-009",
            Self::Internal(_) => "TABULA-010",
            Self::InvalidRecord(_) => "TABULA-011",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// A concurrent modification is recoverable by restarting the
    /// iteration; internal errors are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
