//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for sqlweave operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while composing or rendering a query.
///
/// Everything except [`QueryError::Cancelled`] and [`QueryError::DeadlineExceeded`]
/// is a caller-contract violation: the query (or expression) was put together
/// in a way that can never render, and retrying will not help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `IN (...)` over an empty candidate list
    #[error("IN list cannot be empty")]
    EmptyInList,

    /// ROLLUP / CUBE / GROUPING SETS without arguments
    #[error("{0} requires at least one expression")]
    EmptyGrouping(&'static str),

    /// Keyset helper on a query that has no ORDER BY yet
    #[error("{0} requires ORDER BY to be configured")]
    KeysetWithoutOrderBy(&'static str),

    /// Keyset helper after UNION; the cursor would only filter the first operand
    #[error("{0} cannot filter a UNION result; wrap the UNION in a derived table")]
    KeysetOnSetOperation(&'static str),

    /// Keyset helper called with zero ordering expressions
    #[error("keyset pagination requires at least one ordering expression")]
    KeysetEmptyOrdering,

    /// Cursor value count differs from the ordering expression count
    #[error("cursor value count must match the configured ORDER BY (expected {expected}, got {got})")]
    KeysetArity { expected: usize, got: usize },

    /// RETURNING requested on a SELECT
    #[error("RETURNING is not supported on SELECT queries")]
    ReturningOnSelect,

    /// UPDATE with no SET assignments
    #[error("UPDATE requires at least one SET clause")]
    UpdateWithoutSet,

    /// INSERT kind established without a target table
    #[error("InsertInto must be called before InsertIgnore/Build for INSERT queries")]
    MissingInsertTable,

    /// Render called before any statement kind was chosen
    #[error("query type not set")]
    MissingStatement,

    /// A clause method that does not apply to the established statement kind
    #[error("{method} is not supported on {kind} queries")]
    StatementKind {
        method: &'static str,
        kind: &'static str,
    },

    /// INSERT IGNORE combined with ON CONFLICT / ON DUPLICATE KEY handling
    #[error("INSERT IGNORE cannot be combined with an explicit conflict handler")]
    InsertIgnoreWithConflict,

    /// VALUES rows and INSERT ... SELECT on the same statement
    #[error("INSERT cannot take both VALUES rows and a SELECT source")]
    ConflictingInsertSource,

    /// NOWAIT / SKIP LOCKED without a row lock to modify
    #[error("{0} requires FOR UPDATE or a share lock")]
    LockModifierWithoutLock(&'static str),

    /// Dialect-exclusive feature on a dialect without a known kind
    #[error("{feature} requires a recognized dialect")]
    UnrecognizedDialect { feature: &'static str },

    /// Dialect-exclusive feature on the wrong dialect kind
    #[error("{feature} is not supported on the {dialect} dialect")]
    UnsupportedDialect {
        feature: &'static str,
        dialect: &'static str,
    },

    /// Render skipped because the caller cancelled first
    #[error("build cancelled")]
    Cancelled,

    /// Render skipped because the caller's deadline already passed
    #[error("build deadline exceeded")]
    DeadlineExceeded,
}

impl QueryError {
    /// Create a statement-kind mismatch error
    pub fn statement_kind(method: &'static str, kind: &'static str) -> Self {
        Self::StatementKind { method, kind }
    }

    /// Check if this error is a (recoverable) cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Check if this error comes from a dialect gate
    pub fn is_dialect_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedDialect { .. } | Self::UnsupportedDialect { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(QueryError::EmptyInList.to_string(), "IN list cannot be empty");
        assert_eq!(
            QueryError::UpdateWithoutSet.to_string(),
            "UPDATE requires at least one SET clause"
        );
        assert_eq!(
            QueryError::EmptyGrouping("ROLLUP").to_string(),
            "ROLLUP requires at least one expression"
        );
        assert_eq!(
            QueryError::KeysetArity { expected: 2, got: 1 }.to_string(),
            "cursor value count must match the configured ORDER BY (expected 2, got 1)"
        );
        assert_eq!(
            QueryError::KeysetOnSetOperation("keyset_after").to_string(),
            "keyset_after cannot filter a UNION result; wrap the UNION in a derived table"
        );
    }

    #[test]
    fn classification_helpers() {
        assert!(QueryError::Cancelled.is_cancelled());
        assert!(QueryError::DeadlineExceeded.is_cancelled());
        assert!(!QueryError::EmptyInList.is_cancelled());
        assert!(
            QueryError::UnrecognizedDialect {
                feature: "JSON_CONTAINS"
            }
            .is_dialect_error()
        );
    }
}
