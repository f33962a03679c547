//! SQL dialects: placeholder rendering and feature gating.
//!
//! A [`Dialect`] answers two questions during a render:
//!
//! 1. what the Nth placeholder looks like (`?` vs `$N`), and
//! 2. which [`DialectKind`] it is, so dialect-exclusive nodes (full-text search,
//!    JSON operators, ordinality, locking, conflict handling) can pick their SQL
//!    shape or refuse to render.
//!
//! Custom dialects only control placeholders. They have no kind, so every
//! dialect-exclusive feature rejects them.

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The closed set of dialects the renderer knows how to specialize for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    MySql,
    Postgres,
    Sqlite,
}

impl DialectKind {
    /// Lowercase name used in error messages and build reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            DialectKind::MySql => "mysql",
            DialectKind::Postgres => "postgres",
            DialectKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-supplied dialect.
///
/// Only placeholder rendering is customizable; dialect-exclusive features
/// fail closed on custom dialects.
pub trait CustomDialect: Send + Sync + fmt::Debug {
    /// Render the placeholder for the 1-based argument `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Name reported in build reports.
    fn name(&self) -> &str;
}

/// Placeholder strategy plus dialect identity.
#[derive(Debug, Clone)]
pub enum Dialect {
    /// `?` placeholders; MySQL-only features enabled.
    MySql,
    /// `$1, $2, ...` placeholders; PostgreSQL-only features enabled.
    Postgres,
    /// `?` placeholders; SQLite conflict handling.
    Sqlite,
    /// Anything else. No dialect-exclusive features.
    Custom(Arc<dyn CustomDialect>),
}

impl Dialect {
    /// Wrap a custom dialect implementation.
    pub fn custom(dialect: impl CustomDialect + 'static) -> Self {
        Dialect::Custom(Arc::new(dialect))
    }

    /// Render the placeholder for the 1-based argument `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${index}"),
            Dialect::Custom(custom) => custom.placeholder(index),
        }
    }

    /// The dialect kind, or `None` for custom dialects.
    pub fn kind(&self) -> Option<DialectKind> {
        match self {
            Dialect::MySql => Some(DialectKind::MySql),
            Dialect::Postgres => Some(DialectKind::Postgres),
            Dialect::Sqlite => Some(DialectKind::Sqlite),
            Dialect::Custom(_) => None,
        }
    }

    /// Name reported in build reports.
    pub fn name(&self) -> &str {
        match self {
            Dialect::Custom(custom) => custom.name(),
            _ => self.kind().map_or("custom", DialectKind::as_str),
        }
    }

    /// Resolve the kind for a dialect-exclusive feature, failing closed on custom dialects.
    pub(crate) fn recognized(&self, feature: &'static str) -> QueryResult<DialectKind> {
        self.kind()
            .ok_or(QueryError::UnrecognizedDialect { feature })
    }

    /// Require exactly `expected` for `feature`.
    pub(crate) fn require(&self, expected: DialectKind, feature: &'static str) -> QueryResult<()> {
        let kind = self.recognized(feature)?;
        if kind != expected {
            return Err(QueryError::UnsupportedDialect {
                feature,
                dialect: kind.as_str(),
            });
        }
        Ok(())
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::MySql
    }
}

impl From<DialectKind> for Dialect {
    fn from(kind: DialectKind) -> Self {
        match kind {
            DialectKind::MySql => Dialect::MySql,
            DialectKind::Postgres => Dialect::Postgres,
            DialectKind::Sqlite => Dialect::Sqlite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AtNamed;

    impl CustomDialect for AtNamed {
        fn placeholder(&self, index: usize) -> String {
            format!("@p{index}")
        }

        fn name(&self) -> &str {
            "mssql"
        }
    }

    #[test]
    fn fixed_placeholder_ignores_index() {
        assert_eq!(Dialect::MySql.placeholder(1), "?");
        assert_eq!(Dialect::MySql.placeholder(42), "?");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
    }

    #[test]
    fn numbered_placeholder_embeds_index() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Postgres.placeholder(12), "$12");
    }

    #[test]
    fn custom_dialect_has_no_kind() {
        let d = Dialect::custom(AtNamed);
        assert_eq!(d.placeholder(2), "@p2");
        assert_eq!(d.kind(), None);
        assert_eq!(d.name(), "mssql");
        assert_eq!(
            d.recognized("JSON_CONTAINS"),
            Err(QueryError::UnrecognizedDialect {
                feature: "JSON_CONTAINS"
            })
        );
    }

    #[test]
    fn require_rejects_other_kinds() {
        assert!(Dialect::Postgres.require(DialectKind::Postgres, "tsvector").is_ok());
        assert_eq!(
            Dialect::MySql.require(DialectKind::Postgres, "tsvector"),
            Err(QueryError::UnsupportedDialect {
                feature: "tsvector",
                dialect: "mysql"
            })
        );
    }
}
