//! Process-wide defaults.
//!
//! Two values are shared across the process:
//!
//! - the default [`Dialect`], snapshotted by [`Query::new`](crate::Query::new)
//! - the default PostgreSQL text-search configuration, snapshotted by
//!   [`ts_vector`](crate::ts_vector)
//!
//! Both are read when a builder is created, not when it renders, so changing a
//! default never affects queries that already exist.

use crate::dialect::Dialect;
use std::sync::{LazyLock, RwLock};

const INITIAL_TEXT_SEARCH_CONFIG: &str = "english";

static DEFAULT_DIALECT: LazyLock<RwLock<Dialect>> = LazyLock::new(|| RwLock::new(Dialect::MySql));

static DEFAULT_TEXT_SEARCH_CONFIG: LazyLock<RwLock<String>> =
    LazyLock::new(|| RwLock::new(INITIAL_TEXT_SEARCH_CONFIG.to_string()));

/// The dialect new queries start with.
pub fn default_dialect() -> Dialect {
    DEFAULT_DIALECT
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Replace the default dialect, returning the previous one.
pub fn set_default_dialect(dialect: Dialect) -> Dialect {
    let mut guard = DEFAULT_DIALECT.write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *guard, dialect)
}

/// The text-search configuration new `ts_vector` builders start with.
pub fn default_text_search_config() -> String {
    DEFAULT_TEXT_SEARCH_CONFIG
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Replace the default text-search configuration, returning the previous one.
pub fn set_default_text_search_config(config: impl Into<String>) -> String {
    let mut guard = DEFAULT_TEXT_SEARCH_CONFIG
        .write()
        .unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *guard, config.into())
}

/// What to do with RETURNING on dialects without RETURNING support (MySQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturningMode {
    /// Render RETURNING as written.
    #[default]
    Strict,
    /// Drop RETURNING when rendering for the MySQL kind.
    Omit,
}
