//! # sqlweave
//!
//! Composable SQL generation: build statements as a tree, render them to
//! parameterized SQL for a target dialect.
//!
//! ## Features
//!
//! - **Deterministic rendering**: the Nth bound value always gets placeholder N,
//!   nested subqueries included
//! - **Dialect aware**: `?` or `$N` placeholders, and dialect-exclusive syntax
//!   (full-text search, JSON operators, upserts, row locks) gated by dialect kind
//! - **Pure render**: a [`Query`] is never modified by rendering, so it can be
//!   rendered repeatedly and shared across threads
//! - **Sticky misuse errors**: builder chains never panic; the first misuse is
//!   reported by every render
//! - **Build hooks**: observe every build with [`BuildHook`], [`StatsHook`] or
//!   `TracingBuildHook`
//!
//! ## Example
//!
//! ```
//! use sqlweave::{Dialect, Query, col, table_alias};
//!
//! let built = Query::new()
//!     .with_dialect(Dialect::Postgres)
//!     .select(["u.id", "u.email"])
//!     .from(table_alias("users", "u"))
//!     .filter([
//!         col("u.status").eq("active"),
//!         col("u.id").in_list([1, 2, 3]).unwrap(),
//!     ])
//!     .order_by([col("u.id").desc()])
//!     .limit(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     built.sql,
//!     "SELECT u.id, u.email FROM users AS u WHERE (u.status = $1 AND u.id IN ($2, $3, $4)) ORDER BY u.id DESC LIMIT 10"
//! );
//! assert_eq!(built.args.len(), 4);
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod hooks;
pub mod query;
pub mod render;
pub mod table;
pub mod value;

pub use config::{
    ReturningMode, default_dialect, default_text_search_config, set_default_dialect,
    set_default_text_search_config,
};
pub use dialect::{CustomDialect, Dialect, DialectKind};
pub use error::{QueryError, QueryResult};
pub use expr::{
    CompareOp, Expr, FrameBound, FrameMode, GroupingKind, IntoExpr, IntoSqlExpr, MatchMode,
    SortOrder, TsQueryMode, TsVector, WindowFrame, WindowSpec, alias_of, col, col_alias, cube,
    derived_col, func,
    grand_total, group_set, grouping_sets, json_contains, json_extract, json_extract_text,
    keyset_after, keyset_before, match_columns, raw, rollup, ts_vector,
};
#[cfg(feature = "tracing")]
pub use hooks::TracingBuildHook;
pub use hooks::{
    BuildHook, BuildHookFns, BuildReport, BuildResult, BuildStats, CancelToken, HookResult,
    RenderContext, StatsHook, global_build_hooks, register_build_hooks, set_global_build_hooks,
};
pub use query::{Assignment, OnConflict, OptimizerHint, Query, StatementKind, assign};
pub use render::{BuildContext, BuiltQuery, render};
pub use table::{FunctionTable, IntoTable, TableExpr, derived, table, table_alias};
pub use value::Value;
