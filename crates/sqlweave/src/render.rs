//! The render protocol.
//!
//! [`render`] walks a [`Query`] tree once, threading a fresh [`BuildContext`]
//! through every node. The context is the only mutable state of a render: the
//! query itself is borrowed immutably, so the same query can be rendered any
//! number of times, from any number of threads.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::query::Query;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-render state: argument list, dialect and generated subquery aliases.
///
/// Placeholder numbering is derived from the argument list, so the Nth bound
/// value anywhere in the statement (nested subqueries included) always gets
/// placeholder N.
#[derive(Debug)]
pub struct BuildContext<'a> {
    dialect: &'a Dialect,
    args: Vec<Value>,
    aliases: HashMap<*const Query, String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            args: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    /// The dialect this render targets.
    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    /// Bind a value and return its placeholder token.
    pub fn bind(&mut self, value: Value) -> String {
        self.args.push(value);
        self.dialect.placeholder(self.args.len())
    }

    /// Append pre-supplied arguments of a verbatim fragment.
    pub fn extend_args(&mut self, args: &[Value]) {
        self.args.extend_from_slice(args);
    }

    /// Number of arguments bound so far.
    pub fn args_len(&self) -> usize {
        self.args.len()
    }

    /// Alias for an anonymous derived table.
    ///
    /// Keyed by the identity of the shared query, not its contents: the same
    /// `Arc<Query>` always gets the same alias within one render, distinct
    /// instances get `subq_1`, `subq_2`, ... in the order they are first seen.
    pub fn alias_for(&mut self, query: &Arc<Query>) -> String {
        let next = self.aliases.len() + 1;
        self.aliases
            .entry(Arc::as_ptr(query))
            .or_insert_with(|| format!("subq_{next}"))
            .clone()
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }
}

/// Rendered SQL plus its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl BuiltQuery {
    /// Split into SQL text and arguments.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Arguments as `tokio-postgres` parameter references.
    #[cfg(feature = "postgres")]
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.args
            .iter()
            .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

/// Render `query` for `dialect`.
///
/// Pure: no hooks fire and nothing global is read. Use
/// [`Query::build`](crate::Query::build) for the instrumented path.
pub fn render(query: &Query, dialect: &Dialect) -> QueryResult<BuiltQuery> {
    let mut ctx = BuildContext::new(dialect);
    let sql = query.write_sql(&mut ctx)?;
    Ok(BuiltQuery {
        sql,
        args: ctx.into_args(),
    })
}
