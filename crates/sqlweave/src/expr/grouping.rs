//! GROUPING SETS, ROLLUP and CUBE.

use super::{Expr, IntoSqlExpr, build_list};
use crate::error::{QueryError, QueryResult};
use crate::render::BuildContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKind {
    /// A literal tuple `(a, b)`; empty means the grand total `()`.
    Set,
    /// `GROUPING SETS (...)`
    Sets,
    /// `ROLLUP (...)`
    Rollup,
    /// `CUBE (...)`
    Cube,
}

impl GroupingKind {
    fn keyword(self) -> &'static str {
        match self {
            GroupingKind::Set => "",
            GroupingKind::Sets => "GROUPING SETS",
            GroupingKind::Rollup => "ROLLUP",
            GroupingKind::Cube => "CUBE",
        }
    }
}

fn collect<I, E>(items: I) -> Vec<Expr>
where
    I: IntoIterator<Item = E>,
    E: IntoSqlExpr,
{
    items.into_iter().map(IntoSqlExpr::into_sql_expr).collect()
}

fn non_empty(kind: GroupingKind, items: Vec<Expr>) -> QueryResult<Expr> {
    if items.is_empty() {
        return Err(QueryError::EmptyGrouping(kind.keyword()));
    }
    Ok(Expr::Grouping { kind, items })
}

/// The empty grouping set `()`.
pub fn grand_total() -> Expr {
    Expr::Grouping {
        kind: GroupingKind::Set,
        items: Vec::new(),
    }
}

/// A grouping tuple `(a, b, ...)`.
pub fn group_set<I, E>(items: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: IntoSqlExpr,
{
    Expr::Grouping {
        kind: GroupingKind::Set,
        items: collect(items),
    }
}

/// `GROUPING SETS (set, ...)`
pub fn grouping_sets(sets: impl IntoIterator<Item = Expr>) -> QueryResult<Expr> {
    non_empty(GroupingKind::Sets, sets.into_iter().collect())
}

/// `ROLLUP (a, b, ...)`
pub fn rollup<I, E>(items: I) -> QueryResult<Expr>
where
    I: IntoIterator<Item = E>,
    E: IntoSqlExpr,
{
    non_empty(GroupingKind::Rollup, collect(items))
}

/// `CUBE (a, b, ...)`
pub fn cube<I, E>(items: I) -> QueryResult<Expr>
where
    I: IntoIterator<Item = E>,
    E: IntoSqlExpr,
{
    non_empty(GroupingKind::Cube, collect(items))
}

pub(super) fn build(
    kind: GroupingKind,
    items: &[Expr],
    ctx: &mut BuildContext<'_>,
) -> QueryResult<String> {
    if kind == GroupingKind::Set {
        return Ok(format!("({})", build_list(items, ctx)?));
    }
    if items.is_empty() {
        return Err(QueryError::EmptyGrouping(kind.keyword()));
    }
    Ok(format!("{} ({})", kind.keyword(), build_list(items, ctx)?))
}
