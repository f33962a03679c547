//! Expression tree for columns, values, predicates and dialect extensions.
//!
//! [`Expr`] is a closed sum type. Every node renders through
//! [`Expr::build`], which returns the SQL fragment and appends the node's
//! arguments to the [`BuildContext`]. A value leaf binds exactly one argument
//! and requests exactly one placeholder, at the position it appears in the
//! text, so argument order always matches placeholder order no matter how
//! deeply the tree nests.
//!
//! Predicates are plain expressions; AND/OR groups drop children that render
//! empty and render empty themselves when nothing survives, which lets
//! optional filters collapse without leaving a dangling `WHERE`.

mod convert;
mod fulltext;
mod grouping;
mod json;
mod keyset;
mod window;

#[cfg(test)]
mod tests;

pub use convert::{IntoExpr, IntoSqlExpr};
pub use fulltext::{MatchAgainst, MatchBuilder, MatchMode, TsQueryMode, TsSearch, TsVector, match_columns, ts_vector};
pub use grouping::{GroupingKind, cube, grand_total, group_set, grouping_sets, rollup};
pub use json::{json_contains, json_extract, json_extract_text};
pub use keyset::{keyset_after, keyset_before};
pub use window::{FrameBound, FrameMode, WindowFrame, WindowSpec};

use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::render::BuildContext;
use crate::value::Value;
use std::sync::Arc;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl CompareOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// Sort direction for ORDER BY and window ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Expression node.
#[derive(Clone, Debug)]
pub enum Expr {
    /// Column reference, optionally aliased: `name [AS alias]`.
    Column { name: String, alias: Option<String> },

    /// Bound value: one placeholder, one argument.
    Value(Value),

    /// Verbatim SQL. `args` are appended as-is, without renumbering.
    Raw { sql: String, args: Vec<Value> },

    /// SQL with `?` markers rewritten to the dialect's placeholders.
    Template { sql: String, args: Vec<Value> },

    /// Parenthesized subquery.
    Subquery(Arc<Query>),

    /// Generated alias of an anonymous derived table, optionally qualifying a
    /// column: `subq_N[.column]`. Resolved by identity, like the table itself.
    DerivedColumn {
        query: Arc<Query>,
        column: Option<String>,
    },

    /// `left op right`
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },

    /// `left [NOT] IN (a, b, ...)`
    InList {
        left: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `left [NOT] IN (SELECT ...)`
    InSubquery {
        left: Box<Expr>,
        query: Arc<Query>,
        negated: bool,
    },

    /// `left [NOT] BETWEEN low AND high`
    Between {
        left: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    NullCheck { expr: Box<Expr>, is_null: bool },

    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// `expr ASC|DESC`
    Ordered { expr: Box<Expr>, order: SortOrder },

    /// `name(arg, ...)`
    Function { name: String, args: Vec<Expr> },

    /// `function OVER (window)`
    Over {
        function: Box<Expr>,
        window: WindowSpec,
    },

    /// Grouping constructs for GROUP BY.
    Grouping { kind: GroupingKind, items: Vec<Expr> },

    /// MySQL `MATCH(...) AGAINST (...)`.
    Match(MatchAgainst),

    /// PostgreSQL `to_tsvector(...) @@ <tsquery>`.
    TsMatch(TsSearch),

    /// PostgreSQL `ts_rank(<tsvector>, <tsquery>[, normalization])`.
    TsRank {
        search: TsSearch,
        normalization: Option<i32>,
    },

    /// Dialect-aware JSON extraction with a bound path.
    JsonExtract {
        column: String,
        path: Box<Expr>,
        unquote: bool,
    },

    /// Dialect-aware JSON containment with a bound document.
    JsonContains { column: String, value: Box<Expr> },
}

/// Column reference.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column {
        name: name.into(),
        alias: None,
    }
}

/// Column reference with a SELECT-list alias.
pub fn col_alias(name: impl Into<String>, alias: impl Into<String>) -> Expr {
    Expr::Column {
        name: name.into(),
        alias: Some(alias.into()),
    }
}

/// The generated alias of `query` used as an anonymous derived table.
///
/// Only the `subq_N` alias is resolved; a table given an explicit alias with
/// [`derived`](crate::derived) is referenced by that name instead.
pub fn alias_of(query: &Arc<Query>) -> Expr {
    Expr::DerivedColumn {
        query: Arc::clone(query),
        column: None,
    }
}

/// `subq_N.column` for `query` used as an anonymous derived table.
///
/// ```
/// use std::sync::Arc;
/// use sqlweave::{Dialect, Query, derived_col};
///
/// let votes = Arc::new(Query::new().select(["user_id"]).from("votes"));
/// let q = Query::new()
///     .with_dialect(Dialect::Postgres)
///     .select([derived_col(&votes, "user_id")])
///     .from(Arc::clone(&votes))
///     .filter([derived_col(&votes, "user_id").gt(3)]);
/// assert_eq!(
///     q.to_sql().unwrap(),
///     "SELECT subq_1.user_id FROM (SELECT user_id FROM votes) AS subq_1 WHERE (subq_1.user_id > $1)"
/// );
/// ```
pub fn derived_col(query: &Arc<Query>, column: impl Into<String>) -> Expr {
    Expr::DerivedColumn {
        query: Arc::clone(query),
        column: Some(column.into()),
    }
}

/// Raw SQL fragment without arguments.
pub fn raw(sql: impl Into<String>) -> Expr {
    Expr::raw(sql)
}

/// Function call `name(args...)`.
pub fn func<I, A>(name: impl Into<String>, args: I) -> Expr
where
    I: IntoIterator<Item = A>,
    A: IntoExpr,
{
    Expr::Function {
        name: name.into(),
        args: args.into_iter().map(IntoExpr::into_expr).collect(),
    }
}

impl Expr {
    /// AND group over `exprs`; children that render empty are dropped.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }

    /// OR group over `exprs`, with the same empty-child rule as [`Expr::and`].
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(exprs.into_iter().collect())
    }

    /// `NOT (expr)`, or nothing when `expr` renders empty.
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// Bound value.
    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    /// Verbatim SQL without arguments.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Raw SQL fragment carrying its own arguments.
    ///
    /// The text is emitted verbatim, so it must already contain placeholders
    /// valid for the target dialect.
    pub fn raw_with(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            args,
        }
    }

    /// SQL whose `?` markers are renumbered into the dialect's placeholders.
    ///
    /// # Example
    /// ```
    /// use sqlweave::{Dialect, Expr, Value};
    ///
    /// let e = Expr::template("a = ? OR b = ?", vec![Value::Int(1), Value::Int(2)]);
    /// assert_eq!(e.to_sql(&Dialect::Postgres).unwrap(), "a = $1 OR b = $2");
    /// ```
    pub fn template(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Expr::Template {
            sql: sql.into(),
            args,
        }
    }

    /// Whether this is an AND/OR group.
    pub fn is_compound(&self) -> bool {
        matches!(self, Expr::And(_) | Expr::Or(_))
    }

    fn compare(self, op: CompareOp, value: impl IntoExpr) -> Expr {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(value.into_expr()),
        }
    }

    /// `self = value`
    pub fn eq(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Eq, value)
    }

    /// `self <> value`
    pub fn ne(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Ne, value)
    }

    /// `self > value`
    pub fn gt(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Gt, value)
    }

    /// `self >= value`
    pub fn gte(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Gte, value)
    }

    /// `self < value`
    pub fn lt(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Lt, value)
    }

    /// `self <= value`
    pub fn lte(self, value: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Lte, value)
    }

    /// `self LIKE pattern`
    pub fn like(self, pattern: impl IntoExpr) -> Expr {
        self.compare(CompareOp::Like, pattern)
    }

    /// `self IS NULL`
    pub fn is_null(self) -> Expr {
        Expr::NullCheck {
            expr: Box::new(self),
            is_null: true,
        }
    }

    /// `self IS NOT NULL`
    pub fn is_not_null(self) -> Expr {
        Expr::NullCheck {
            expr: Box::new(self),
            is_null: false,
        }
    }

    /// `self IN (values...)`.
    ///
    /// A single subquery operand becomes `self IN (SELECT ...)`. An empty list
    /// is rejected with [`QueryError::EmptyInList`].
    pub fn in_list<I, V>(self, values: I) -> QueryResult<Expr>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr,
    {
        self.membership(values, false)
    }

    /// `self NOT IN (values...)`, same rules as [`Expr::in_list`].
    pub fn not_in<I, V>(self, values: I) -> QueryResult<Expr>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr,
    {
        self.membership(values, true)
    }

    fn membership<I, V>(self, values: I, negated: bool) -> QueryResult<Expr>
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr,
    {
        let list: Vec<Expr> = values.into_iter().map(IntoExpr::into_expr).collect();
        if list.is_empty() {
            return Err(QueryError::EmptyInList);
        }
        if let [Expr::Subquery(query)] = list.as_slice() {
            return Ok(Expr::InSubquery {
                left: Box::new(self),
                query: Arc::clone(query),
                negated,
            });
        }
        Ok(Expr::InList {
            left: Box::new(self),
            list,
            negated,
        })
    }

    /// `self IN (SELECT ...)`
    pub fn in_subquery(self, query: impl Into<Arc<Query>>) -> Expr {
        Expr::InSubquery {
            left: Box::new(self),
            query: query.into(),
            negated: false,
        }
    }

    /// `self NOT IN (SELECT ...)`
    pub fn not_in_subquery(self, query: impl Into<Arc<Query>>) -> Expr {
        Expr::InSubquery {
            left: Box::new(self),
            query: query.into(),
            negated: true,
        }
    }

    /// `self BETWEEN low AND high`
    pub fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Expr {
        Expr::Between {
            left: Box::new(self),
            low: Box::new(low.into_expr()),
            high: Box::new(high.into_expr()),
            negated: false,
        }
    }

    /// `self NOT BETWEEN low AND high`
    pub fn not_between(self, low: impl IntoExpr, high: impl IntoExpr) -> Expr {
        Expr::Between {
            left: Box::new(self),
            low: Box::new(low.into_expr()),
            high: Box::new(high.into_expr()),
            negated: true,
        }
    }

    /// `self ASC`
    pub fn asc(self) -> Expr {
        Expr::Ordered {
            expr: Box::new(self),
            order: SortOrder::Asc,
        }
    }

    /// `self DESC`
    pub fn desc(self) -> Expr {
        Expr::Ordered {
            expr: Box::new(self),
            order: SortOrder::Desc,
        }
    }

    /// `self OVER (window)`
    pub fn over(self, window: WindowSpec) -> Expr {
        Expr::Over {
            function: Box::new(self),
            window,
        }
    }

    /// Render this expression on its own, discarding arguments.
    ///
    /// Handy for inspecting fragments; queries render through
    /// [`render`](crate::render).
    pub fn to_sql(&self, dialect: &crate::Dialect) -> QueryResult<String> {
        let mut ctx = BuildContext::new(dialect);
        self.build(&mut ctx)
    }

    /// Build the SQL fragment, binding arguments into `ctx`.
    pub fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        match self {
            Expr::Column { name, alias } => Ok(match alias {
                Some(alias) => format!("{name} AS {alias}"),
                None => name.clone(),
            }),
            Expr::Value(value) => Ok(ctx.bind(value.clone())),
            Expr::Raw { sql, args } => {
                ctx.extend_args(args);
                Ok(sql.clone())
            }
            Expr::Template { sql, args } => Ok(build_template(sql, args, ctx)),
            Expr::Subquery(query) => Ok(format!("({})", query.write_sql(ctx)?)),
            Expr::DerivedColumn { query, column } => {
                let alias = ctx.alias_for(query);
                Ok(match column {
                    Some(column) => format!("{alias}.{column}"),
                    None => alias,
                })
            }
            Expr::Compare { left, op, right } => {
                let left = left.build(ctx)?;
                let right = right.build(ctx)?;
                Ok(format!("{left} {} {right}", op.as_str()))
            }
            Expr::InList {
                left,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Err(QueryError::EmptyInList);
                }
                let left = left.build(ctx)?;
                let items = build_list(list, ctx)?;
                Ok(format!("{left} {} ({items})", in_keyword(*negated)))
            }
            Expr::InSubquery {
                left,
                query,
                negated,
            } => {
                let left = left.build(ctx)?;
                let sub = query.write_sql(ctx)?;
                Ok(format!("{left} {} ({sub})", in_keyword(*negated)))
            }
            Expr::Between {
                left,
                low,
                high,
                negated,
            } => {
                let left = left.build(ctx)?;
                let low = low.build(ctx)?;
                let high = high.build(ctx)?;
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{left} {op} {low} AND {high}"))
            }
            Expr::NullCheck { expr, is_null } => {
                let expr = expr.build(ctx)?;
                Ok(if *is_null {
                    format!("{expr} IS NULL")
                } else {
                    format!("{expr} IS NOT NULL")
                })
            }
            Expr::And(parts) => build_compound(parts, " AND ", ctx),
            Expr::Or(parts) => build_compound(parts, " OR ", ctx),
            Expr::Not(inner) => {
                let sql = inner.build(ctx)?;
                Ok(if sql.is_empty() {
                    String::new()
                } else {
                    format!("NOT ({sql})")
                })
            }
            Expr::Ordered { expr, order } => {
                Ok(format!("{} {}", expr.build(ctx)?, order.as_str()))
            }
            Expr::Function { name, args } => Ok(format!("{name}({})", build_list(args, ctx)?)),
            Expr::Over { function, window } => {
                let function = function.build(ctx)?;
                Ok(format!("{function} OVER ({})", window.build(ctx)?))
            }
            Expr::Grouping { kind, items } => grouping::build(*kind, items, ctx),
            Expr::Match(m) => m.build(ctx),
            Expr::TsMatch(search) => search.build_match(ctx),
            Expr::TsRank {
                search,
                normalization,
            } => search.build_rank(*normalization, ctx),
            Expr::JsonExtract {
                column,
                path,
                unquote,
            } => json::build_extract(column, path, *unquote, ctx),
            Expr::JsonContains { column, value } => json::build_contains(column, value, ctx),
        }
    }
}

fn in_keyword(negated: bool) -> &'static str {
    if negated { "NOT IN" } else { "IN" }
}

/// Render a comma-separated list, left to right.
pub(crate) fn build_list(exprs: &[Expr], ctx: &mut BuildContext<'_>) -> QueryResult<String> {
    let mut parts = Vec::with_capacity(exprs.len());
    for expr in exprs {
        parts.push(expr.build(ctx)?);
    }
    Ok(parts.join(", "))
}

fn build_compound(parts: &[Expr], sep: &str, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
    let mut fragments = Vec::with_capacity(parts.len());
    for part in parts {
        let sql = part.build(ctx)?;
        if !sql.is_empty() {
            fragments.push(sql);
        }
    }
    if fragments.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("({})", fragments.join(sep)))
}

// Extra `?` without a matching argument stays literal.
fn build_template(sql: &str, args: &[Value], ctx: &mut BuildContext<'_>) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut pending = args.iter();
    for ch in sql.chars() {
        if ch == '?' {
            if let Some(value) = pending.next() {
                out.push_str(&ctx.bind(value.clone()));
                continue;
            }
        }
        out.push(ch);
    }
    out
}
