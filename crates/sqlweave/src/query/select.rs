//! SELECT: columns, joins, grouping, set operations and row locks.

use super::{Query, StatementKind, combine, write_predicate};
use crate::dialect::DialectKind;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, IntoSqlExpr, build_list};
use crate::render::BuildContext;
use crate::table::{IntoTable, TableExpr};
use crate::value::Value;
use std::sync::Arc;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// `<kind> <table> [ON <predicate>]`
#[derive(Clone, Debug)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableExpr,
    pub on: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
}

impl SetOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
        }
    }
}

/// Row lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    /// `FOR UPDATE`, identical on every dialect.
    Update,
    /// `LOCK IN SHARE MODE` on MySQL (`FOR SHARE` with a wait modifier),
    /// `FOR SHARE` on PostgreSQL.
    Share,
}

impl LockStrength {
    pub(crate) const fn method(self) -> &'static str {
        match self {
            LockStrength::Update => "for_update",
            LockStrength::Share => "lock_in_share_mode",
        }
    }
}

/// What a locking read does when a row is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockWait {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLock {
    pub strength: LockStrength,
    pub wait: LockWait,
}

impl RowLock {
    fn build(&self, ctx: &BuildContext<'_>) -> QueryResult<String> {
        let mut sql = match self.strength {
            LockStrength::Update => "FOR UPDATE".to_string(),
            LockStrength::Share => {
                let feature = "LOCK IN SHARE MODE";
                match ctx.dialect().recognized(feature)? {
                    // The legacy spelling takes no modifiers.
                    DialectKind::MySql if self.wait == LockWait::Wait => {
                        "LOCK IN SHARE MODE".to_string()
                    }
                    DialectKind::MySql | DialectKind::Postgres => "FOR SHARE".to_string(),
                    DialectKind::Sqlite => {
                        return Err(QueryError::UnsupportedDialect {
                            feature,
                            dialect: DialectKind::Sqlite.as_str(),
                        });
                    }
                }
            }
        };
        match self.wait {
            LockWait::Wait => {}
            LockWait::NoWait => sql.push_str(" NOWAIT"),
            LockWait::SkipLocked => sql.push_str(" SKIP LOCKED"),
        }
        Ok(sql)
    }
}

impl Query {
    /// Start (or extend) a SELECT with the given output expressions.
    ///
    /// Strings are emitted verbatim, so `"COUNT(p.id) AS post_count"` works.
    pub fn select<I, E>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        if self.establish(StatementKind::Select, "select") {
            self.columns
                .extend(columns.into_iter().map(IntoSqlExpr::into_sql_expr));
        }
        self
    }

    /// Append one output expression.
    pub fn column(self, column: impl IntoSqlExpr) -> Self {
        self.select([column])
    }

    /// `SELECT DISTINCT`
    pub fn distinct(mut self) -> Self {
        if self.establish(StatementKind::Select, "distinct") {
            self.distinct = true;
        }
        self
    }

    /// FROM source. On UPDATE this is the `UPDATE ... FROM` source.
    pub fn from(mut self, table: impl IntoTable) -> Self {
        if self.allow("from", &[StatementKind::Select, StatementKind::Update]) {
            self.from = Some(table.into_table());
        }
        self
    }

    fn push_join(
        mut self,
        kind: JoinKind,
        table: impl IntoTable,
        on: impl IntoIterator<Item = Expr>,
    ) -> Self {
        if self.allow("join", &[StatementKind::Select, StatementKind::Update]) {
            self.joins.push(Join {
                kind,
                table: table.into_table(),
                on: combine(None, on),
            });
        }
        self
    }

    /// `JOIN table ON (...)`
    pub fn join(self, table: impl IntoTable, on: impl IntoIterator<Item = Expr>) -> Self {
        self.push_join(JoinKind::Inner, table, on)
    }

    /// `LEFT JOIN table ON (...)`
    pub fn left_join(self, table: impl IntoTable, on: impl IntoIterator<Item = Expr>) -> Self {
        self.push_join(JoinKind::Left, table, on)
    }

    /// `RIGHT JOIN table ON (...)`
    pub fn right_join(self, table: impl IntoTable, on: impl IntoIterator<Item = Expr>) -> Self {
        self.push_join(JoinKind::Right, table, on)
    }

    /// `FULL JOIN table ON (...)`
    pub fn full_join(self, table: impl IntoTable, on: impl IntoIterator<Item = Expr>) -> Self {
        self.push_join(JoinKind::Full, table, on)
    }

    /// GROUP BY items; grouping constructs such as [`rollup`](crate::rollup) mix freely.
    pub fn group_by<I, E>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        if self.allow("group_by", &[StatementKind::Select]) {
            self.group_by
                .extend(items.into_iter().map(IntoSqlExpr::into_sql_expr));
        }
        self
    }

    /// AND predicates into HAVING, grouped like [`Query::filter`].
    pub fn having(mut self, predicates: impl IntoIterator<Item = Expr>) -> Self {
        if self.allow("having", &[StatementKind::Select]) {
            self.having = combine(self.having.take(), predicates);
        }
        self
    }

    /// AND one predicate into HAVING.
    pub fn and_having(self, predicate: Expr) -> Self {
        self.having([predicate])
    }

    /// ORDER BY items. After a UNION this orders the combined result.
    pub fn order_by<I, E>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        if !self.allow("order_by", &[StatementKind::Select]) {
            return self;
        }
        let items = items.into_iter().map(IntoSqlExpr::into_sql_expr);
        if self.set_ops.is_empty() {
            self.order_by.extend(items);
        } else {
            self.outer_order_by.extend(items);
        }
        self
    }

    /// LIMIT. Before any UNION it limits this operand; after, the whole result.
    pub fn limit(mut self, n: u64) -> Self {
        if self.allow("limit", &[StatementKind::Select]) {
            if self.set_ops.is_empty() {
                self.limit = Some(n);
            } else {
                self.outer_limit = Some(n);
            }
        }
        self
    }

    /// OFFSET, bound by the same call-order rule as [`Query::limit`].
    pub fn offset(mut self, n: u64) -> Self {
        if self.allow("offset", &[StatementKind::Select]) {
            if self.set_ops.is_empty() {
                self.offset = Some(n);
            } else {
                self.outer_offset = Some(n);
            }
        }
        self
    }

    /// Page helper: `LIMIT per_page OFFSET (page - 1) * per_page`, pages start at 1.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(per_page).offset(offset)
    }

    fn push_set_op(mut self, op: SetOperator, method: &'static str, other: Arc<Query>) -> Self {
        match self.kind {
            Some(StatementKind::Select) => {}
            Some(kind) => {
                self.record(QueryError::statement_kind(method, kind.as_str()));
                return self;
            }
            None => {
                self.record(QueryError::MissingStatement);
                return self;
            }
        }
        match other.kind {
            Some(StatementKind::Select) => self.set_ops.push((op, other)),
            Some(kind) => self.record(QueryError::statement_kind(method, kind.as_str())),
            None => self.record(QueryError::MissingStatement),
        }
        self
    }

    /// `... UNION (other)`
    pub fn union(self, other: impl Into<Arc<Query>>) -> Self {
        self.push_set_op(SetOperator::Union, "union", other.into())
    }

    /// `... UNION ALL (other)`
    pub fn union_all(self, other: impl Into<Arc<Query>>) -> Self {
        self.push_set_op(SetOperator::UnionAll, "union_all", other.into())
    }

    fn set_lock(mut self, strength: LockStrength) -> Self {
        if self.allow(strength.method(), &[StatementKind::Select]) {
            let wait = self.lock.map(|l| l.wait).unwrap_or_default();
            self.lock = Some(RowLock { strength, wait });
        }
        self
    }

    /// `FOR UPDATE`
    pub fn for_update(self) -> Self {
        self.set_lock(LockStrength::Update)
    }

    /// Shared row lock: `LOCK IN SHARE MODE` on MySQL, `FOR SHARE` on PostgreSQL.
    ///
    /// With [`nowait`](Query::nowait) or [`skip_locked`](Query::skip_locked)
    /// MySQL also renders `FOR SHARE`, since the legacy spelling takes no
    /// modifiers. SQLite has no row locks and rejects it at render.
    pub fn lock_in_share_mode(self) -> Self {
        self.set_lock(LockStrength::Share)
    }

    fn set_lock_wait(mut self, wait: LockWait, method: &'static str) -> Self {
        match self.lock.as_mut() {
            Some(lock) => lock.wait = wait,
            None => self.record(QueryError::LockModifierWithoutLock(method)),
        }
        self
    }

    /// Append `NOWAIT` to the row lock.
    pub fn nowait(self) -> Self {
        self.set_lock_wait(LockWait::NoWait, "NOWAIT")
    }

    /// Append `SKIP LOCKED` to the row lock.
    pub fn skip_locked(self) -> Self {
        self.set_lock_wait(LockWait::SkipLocked, "SKIP LOCKED")
    }

    /// AND a predicate selecting rows after `cursor` in the current ORDER BY.
    ///
    /// ORDER BY must be configured first and `cursor` must hold one value per
    /// ordering expression. Not available once a UNION is attached: page a
    /// UNION by selecting from it as a derived table.
    pub fn keyset_after<I, V>(self, cursor: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.keyset("keyset_after", cursor, crate::expr::keyset_after)
    }

    /// AND a predicate selecting rows before `cursor` in the current ORDER BY.
    pub fn keyset_before<I, V>(self, cursor: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.keyset("keyset_before", cursor, crate::expr::keyset_before)
    }

    fn keyset<I, V>(
        mut self,
        method: &'static str,
        cursor: I,
        predicate: fn(&[Expr], Vec<Value>) -> QueryResult<Expr>,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if !self.allow(method, &[StatementKind::Select]) {
            return self;
        }
        if !self.set_ops.is_empty() {
            self.record(QueryError::KeysetOnSetOperation(method));
            return self;
        }
        if self.order_by.is_empty() {
            self.record(QueryError::KeysetWithoutOrderBy(method));
            return self;
        }
        match predicate(&self.order_by, cursor.into_iter().map(Into::into).collect()) {
            Ok(expr) => self.and_where(expr),
            Err(err) => {
                self.record(err);
                self
            }
        }
    }

    pub(super) fn write_select(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        self.write_verb(sql, "SELECT", ctx);
        if self.distinct {
            sql.push_str(" DISTINCT");
        }
        sql.push(' ');
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&build_list(&self.columns, ctx)?);
        }
        if let Some(from) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(&from.build(ctx)?);
        }
        self.write_joins(sql, ctx)?;
        write_predicate(sql, "WHERE", self.where_clause.as_ref(), ctx)?;
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&build_list(&self.group_by, ctx)?);
        }
        write_predicate(sql, "HAVING", self.having.as_ref(), ctx)?;
        write_tail(sql, &self.order_by, self.limit, self.offset, ctx)?;

        for (op, operand) in &self.set_ops {
            let operand = operand.write_sql(ctx)?;
            sql.push(' ');
            sql.push_str(op.as_str());
            sql.push_str(" (");
            sql.push_str(&operand);
            sql.push(')');
        }
        write_tail(
            sql,
            &self.outer_order_by,
            self.outer_limit,
            self.outer_offset,
            ctx,
        )?;

        if let Some(lock) = &self.lock {
            sql.push(' ');
            sql.push_str(&lock.build(ctx)?);
        }
        Ok(())
    }

    pub(super) fn write_joins(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_str());
            sql.push(' ');
            sql.push_str(&join.table.build(ctx)?);
            write_predicate(sql, "ON", join.on.as_ref(), ctx)?;
        }
        Ok(())
    }
}

/// ` ORDER BY ... LIMIT n OFFSET m`
fn write_tail(
    sql: &mut String,
    order_by: &[Expr],
    limit: Option<u64>,
    offset: Option<u64>,
    ctx: &mut BuildContext<'_>,
) -> QueryResult<()> {
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&build_list(order_by, ctx)?);
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }
    Ok(())
}
