//! UPDATE ... SET ... [FROM ...] [WHERE ...] [RETURNING ...]

use super::insert::{Assignment, build_assignments};
use super::{Query, StatementKind, write_predicate};
use crate::error::{QueryError, QueryResult};
use crate::expr::IntoExpr;
use crate::render::BuildContext;
use crate::table::IntoTable;

impl Query {
    /// Start an UPDATE of `table`.
    pub fn update(mut self, table: impl IntoTable) -> Self {
        if self.establish(StatementKind::Update, "update") {
            self.target = Some(table.into_table());
        }
        self
    }

    /// `SET column = value`.
    pub fn set(mut self, column: impl Into<String>, value: impl IntoExpr) -> Self {
        if self.allow("set", &[StatementKind::Update]) {
            self.assignments.push(Assignment::new(column, value));
        }
        self
    }

    /// `SET column = value` when present.
    pub fn set_opt<V: IntoExpr>(self, column: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub(super) fn write_update(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        if self.assignments.is_empty() {
            return Err(QueryError::UpdateWithoutSet);
        }
        let target = self.target.as_ref().ok_or(QueryError::MissingStatement)?;

        self.write_verb(sql, "UPDATE", ctx);
        sql.push(' ');
        sql.push_str(&target.build(ctx)?);
        sql.push_str(" SET ");
        sql.push_str(&build_assignments(&self.assignments, ctx)?);
        if let Some(from) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(&from.build(ctx)?);
        }
        self.write_joins(sql, ctx)?;
        write_predicate(sql, "WHERE", self.where_clause.as_ref(), ctx)?;
        self.write_returning(sql, ctx)
    }
}
