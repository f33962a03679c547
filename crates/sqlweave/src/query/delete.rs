use super::{Query, StatementKind, write_predicate};
use crate::error::{QueryError, QueryResult};
use crate::render::BuildContext;
use crate::table::IntoTable;

impl Query {
    /// Start a DELETE from `table`.
    pub fn delete_from(mut self, table: impl IntoTable) -> Self {
        if self.establish(StatementKind::Delete, "delete_from") {
            self.target = Some(table.into_table());
        }
        self
    }

    pub(super) fn write_delete(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        let target = self.target.as_ref().ok_or(QueryError::MissingStatement)?;
        self.write_verb(sql, "DELETE", ctx);
        sql.push_str(" FROM ");
        sql.push_str(&target.build(ctx)?);
        write_predicate(sql, "WHERE", self.where_clause.as_ref(), ctx)?;
        self.write_returning(sql, ctx)
    }
}
