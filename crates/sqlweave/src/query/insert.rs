//! INSERT: VALUES rows, INSERT ... SELECT, IGNORE and conflict handling.

use super::{Query, StatementKind};
use crate::dialect::DialectKind;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, IntoExpr, build_list};
use crate::render::BuildContext;
use crate::table::IntoTable;
use std::sync::Arc;

/// Right-hand side of a SET / DO UPDATE assignment.
#[derive(Clone, Debug)]
pub enum AssignValue {
    Expr(Expr),
    /// The value the conflicting INSERT proposed for this column:
    /// `EXCLUDED.col` on PostgreSQL and SQLite, `VALUES(col)` on MySQL.
    Excluded,
}

/// `column = value`
#[derive(Clone, Debug)]
pub struct Assignment {
    pub column: String,
    pub value: AssignValue,
}

/// `column = value`; values bind, use [`raw`](crate::raw) for SQL such as `now()`.
pub fn assign(column: impl Into<String>, value: impl IntoExpr) -> Assignment {
    Assignment::new(column, value)
}

impl Assignment {
    pub fn new(column: impl Into<String>, value: impl IntoExpr) -> Self {
        Self {
            column: column.into(),
            value: AssignValue::Expr(value.into_expr()),
        }
    }

    /// `column = <proposed value>`, spelled per dialect.
    pub fn excluded(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: AssignValue::Excluded,
        }
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        let column = &self.column;
        match &self.value {
            AssignValue::Expr(expr) => Ok(format!("{column} = {}", expr.build(ctx)?)),
            AssignValue::Excluded => {
                match ctx.dialect().recognized("EXCLUDED column reference")? {
                    DialectKind::MySql => Ok(format!("{column} = VALUES({column})")),
                    DialectKind::Postgres | DialectKind::Sqlite => {
                        Ok(format!("{column} = EXCLUDED.{column}"))
                    }
                }
            }
        }
    }
}

pub(super) fn build_assignments(
    assignments: &[Assignment],
    ctx: &mut BuildContext<'_>,
) -> QueryResult<String> {
    let mut parts = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        parts.push(assignment.build(ctx)?);
    }
    Ok(parts.join(", "))
}

/// Conflict handling for INSERT.
#[derive(Clone, Debug)]
pub enum OnConflict {
    /// `ON CONFLICT [(targets)] DO NOTHING`
    DoNothing { targets: Vec<String> },
    /// `ON CONFLICT [(targets)] DO UPDATE SET ...` / `ON DUPLICATE KEY UPDATE ...`
    DoUpdate {
        targets: Vec<String>,
        assignments: Vec<Assignment>,
    },
}

fn targets_sql(targets: &[String]) -> String {
    if targets.is_empty() {
        String::new()
    } else {
        format!(" ({})", targets.join(", "))
    }
}

impl Query {
    /// Start an INSERT into `table` with the given column list.
    pub fn insert_into<I, S>(mut self, table: impl IntoTable, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.establish(StatementKind::Insert, "insert_into") {
            self.target = Some(table.into_table());
            self.insert_columns = columns.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Append one VALUES row. Arity against the column list is not checked.
    pub fn values<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr,
    {
        if !self.establish(StatementKind::Insert, "values") {
            return self;
        }
        if self.insert_source.is_some() {
            self.record(QueryError::ConflictingInsertSource);
            return self;
        }
        self.rows
            .push(row.into_iter().map(IntoExpr::into_expr).collect());
        self
    }

    /// `INSERT INTO t (cols) SELECT ...`
    pub fn insert_select(mut self, source: impl Into<Arc<Query>>) -> Self {
        if !self.establish(StatementKind::Insert, "insert_select") {
            return self;
        }
        if !self.rows.is_empty() {
            self.record(QueryError::ConflictingInsertSource);
            return self;
        }
        self.insert_source = Some(source.into());
        self
    }

    /// Skip conflicting rows: `INSERT IGNORE` on MySQL, `ON CONFLICT DO NOTHING` elsewhere.
    pub fn insert_ignore(mut self) -> Self {
        if self.establish(StatementKind::Insert, "insert_ignore") {
            self.insert_ignore = true;
        }
        self
    }

    /// `ON CONFLICT (targets) DO NOTHING`.
    ///
    /// MySQL has no such clause; it renders a no-op
    /// `ON DUPLICATE KEY UPDATE <first column> = <first column>`.
    pub fn on_conflict_do_nothing<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.establish(StatementKind::Insert, "on_conflict_do_nothing") {
            self.conflict = Some(OnConflict::DoNothing {
                targets: targets.into_iter().map(Into::into).collect(),
            });
        }
        self
    }

    /// `ON CONFLICT (targets) DO UPDATE SET ...`, or `ON DUPLICATE KEY UPDATE ...` on MySQL.
    pub fn on_conflict_do_update<I, S, A>(mut self, targets: I, assignments: A) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        A: IntoIterator<Item = Assignment>,
    {
        if self.establish(StatementKind::Insert, "on_conflict_do_update") {
            self.conflict = Some(OnConflict::DoUpdate {
                targets: targets.into_iter().map(Into::into).collect(),
                assignments: assignments.into_iter().collect(),
            });
        }
        self
    }

    pub(super) fn write_insert(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        let target = self.target.as_ref().ok_or(QueryError::MissingInsertTable)?;
        if self.insert_ignore && self.conflict.is_some() {
            return Err(QueryError::InsertIgnoreWithConflict);
        }
        let ignore_kind = if self.insert_ignore {
            Some(ctx.dialect().recognized("INSERT IGNORE")?)
        } else {
            None
        };

        self.write_verb(sql, "INSERT", ctx);
        if ignore_kind == Some(DialectKind::MySql) {
            sql.push_str(" IGNORE");
        }
        sql.push_str(" INTO ");
        sql.push_str(&target.build(ctx)?);
        if !self.insert_columns.is_empty() {
            sql.push_str(" (");
            sql.push_str(&self.insert_columns.join(", "));
            sql.push(')');
        }

        if let Some(source) = &self.insert_source {
            sql.push(' ');
            sql.push_str(&source.write_sql(ctx)?);
        } else if !self.rows.is_empty() {
            let mut rows = Vec::with_capacity(self.rows.len());
            for row in &self.rows {
                rows.push(format!("({})", build_list(row, ctx)?));
            }
            sql.push_str(" VALUES ");
            sql.push_str(&rows.join(", "));
        }

        if matches!(
            ignore_kind,
            Some(DialectKind::Postgres) | Some(DialectKind::Sqlite)
        ) {
            sql.push_str(" ON CONFLICT DO NOTHING");
        }
        if let Some(conflict) = &self.conflict {
            self.write_conflict(sql, conflict, ctx)?;
        }
        self.write_returning(sql, ctx)
    }

    fn write_conflict(
        &self,
        sql: &mut String,
        conflict: &OnConflict,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        let feature = "ON CONFLICT";
        match ctx.dialect().recognized(feature)? {
            DialectKind::MySql => {
                sql.push_str(" ON DUPLICATE KEY UPDATE ");
                match conflict {
                    OnConflict::DoUpdate { assignments, .. } => {
                        sql.push_str(&build_assignments(assignments, ctx)?);
                    }
                    OnConflict::DoNothing { .. } => {
                        let Some(first) = self.insert_columns.first() else {
                            return Err(QueryError::UnsupportedDialect {
                                feature: "ON CONFLICT DO NOTHING without columns",
                                dialect: DialectKind::MySql.as_str(),
                            });
                        };
                        sql.push_str(&format!("{first} = {first}"));
                    }
                }
            }
            DialectKind::Postgres | DialectKind::Sqlite => match conflict {
                OnConflict::DoNothing { targets } => {
                    sql.push_str(" ON CONFLICT");
                    sql.push_str(&targets_sql(targets));
                    sql.push_str(" DO NOTHING");
                }
                OnConflict::DoUpdate {
                    targets,
                    assignments,
                } => {
                    sql.push_str(" ON CONFLICT");
                    sql.push_str(&targets_sql(targets));
                    sql.push_str(" DO UPDATE SET ");
                    sql.push_str(&build_assignments(assignments, ctx)?);
                }
            },
        }
        Ok(())
    }
}
