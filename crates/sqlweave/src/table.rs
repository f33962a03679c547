//! FROM / JOIN / DML targets.

use crate::dialect::DialectKind;
use crate::error::QueryResult;
use crate::expr::{Expr, IntoExpr, build_list};
use crate::query::Query;
use crate::render::BuildContext;
use std::sync::Arc;

/// A table-valued source.
#[derive(Clone, Debug)]
pub enum TableExpr {
    /// `name [AS alias]`
    Named { name: String, alias: Option<String> },
    /// `(SELECT ...) AS alias`; a missing alias is generated per render.
    Derived {
        query: Arc<Query>,
        alias: Option<String>,
    },
    /// Set-returning function call.
    Function(FunctionTable),
}

/// Table by name.
pub fn table(name: impl Into<String>) -> TableExpr {
    TableExpr::Named {
        name: name.into(),
        alias: None,
    }
}

/// Table by name with alias.
pub fn table_alias(name: impl Into<String>, alias: impl Into<String>) -> TableExpr {
    TableExpr::Named {
        name: name.into(),
        alias: Some(alias.into()),
    }
}

/// Subquery as a table with an explicit alias.
pub fn derived(query: impl Into<Arc<Query>>, alias: impl Into<String>) -> TableExpr {
    TableExpr::Derived {
        query: query.into(),
        alias: Some(alias.into()),
    }
}

impl TableExpr {
    pub(crate) fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        match self {
            TableExpr::Named { name, alias } => Ok(match alias {
                Some(alias) => format!("{name} AS {alias}"),
                None => name.clone(),
            }),
            TableExpr::Derived { query, alias } => {
                let alias = match alias {
                    Some(alias) => alias.clone(),
                    None => ctx.alias_for(query),
                };
                let sql = query.write_sql(ctx)?;
                Ok(format!("({sql}) AS {alias}"))
            }
            TableExpr::Function(function) => function.build(ctx),
        }
    }
}

/// `fn(args) [WITH ORDINALITY] [AS alias [(columns)]]`
#[derive(Clone, Debug)]
pub struct FunctionTable {
    name: String,
    args: Vec<Expr>,
    ordinality: bool,
    alias: Option<String>,
    columns: Vec<String>,
}

impl FunctionTable {
    pub fn new<I, A>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: IntoExpr,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(IntoExpr::into_expr).collect(),
            ordinality: false,
            alias: None,
            columns: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Column names for the alias list.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// `WITH ORDINALITY AS alias (columns...)`; `columns` ends with the
    /// ordinality column. PostgreSQL only.
    pub fn with_ordinality<I, S>(self, alias: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = self.alias(alias).columns(columns);
        table.ordinality = true;
        table
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        if self.ordinality {
            ctx.dialect()
                .require(DialectKind::Postgres, "WITH ORDINALITY")?;
        }
        let mut sql = format!("{}({})", self.name, build_list(&self.args, ctx)?);
        if self.ordinality {
            sql.push_str(" WITH ORDINALITY");
        }
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
            if !self.columns.is_empty() {
                sql.push_str(" (");
                sql.push_str(&self.columns.join(", "));
                sql.push(')');
            }
        }
        Ok(sql)
    }
}

/// Conversion into a table source.
///
/// Strings name a table; queries become derived tables with generated aliases.
pub trait IntoTable {
    fn into_table(self) -> TableExpr;
}

impl IntoTable for TableExpr {
    fn into_table(self) -> TableExpr {
        self
    }
}

impl IntoTable for &str {
    fn into_table(self) -> TableExpr {
        table(self)
    }
}

impl IntoTable for String {
    fn into_table(self) -> TableExpr {
        table(self)
    }
}

impl IntoTable for FunctionTable {
    fn into_table(self) -> TableExpr {
        TableExpr::Function(self)
    }
}

impl IntoTable for Query {
    fn into_table(self) -> TableExpr {
        TableExpr::Derived {
            query: Arc::new(self),
            alias: None,
        }
    }
}

impl IntoTable for Arc<Query> {
    fn into_table(self) -> TableExpr {
        TableExpr::Derived {
            query: self,
            alias: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::error::QueryError;
    use crate::expr::col;

    fn render_table(t: &TableExpr, dialect: &Dialect) -> QueryResult<String> {
        let mut ctx = BuildContext::new(dialect);
        t.build(&mut ctx)
    }

    #[test]
    fn named_with_alias() {
        let t = table_alias("job.search", "s");
        assert_eq!(render_table(&t, &Dialect::MySql).unwrap(), "job.search AS s");
    }

    #[test]
    fn function_table_with_ordinality() {
        let t = FunctionTable::new("unnest", [col("u.tags")])
            .with_ordinality("tags", ["tag_value", "ord"])
            .into_table();
        assert_eq!(
            render_table(&t, &Dialect::Postgres).unwrap(),
            "unnest(u.tags) WITH ORDINALITY AS tags (tag_value, ord)"
        );
    }

    #[test]
    fn ordinality_requires_postgres() {
        let t = FunctionTable::new("unnest", [col("u.tags")])
            .with_ordinality("tags", ["tag_value", "ord"])
            .into_table();
        assert_eq!(
            render_table(&t, &Dialect::MySql),
            Err(QueryError::UnsupportedDialect {
                feature: "WITH ORDINALITY",
                dialect: "mysql"
            })
        );
    }

    #[test]
    fn plain_function_table_binds_arguments() {
        let dialect = Dialect::Postgres;
        let mut ctx = BuildContext::new(&dialect);
        let t = FunctionTable::new("generate_series", [1, 10]).alias("g");
        let sql = TableExpr::Function(t).build(&mut ctx).unwrap();
        assert_eq!(sql, "generate_series($1, $2) AS g");
        assert_eq!(ctx.args_len(), 2);
    }
}
