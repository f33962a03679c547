//! WITH [RECURSIVE] blocks.

use super::{Query, STRUCTURED_KINDS};
use crate::error::QueryResult;
use crate::render::BuildContext;
use std::sync::Arc;

/// `name [(columns)] AS (query)`
#[derive(Clone, Debug)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Arc<Query>,
    pub recursive: bool,
}

impl Query {
    fn push_cte(mut self, cte: Cte) -> Self {
        let method = if cte.recursive { "with_recursive" } else { "with" };
        if self.allow(method, &STRUCTURED_KINDS) {
            self.ctes.push(cte);
        }
        self
    }

    /// `WITH name AS (query)`
    pub fn with(self, name: impl Into<String>, query: impl Into<Arc<Query>>) -> Self {
        self.push_cte(Cte {
            name: name.into(),
            columns: Vec::new(),
            query: query.into(),
            recursive: false,
        })
    }

    /// `WITH name (columns) AS (query)`
    pub fn with_columns<I, S>(
        self,
        name: impl Into<String>,
        columns: I,
        query: impl Into<Arc<Query>>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_cte(Cte {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            query: query.into(),
            recursive: false,
        })
    }

    /// Recursive CTE; the block is introduced by `WITH RECURSIVE` once.
    pub fn with_recursive(self, name: impl Into<String>, query: impl Into<Arc<Query>>) -> Self {
        self.push_cte(Cte {
            name: name.into(),
            columns: Vec::new(),
            query: query.into(),
            recursive: true,
        })
    }

    pub(super) fn write_ctes(
        &self,
        sql: &mut String,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<()> {
        if self.ctes.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::with_capacity(self.ctes.len());
        for cte in &self.ctes {
            let mut part = cte.name.clone();
            if !cte.columns.is_empty() {
                part.push_str(" (");
                part.push_str(&cte.columns.join(", "));
                part.push(')');
            }
            part.push_str(" AS (");
            part.push_str(&cte.query.write_sql(ctx)?);
            part.push(')');
            parts.push(part);
        }
        sql.push_str(if self.ctes.iter().any(|c| c.recursive) {
            "WITH RECURSIVE "
        } else {
            "WITH "
        });
        sql.push_str(&parts.join(", "));
        sql.push(' ');
        Ok(())
    }
}
