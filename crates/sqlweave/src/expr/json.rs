//! JSON extraction and containment with MySQL and PostgreSQL shapes.
//!
//! Paths and documents are always bound, never interpolated.

use super::{Expr, IntoExpr};
use crate::dialect::DialectKind;
use crate::error::{QueryError, QueryResult};
use crate::render::BuildContext;

const EXTRACT_FEATURE: &str = "JSON extraction";
const CONTAINS_FEATURE: &str = "JSON_CONTAINS";

/// Extract the value at `path` from a JSON column.
pub fn json_extract(column: impl Into<String>, path: impl IntoExpr) -> Expr {
    Expr::JsonExtract {
        column: column.into(),
        path: Box::new(path.into_expr()),
        unquote: false,
    }
}

/// Like [`json_extract`], unwrapped to text.
pub fn json_extract_text(column: impl Into<String>, path: impl IntoExpr) -> Expr {
    Expr::JsonExtract {
        column: column.into(),
        path: Box::new(path.into_expr()),
        unquote: true,
    }
}

/// Predicate: the JSON column contains `value`.
pub fn json_contains(column: impl Into<String>, value: impl IntoExpr) -> Expr {
    Expr::JsonContains {
        column: column.into(),
        value: Box::new(value.into_expr()),
    }
}

pub(super) fn build_extract(
    column: &str,
    path: &Expr,
    unquote: bool,
    ctx: &mut BuildContext<'_>,
) -> QueryResult<String> {
    let kind = ctx.dialect().recognized(EXTRACT_FEATURE)?;
    match kind {
        DialectKind::MySql => {
            let extract = format!("JSON_EXTRACT({column}, {})", path.build(ctx)?);
            Ok(if unquote {
                format!("JSON_UNQUOTE({extract})")
            } else {
                extract
            })
        }
        DialectKind::Postgres => {
            // Bind the path as text; the server parses it into jsonpath.
            let extract = format!(
                "jsonb_path_query_first(to_jsonb({column}), ({})::text::jsonpath)",
                path.build(ctx)?
            );
            Ok(if unquote {
                format!("({extract} #>> '{{}}')")
            } else {
                extract
            })
        }
        other => Err(QueryError::UnsupportedDialect {
            feature: EXTRACT_FEATURE,
            dialect: other.as_str(),
        }),
    }
}

pub(super) fn build_contains(
    column: &str,
    value: &Expr,
    ctx: &mut BuildContext<'_>,
) -> QueryResult<String> {
    let kind = ctx.dialect().recognized(CONTAINS_FEATURE)?;
    match kind {
        DialectKind::MySql => Ok(format!("JSON_CONTAINS({column}, {})", value.build(ctx)?)),
        DialectKind::Postgres => Ok(format!(
            "to_jsonb({column}) @> ({})::text::jsonb",
            value.build(ctx)?
        )),
        other => Err(QueryError::UnsupportedDialect {
            feature: CONTAINS_FEATURE,
            dialect: other.as_str(),
        }),
    }
}
