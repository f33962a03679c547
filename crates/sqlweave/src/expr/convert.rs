use super::Expr;
use crate::query::Query;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Conversion into an operand expression.
///
/// Expressions embed as-is, queries become subqueries, and plain Rust values
/// become bound literals.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Query {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Arc::new(self))
    }
}

impl IntoExpr for Arc<Query> {
    fn into_expr(self) -> Expr {
        Expr::Subquery(self)
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}

macro_rules! impl_into_expr_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoExpr for $t {
                fn into_expr(self) -> Expr {
                    Expr::Value(Value::from(self))
                }
            }
        )*
    };
}

impl_into_expr_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    Vec<u8>,
    serde_json::Value,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<Utc>,
    Uuid,
);

/// Conversion for SQL-list positions (SELECT, GROUP BY, ORDER BY, RETURNING).
///
/// Strings are taken as verbatim SQL (`"created_at DESC"`, `"COUNT(*)"`);
/// everything else follows [`IntoExpr`].
pub trait IntoSqlExpr {
    fn into_sql_expr(self) -> Expr;
}

impl IntoSqlExpr for &str {
    fn into_sql_expr(self) -> Expr {
        Expr::raw(self)
    }
}

impl IntoSqlExpr for String {
    fn into_sql_expr(self) -> Expr {
        Expr::raw(self)
    }
}

impl IntoSqlExpr for &String {
    fn into_sql_expr(self) -> Expr {
        Expr::raw(self.as_str())
    }
}

impl IntoSqlExpr for Expr {
    fn into_sql_expr(self) -> Expr {
        self
    }
}

impl IntoSqlExpr for Query {
    fn into_sql_expr(self) -> Expr {
        self.into_expr()
    }
}

impl IntoSqlExpr for Arc<Query> {
    fn into_sql_expr(self) -> Expr {
        self.into_expr()
    }
}
