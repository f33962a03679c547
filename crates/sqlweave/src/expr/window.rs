use super::{Expr, IntoSqlExpr, build_list};
use crate::error::QueryResult;
use crate::render::BuildContext;

/// Frame unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Rows,
    Range,
}

/// One end of a window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    fn to_sql(self) -> String {
        match self {
            FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
            FrameBound::Preceding(n) => format!("{n} PRECEDING"),
            FrameBound::CurrentRow => "CURRENT ROW".to_string(),
            FrameBound::Following(n) => format!("{n} FOLLOWING"),
            FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
        }
    }
}

/// `ROWS|RANGE BETWEEN start AND end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    pub mode: FrameMode,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl WindowFrame {
    fn to_sql(self) -> String {
        let mode = match self.mode {
            FrameMode::Rows => "ROWS",
            FrameMode::Range => "RANGE",
        };
        format!(
            "{mode} BETWEEN {} AND {}",
            self.start.to_sql(),
            self.end.to_sql()
        )
    }
}

/// Window specification for `OVER (...)`.
///
/// # Example
/// ```
/// use sqlweave::{FrameBound, WindowSpec, col};
///
/// let spec = WindowSpec::new()
///     .partition_by([col("department_id")])
///     .order_by([col("salary").desc()])
///     .rows_between(FrameBound::UnboundedPreceding, FrameBound::CurrentRow);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowSpec {
    partition_by: Vec<Expr>,
    order_by: Vec<Expr>,
    frame: Option<WindowFrame>,
}

impl WindowSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        self.partition_by
            .extend(exprs.into_iter().map(IntoSqlExpr::into_sql_expr));
        self
    }

    pub fn order_by<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        self.order_by
            .extend(exprs.into_iter().map(IntoSqlExpr::into_sql_expr));
        self
    }

    pub fn rows_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameMode::Rows, start, end)
    }

    pub fn range_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameMode::Range, start, end)
    }

    fn frame(mut self, mode: FrameMode, start: FrameBound, end: FrameBound) -> Self {
        self.frame = Some(WindowFrame { mode, start, end });
        self
    }

    pub(crate) fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        let mut clauses = Vec::with_capacity(3);
        if !self.partition_by.is_empty() {
            clauses.push(format!("PARTITION BY {}", build_list(&self.partition_by, ctx)?));
        }
        if !self.order_by.is_empty() {
            clauses.push(format!("ORDER BY {}", build_list(&self.order_by, ctx)?));
        }
        if let Some(frame) = self.frame {
            clauses.push(frame.to_sql());
        }
        Ok(clauses.join(" "))
    }
}
