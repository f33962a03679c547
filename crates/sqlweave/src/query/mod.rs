//! Statement builder.
//!
//! A [`Query`] is a plain accumulator: every builder method consumes and
//! returns it, storing clause data for the statement kind chosen by the first
//! kind-establishing call (`select`, `insert_into`, `update`, `delete_from`,
//! or [`Query::raw`]). Calls that contradict the established kind do not
//! panic; the first misuse is recorded and returned by every later render.
//!
//! Rendering never touches the query itself. See [`render`](crate::render).

mod cte;
mod delete;
mod hints;
mod insert;
mod select;
mod update;


pub use cte::Cte;
pub use hints::OptimizerHint;
pub use insert::{AssignValue, Assignment, OnConflict, assign};
pub use select::{Join, JoinKind, LockStrength, LockWait, RowLock, SetOperator};

use crate::config::{self, ReturningMode};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, IntoSqlExpr, build_list};
use crate::hooks::{self, BuildHook, BuildReport, BuildResult, HookList, RenderContext};
use crate::render::{BuildContext, BuiltQuery, render};
use crate::table::TableExpr;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Statement kind, fixed by the first kind-establishing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

impl StatementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Raw => "RAW",
        }
    }
}

/// Every kind except [`StatementKind::Raw`], whose text is emitted verbatim.
pub(crate) const STRUCTURED_KINDS: [StatementKind; 4] = [
    StatementKind::Select,
    StatementKind::Insert,
    StatementKind::Update,
    StatementKind::Delete,
];

/// A composable SQL statement.
///
/// # Example
/// ```
/// use sqlweave::{Dialect, Query, col};
///
/// let built = Query::new()
///     .with_dialect(Dialect::Postgres)
///     .select(["id"])
///     .from("users")
///     .filter([col("status").eq("active"), col("age").gt(18)])
///     .order_by(["created_at DESC"])
///     .limit(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     built.sql,
///     "SELECT id FROM users WHERE (status = $1 AND age > $2) ORDER BY created_at DESC LIMIT 10"
/// );
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct Query {
    kind: Option<StatementKind>,
    dialect: Dialect,

    raw_sql: String,
    raw_args: Vec<Value>,

    ctes: Vec<Cte>,
    hints: Vec<OptimizerHint>,

    columns: Vec<Expr>,
    distinct: bool,
    from: Option<TableExpr>,
    joins: Vec<Join>,
    where_clause: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<Expr>,
    limit: Option<u64>,
    offset: Option<u64>,
    set_ops: Vec<(SetOperator, Arc<Query>)>,
    outer_order_by: Vec<Expr>,
    outer_limit: Option<u64>,
    outer_offset: Option<u64>,
    lock: Option<RowLock>,

    target: Option<TableExpr>,
    insert_columns: Vec<String>,
    rows: Vec<Vec<Expr>>,
    insert_source: Option<Arc<Query>>,
    insert_ignore: bool,
    conflict: Option<OnConflict>,
    assignments: Vec<Assignment>,

    returning: Vec<Expr>,
    returning_mode: ReturningMode,
    hooks: HookList,
    build_error: Option<QueryError>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// Empty query using the current default dialect.
    pub fn new() -> Self {
        Self::empty(config::default_dialect())
    }

    fn empty(dialect: Dialect) -> Self {
        Self {
            kind: None,
            dialect,
            raw_sql: String::new(),
            raw_args: Vec::new(),
            ctes: Vec::new(),
            hints: Vec::new(),
            columns: Vec::new(),
            distinct: false,
            from: None,
            joins: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_ops: Vec::new(),
            outer_order_by: Vec::new(),
            outer_limit: None,
            outer_offset: None,
            lock: None,
            target: None,
            insert_columns: Vec::new(),
            rows: Vec::new(),
            insert_source: None,
            insert_ignore: false,
            conflict: None,
            assignments: Vec::new(),
            returning: Vec::new(),
            returning_mode: ReturningMode::default(),
            hooks: HookList::default(),
            build_error: None,
        }
    }

    /// Verbatim statement. Rendered as-is with `args` appended unchanged.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        let mut q = Self::new();
        q.kind = Some(StatementKind::Raw);
        q.raw_sql = sql.into();
        q.raw_args = args;
        q
    }

    /// Override the dialect captured at creation.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    /// Configure RETURNING handling on the MySQL kind.
    pub fn returning_mode(mut self, mode: ReturningMode) -> Self {
        self.returning_mode = mode;
        self
    }

    /// Attach a per-query build hook. Fires after global hooks.
    pub fn with_hooks(mut self, hook: impl BuildHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Attach an `Arc`-shared build hook.
    pub fn with_hook_arc(mut self, hook: Arc<dyn BuildHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// The first recorded misuse, if any.
    pub fn validate(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record(&mut self, err: QueryError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// Fix the statement kind, or record a conflict with the established one.
    ///
    /// Clauses accepted before the kind was known are checked here, so a
    /// clause the new kind never renders is reported instead of dropped.
    fn establish(&mut self, kind: StatementKind, method: &'static str) -> bool {
        match self.kind {
            None => {
                self.kind = Some(kind);
                if let Some(err) = self.stray_clause(kind) {
                    self.record(err);
                }
                true
            }
            Some(current) if current == kind => true,
            Some(current) => {
                self.record(QueryError::statement_kind(method, current.as_str()));
                false
            }
        }
    }

    /// First clause recorded so far that `kind` does not render.
    fn stray_clause(&self, kind: StatementKind) -> Option<QueryError> {
        use StatementKind::{Delete, Insert, Select, Update};

        if kind == Select && !self.returning.is_empty() {
            return Some(QueryError::ReturningOnSelect);
        }
        let lock_method = self.lock.map(|lock| lock.strength.method());
        let clauses: [(bool, &'static str, &[StatementKind]); 11] = [
            (self.from.is_some(), "from", &[Select, Update]),
            (!self.joins.is_empty(), "join", &[Select, Update]),
            (self.where_clause.is_some(), "filter", &[Select, Update, Delete]),
            (!self.group_by.is_empty(), "group_by", &[Select]),
            (self.having.is_some(), "having", &[Select]),
            (!self.order_by.is_empty(), "order_by", &[Select]),
            (self.limit.is_some(), "limit", &[Select]),
            (self.offset.is_some(), "offset", &[Select]),
            (lock_method.is_some(), lock_method.unwrap_or("for_update"), &[Select]),
            (!self.assignments.is_empty(), "set", &[Update]),
            (!self.returning.is_empty(), "returning", &[Insert, Update, Delete]),
        ];
        clauses
            .into_iter()
            .find(|(present, _, allowed)| *present && !allowed.contains(&kind))
            .map(|(_, method, _)| QueryError::statement_kind(method, kind.as_str()))
    }

    /// Check `method` against the established kind; an unset kind passes.
    fn allow(&mut self, method: &'static str, allowed: &[StatementKind]) -> bool {
        match self.kind {
            Some(current) if !allowed.contains(&current) => {
                self.record(QueryError::statement_kind(method, current.as_str()));
                false
            }
            _ => true,
        }
    }

    /// AND the given predicates into WHERE.
    ///
    /// A single AND/OR group is stored as-is; anything else is wrapped in an
    /// AND group. Repeated calls AND onto what is already there.
    pub fn filter(mut self, predicates: impl IntoIterator<Item = Expr>) -> Self {
        if !self.allow(
            "filter",
            &[
                StatementKind::Select,
                StatementKind::Update,
                StatementKind::Delete,
            ],
        ) {
            return self;
        }
        self.where_clause = combine(self.where_clause.take(), predicates);
        self
    }

    /// AND one predicate into WHERE.
    pub fn and_where(self, predicate: Expr) -> Self {
        self.filter([predicate])
    }

    /// AND one predicate into WHERE when present.
    pub fn and_where_opt(self, predicate: Option<Expr>) -> Self {
        match predicate {
            Some(p) => self.and_where(p),
            None => self,
        }
    }

    /// RETURNING expressions for INSERT/UPDATE/DELETE.
    pub fn returning<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoSqlExpr,
    {
        if self.kind == Some(StatementKind::Select) {
            self.record(QueryError::ReturningOnSelect);
            return self;
        }
        if !self.allow(
            "returning",
            &[
                StatementKind::Insert,
                StatementKind::Update,
                StatementKind::Delete,
            ],
        ) {
            return self;
        }
        self.returning
            .extend(exprs.into_iter().map(IntoSqlExpr::into_sql_expr));
        self
    }

    /// Optimizer hints, injected after the leading verb.
    pub fn optimizer_hints(mut self, hints: impl IntoIterator<Item = OptimizerHint>) -> Self {
        if self.allow("optimizer_hints", &STRUCTURED_KINDS) {
            self.hints.extend(hints);
        }
        self
    }

    /// Render with the query's dialect, firing global then per-query hooks.
    pub fn build(&self) -> QueryResult<BuiltQuery> {
        self.build_with(&RenderContext::default())
    }

    /// Render under `ctx`: cancellation pre-check, hooks, then render.
    ///
    /// Hook errors are logged and ignored; they never change the outcome.
    pub fn build_with(&self, ctx: &RenderContext) -> QueryResult<BuiltQuery> {
        ctx.check()?;

        let global = hooks::global_build_hooks();
        let all: Vec<&Arc<dyn BuildHook>> = global.iter().chain(self.hooks.iter()).collect();

        for hook in &all {
            if let Err(err) = hook.before_build(ctx, self) {
                hooks::report_hook_error("before_build", err.as_ref());
            }
        }

        let started = Instant::now();
        let built = match render(self, &self.dialect) {
            Ok(built) => built,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(target: "sqlweave.build", error = %err, "build failed");
                return Err(err);
            }
        };
        let report = BuildReport {
            dialect: self.dialect.name().to_string(),
            dialect_kind: self.dialect.kind(),
            statement: self.kind,
            args_count: built.args.len(),
            render_duration: started.elapsed(),
        };

        let result = BuildResult {
            sql: &built.sql,
            args: &built.args,
            report: &report,
        };
        for hook in &all {
            if let Err(err) = hook.after_build(ctx, &result) {
                hooks::report_hook_error("after_build", err.as_ref());
            }
        }

        Ok(built)
    }

    /// SQL text only, with the query's dialect and no hooks.
    pub fn to_sql(&self) -> QueryResult<String> {
        render(self, &self.dialect).map(|built| built.sql)
    }

    /// Render into an existing context (used for nesting).
    pub(crate) fn write_sql(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        self.validate()?;
        let kind = self.kind.ok_or(QueryError::MissingStatement)?;
        if kind == StatementKind::Raw {
            ctx.extend_args(&self.raw_args);
            return Ok(self.raw_sql.clone());
        }

        let mut sql = String::new();
        self.write_ctes(&mut sql, ctx)?;
        match kind {
            StatementKind::Select => self.write_select(&mut sql, ctx)?,
            StatementKind::Insert => self.write_insert(&mut sql, ctx)?,
            StatementKind::Update => self.write_update(&mut sql, ctx)?,
            StatementKind::Delete => self.write_delete(&mut sql, ctx)?,
            StatementKind::Raw => {}
        }
        Ok(sql)
    }

    /// Write `verb` followed by the hints that apply to the active dialect.
    fn write_verb(&self, sql: &mut String, verb: &str, ctx: &BuildContext<'_>) {
        sql.push_str(verb);
        let active = ctx.dialect().kind();
        let hints: Vec<&str> = self
            .hints
            .iter()
            .filter(|h| h.applies_to(active))
            .map(OptimizerHint::text)
            .collect();
        if !hints.is_empty() {
            sql.push_str(" /*+ ");
            sql.push_str(&hints.join(" "));
            sql.push_str(" */");
        }
    }

    fn write_returning(&self, sql: &mut String, ctx: &mut BuildContext<'_>) -> QueryResult<()> {
        if self.returning.is_empty() {
            return Ok(());
        }
        if self.returning_mode == ReturningMode::Omit
            && ctx.dialect().kind() == Some(DialectKind::MySql)
        {
            return Ok(());
        }
        sql.push_str(" RETURNING ");
        sql.push_str(&build_list(&self.returning, ctx)?);
        Ok(())
    }
}

/// AND `predicates` onto `existing` following the WHERE/HAVING grouping rule.
fn combine(existing: Option<Expr>, predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    let mut incoming: Vec<Expr> = predicates.into_iter().collect();
    if incoming.is_empty() {
        return existing;
    }
    let group = if incoming.len() == 1 && incoming[0].is_compound() {
        incoming.remove(0)
    } else {
        Expr::And(incoming)
    };
    Some(match existing {
        Some(prev) => Expr::And(vec![prev, group]),
        None => group,
    })
}

/// ` KEYWORD <predicate>`, or nothing when the predicate is absent or empty.
fn write_predicate(
    sql: &mut String,
    keyword: &str,
    predicate: Option<&Expr>,
    ctx: &mut BuildContext<'_>,
) -> QueryResult<()> {
    let Some(predicate) = predicate else {
        return Ok(());
    };
    let clause = predicate.build(ctx)?;
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(keyword);
        sql.push(' ');
        sql.push_str(&clause);
    }
    Ok(())
}
