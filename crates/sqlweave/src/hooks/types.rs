use crate::dialect::DialectKind;
use crate::error::{QueryError, QueryResult};
use crate::query::StatementKind;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so one clone can be handed to the code that
/// decides to cancel while another travels with the [`RenderContext`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Caller-side context for one build: cancellation, deadline and telemetry fields.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Cancellation flag checked before rendering.
    pub cancel: Option<CancelToken>,
    /// Builds starting after this instant fail with `DeadlineExceeded`.
    pub deadline: Option<Instant>,
    /// Optional structured fields for observability (low-cardinality).
    pub fields: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Add a structured field (low-cardinality).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Fail if the caller already gave up on this build.
    pub fn check(&self) -> QueryResult<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(QueryError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(QueryError::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Summary of one successful build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Dialect name (`mysql`, `postgres`, `sqlite` or the custom name).
    pub dialect: String,
    /// Dialect kind, `None` for custom dialects.
    pub dialect_kind: Option<DialectKind>,
    pub statement: Option<StatementKind>,
    pub args_count: usize,
    /// Time spent rendering, excluding hooks.
    pub render_duration: Duration,
}

/// What after-build hooks observe.
#[derive(Debug, Clone, Copy)]
pub struct BuildResult<'a> {
    pub sql: &'a str,
    pub args: &'a [Value],
    pub report: &'a BuildReport,
}
