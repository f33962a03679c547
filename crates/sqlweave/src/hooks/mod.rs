//! Build lifecycle hooks.
//!
//! Hooks observe builds; they cannot change the SQL or fail a build. Each
//! [`Query::build`](crate::Query::build) runs the global hooks first and then
//! the query's own hooks, in registration order, once before rendering and
//! once after a successful render. A hook returning `Err` is logged and
//! otherwise ignored.

mod stats;
#[cfg(feature = "tracing")]
mod tracing_hook;
mod types;

#[cfg(test)]
mod tests;

pub use stats::{BuildStats, StatsHook};
#[cfg(feature = "tracing")]
pub use tracing_hook::TracingBuildHook;
pub use types::{BuildReport, BuildResult, CancelToken, RenderContext};

use crate::query::Query;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

/// Hook outcome; errors are reported, never propagated.
pub type HookResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Trait for observing the build lifecycle.
pub trait BuildHook: Send + Sync {
    /// Called before rendering, after the cancellation check.
    fn before_build(&self, ctx: &RenderContext, query: &Query) -> HookResult {
        let _ = (ctx, query);
        Ok(())
    }

    /// Called after a successful render with the final SQL and arguments.
    fn after_build(&self, ctx: &RenderContext, result: &BuildResult<'_>) -> HookResult {
        let _ = (ctx, result);
        Ok(())
    }
}

type BeforeFn = dyn Fn(&RenderContext, &Query) -> HookResult + Send + Sync;
type AfterFn = dyn Fn(&RenderContext, &BuildResult<'_>) -> HookResult + Send + Sync;

/// [`BuildHook`] from closures; unset phases do nothing.
#[derive(Default)]
pub struct BuildHookFns {
    before: Option<Box<BeforeFn>>,
    after: Option<Box<AfterFn>>,
}

impl BuildHookFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&RenderContext, &Query) -> HookResult + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&RenderContext, &BuildResult<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for BuildHookFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildHookFns")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl BuildHook for BuildHookFns {
    fn before_build(&self, ctx: &RenderContext, query: &Query) -> HookResult {
        match &self.before {
            Some(f) => f(ctx, query),
            None => Ok(()),
        }
    }

    fn after_build(&self, ctx: &RenderContext, result: &BuildResult<'_>) -> HookResult {
        match &self.after {
            Some(f) => f(ctx, result),
            None => Ok(()),
        }
    }
}

/// Hooks attached to a single query.
#[derive(Clone, Default)]
pub(crate) struct HookList(Vec<Arc<dyn BuildHook>>);

impl HookList {
    pub(crate) fn push(&mut self, hook: Arc<dyn BuildHook>) {
        self.0.push(hook);
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Arc<dyn BuildHook>> {
        self.0.iter()
    }
}

impl fmt::Debug for HookList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookList({})", self.0.len())
    }
}

static GLOBAL_HOOKS: LazyLock<RwLock<Arc<Vec<Arc<dyn BuildHook>>>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Vec::new())));

/// Snapshot of the process-wide hooks.
pub fn global_build_hooks() -> Arc<Vec<Arc<dyn BuildHook>>> {
    Arc::clone(&GLOBAL_HOOKS.read().unwrap_or_else(|e| e.into_inner()))
}

/// Append a process-wide hook.
pub fn register_build_hooks(hook: impl BuildHook + 'static) {
    let mut guard = GLOBAL_HOOKS.write().unwrap_or_else(|e| e.into_inner());
    let mut hooks = Vec::clone(&guard);
    hooks.push(Arc::new(hook));
    *guard = Arc::new(hooks);
}

/// Replace all process-wide hooks, returning the previous set.
pub fn set_global_build_hooks(hooks: Vec<Arc<dyn BuildHook>>) -> Vec<Arc<dyn BuildHook>> {
    let mut guard = GLOBAL_HOOKS.write().unwrap_or_else(|e| e.into_inner());
    let previous = std::mem::replace(&mut *guard, Arc::new(hooks));
    Arc::unwrap_or_clone(previous)
}

#[cfg(feature = "tracing")]
pub(crate) fn report_hook_error(phase: &'static str, err: &(dyn Error + Send + Sync)) {
    tracing::warn!(target: "sqlweave.hooks", phase, error = %err, "build hook failed");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn report_hook_error(phase: &'static str, err: &(dyn Error + Send + Sync)) {
    let _ = (phase, err);
}
