use super::types::{BuildResult, RenderContext};
use super::{BuildHook, HookResult};
use crate::query::StatementKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A hook that tracks build statistics.
#[derive(Debug, Default)]
pub struct StatsHook {
    total_builds: AtomicU64,
    total_args: AtomicU64,
    total_render_nanos: AtomicU64,
    max_render_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    raw_count: AtomicU64,
}

/// Collected build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Total number of successful builds.
    pub total_builds: u64,
    /// Total arguments bound across all builds.
    pub total_args: u64,
    /// Total render time.
    pub total_render_duration: Duration,
    /// Slowest render.
    pub max_render_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub raw_count: u64,
}

impl StatsHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> BuildStats {
        BuildStats {
            total_builds: self.total_builds.load(Ordering::Relaxed),
            total_args: self.total_args.load(Ordering::Relaxed),
            total_render_duration: Duration::from_nanos(
                self.total_render_nanos.load(Ordering::Relaxed),
            ),
            max_render_duration: Duration::from_nanos(
                self.max_render_nanos.load(Ordering::Relaxed),
            ),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            raw_count: self.raw_count.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_builds,
            &self.total_args,
            &self.total_render_nanos,
            &self.max_render_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.raw_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn kind_counter(&self, kind: StatementKind) -> &AtomicU64 {
        match kind {
            StatementKind::Select => &self.select_count,
            StatementKind::Insert => &self.insert_count,
            StatementKind::Update => &self.update_count,
            StatementKind::Delete => &self.delete_count,
            StatementKind::Raw => &self.raw_count,
        }
    }
}

impl BuildHook for StatsHook {
    fn after_build(&self, _ctx: &RenderContext, result: &BuildResult<'_>) -> HookResult {
        let report = result.report;
        let nanos = u64::try_from(report.render_duration.as_nanos()).unwrap_or(u64::MAX);
        let args = u64::try_from(report.args_count).unwrap_or(u64::MAX);

        self.total_builds.fetch_add(1, Ordering::Relaxed);
        self.total_args.fetch_add(args, Ordering::Relaxed);
        let prev = self.total_render_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_render_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        if let Some(kind) = report.statement {
            self.kind_counter(kind).fetch_add(1, Ordering::Relaxed);
        }

        let mut current = self.max_render_nanos.load(Ordering::Relaxed);
        while nanos > current {
            match self.max_render_nanos.compare_exchange_weak(
                current,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }
}
