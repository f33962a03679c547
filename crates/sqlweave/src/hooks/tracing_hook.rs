use super::types::{BuildResult, RenderContext};
use super::{BuildHook, HookResult};
use tracing::Level;

/// A `tracing` hook emitting one event per successful build.
///
/// Events use target `sqlweave.build`. Enable via the crate feature
/// `tracing` (on by default).
#[derive(Debug, Clone)]
pub struct TracingBuildHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Whether the SQL text is attached to the event.
    pub include_sql: bool,
}

impl Default for TracingBuildHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            include_sql: true,
        }
    }
}

impl TracingBuildHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Log only the report fields.
    pub fn without_sql(mut self) -> Self {
        self.include_sql = false;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

fn truncate_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

impl BuildHook for TracingBuildHook {
    fn after_build(&self, ctx: &RenderContext, result: &BuildResult<'_>) -> HookResult {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let report = result.report;
        let statement = report.statement.map_or("-", |k| k.as_str());
        let fields = tracing::field::debug(&ctx.fields);
        if self.include_sql {
            let sql = self.truncate_sql(result.sql);
            emit_at_level!(
                self.level,
                target: "sqlweave.build",
                dialect = %report.dialect,
                statement,
                args_count = report.args_count,
                duration = ?report.render_duration,
                sql = %sql,
                fields = fields,
            );
        } else {
            emit_at_level!(
                self.level,
                target: "sqlweave.build",
                dialect = %report.dialect,
                statement,
                args_count = report.args_count,
                duration = ?report.render_duration,
                fields = fields,
            );
        }
        Ok(())
    }
}
