use super::*;
use crate::dialect::{Dialect, DialectKind};
use crate::error::QueryError;
use crate::expr::col;
use crate::query::StatementKind;
use crate::value::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

fn users_query() -> Query {
    Query::new()
        .with_dialect(Dialect::MySql)
        .select(["id"])
        .from("users")
        .filter([col("id").eq(7)])
}

#[derive(Default)]
struct Recorder {
    before: Mutex<Vec<String>>,
    after: Mutex<Vec<(String, Vec<Value>, BuildReport)>>,
}

impl BuildHook for Recorder {
    fn before_build(&self, _ctx: &RenderContext, query: &Query) -> HookResult {
        let kind = query.kind().map_or("-", StatementKind::as_str);
        self.before.lock().unwrap().push(kind.to_string());
        Ok(())
    }

    fn after_build(&self, _ctx: &RenderContext, result: &BuildResult<'_>) -> HookResult {
        self.after.lock().unwrap().push((
            result.sql.to_string(),
            result.args.to_vec(),
            result.report.clone(),
        ));
        Ok(())
    }
}

#[test]
fn test_per_query_hook_sees_sql_args_and_report() {
    let recorder = Arc::new(Recorder::default());
    let built = users_query()
        .with_hook_arc(recorder.clone())
        .build()
        .unwrap();

    assert_eq!(built.sql, "SELECT id FROM users WHERE (id = ?)");
    assert_eq!(*recorder.before.lock().unwrap(), vec!["SELECT".to_string()]);

    let after = recorder.after.lock().unwrap();
    assert_eq!(after.len(), 1);
    let (sql, args, report) = &after[0];
    assert_eq!(sql, &built.sql);
    assert_eq!(args, &built.args);
    assert_eq!(report.args_count, 1);
    assert_eq!(report.dialect, "mysql");
    assert_eq!(report.dialect_kind, Some(DialectKind::MySql));
    assert_eq!(report.statement, Some(StatementKind::Select));
}

#[test]
fn test_hook_errors_do_not_change_the_result() {
    let failing = BuildHookFns::new()
        .before(|_, _| Err("before failed".into()))
        .after(|_, _| Err("after failed".into()));
    let built = users_query().with_hooks(failing).build().unwrap();
    assert_eq!(built.sql, "SELECT id FROM users WHERE (id = ?)");
    assert_eq!(built.args, vec![Value::Int(7)]);
}

#[test]
fn test_after_hook_skipped_on_render_error() {
    let recorder = Arc::new(Recorder::default());
    let err = Query::new()
        .update("users")
        .with_hook_arc(recorder.clone())
        .build()
        .unwrap_err();
    assert_eq!(err, QueryError::UpdateWithoutSet);
    assert_eq!(recorder.before.lock().unwrap().len(), 1);
    assert!(recorder.after.lock().unwrap().is_empty());
}

#[test]
fn test_cancelled_context_skips_hooks() {
    let recorder = Arc::new(Recorder::default());
    let token = CancelToken::new();
    token.cancel();
    let ctx = RenderContext::new().with_cancel(token);

    let err = users_query()
        .with_hook_arc(recorder.clone())
        .build_with(&ctx)
        .unwrap_err();
    assert_eq!(err, QueryError::Cancelled);
    assert!(err.is_cancelled());
    assert!(recorder.before.lock().unwrap().is_empty());
}

#[test]
fn test_expired_deadline() {
    let past = Instant::now()
        .checked_sub(Duration::from_millis(5))
        .unwrap_or_else(Instant::now);
    let ctx = RenderContext::new().with_deadline(past);
    assert_eq!(
        users_query().build_with(&ctx).unwrap_err(),
        QueryError::DeadlineExceeded
    );

    let ctx = RenderContext::new().with_timeout(Duration::from_secs(60));
    assert!(users_query().build_with(&ctx).is_ok());
}

#[test]
fn test_context_fields_reach_hooks() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let hook = BuildHookFns::new().after(move |ctx, _| {
        *sink.lock().unwrap() = ctx.fields.get("route").cloned();
        Ok(())
    });
    let ctx = RenderContext::new().with_field("route", "GET /users");
    users_query().with_hooks(hook).build_with(&ctx).unwrap();
    assert_eq!(seen.lock().unwrap().as_deref(), Some("GET /users"));
}

#[test]
fn test_stats_hook_counts_builds() {
    let stats = Arc::new(StatsHook::new());
    users_query().with_hook_arc(stats.clone()).build().unwrap();
    Query::new()
        .with_dialect(Dialect::Postgres)
        .delete_from("sessions")
        .filter([col("id").eq(1), col("user_id").eq(2)])
        .with_hook_arc(stats.clone())
        .build()
        .unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_builds, 2);
    assert_eq!(snapshot.total_args, 3);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(snapshot.insert_count, 0);
    assert!(snapshot.max_render_duration <= snapshot.total_render_duration);

    stats.reset();
    assert_eq!(stats.stats(), BuildStats::default());
}

#[test]
fn test_build_report_serializes() {
    let report = BuildReport {
        dialect: "postgres".to_string(),
        dialect_kind: Some(DialectKind::Postgres),
        statement: Some(StatementKind::Insert),
        args_count: 2,
        render_duration: Duration::from_micros(3),
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["dialect_kind"], "postgres");
    assert_eq!(json["statement"], "Insert");
    assert_eq!(json["args_count"], 2);
}

#[cfg(feature = "tracing")]
#[test]
fn test_tracing_hook_truncates_on_char_boundary() {
    let hook = TracingBuildHook::new().max_sql_length(4);
    assert_eq!(hook.truncate_sql("SELECT 1"), "SELE...");
    assert_eq!(hook.truncate_sql("añb"), "añb");
    assert_eq!(hook.truncate_sql("ññññ"), "ññ...");
    assert_eq!(TracingBuildHook::new().no_truncate().truncate_sql("SELECT 1"), "SELECT 1");
}

#[cfg(feature = "tracing")]
#[test]
fn test_tracing_hook_never_fails_a_build() {
    let hook = TracingBuildHook::new()
        .level(tracing::Level::INFO)
        .without_sql();
    assert!(users_query().with_hooks(hook).build().is_ok());
}
