//! Global build hooks. Serialised on `LOCK`; each test restores the registry.

use sqlweave::{
    BuildHook, BuildHookFns, BuildResult, Dialect, HookResult, Query, RenderContext, StatsHook,
    col, global_build_hooks, register_build_hooks, set_global_build_hooks,
};
use std::sync::{Arc, Mutex};

static LOCK: Mutex<()> = Mutex::new(());

fn sample() -> Query {
    Query::new()
        .with_dialect(Dialect::MySql)
        .select(["id"])
        .from("users")
        .filter([col("id").eq(1)])
}

struct Tagged {
    tag: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl BuildHook for Tagged {
    fn before_build(&self, _ctx: &RenderContext, _query: &Query) -> HookResult {
        self.log.lock().unwrap().push(format!("before:{}", self.tag));
        Ok(())
    }

    fn after_build(&self, _ctx: &RenderContext, _result: &BuildResult<'_>) -> HookResult {
        self.log.lock().unwrap().push(format!("after:{}", self.tag));
        Ok(())
    }
}

#[test]
fn global_hooks_fire_before_query_hooks() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let log = Arc::new(Mutex::new(Vec::new()));
    let global: Arc<dyn BuildHook> = Arc::new(Tagged {
        tag: "global",
        log: log.clone(),
    });
    let previous = set_global_build_hooks(vec![global]);

    let result = sample()
        .with_hooks(Tagged {
            tag: "query",
            log: log.clone(),
        })
        .build();
    set_global_build_hooks(previous);

    assert!(result.is_ok());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "before:global".to_string(),
            "before:query".to_string(),
            "after:global".to_string(),
            "after:query".to_string(),
        ]
    );
}

#[test]
fn failing_global_hook_does_not_fail_build() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let previous = set_global_build_hooks(Vec::new());
    register_build_hooks(
        BuildHookFns::new()
            .before(|_, _| Err("global before failed".into()))
            .after(|_, _| Err("global after failed".into())),
    );

    let built = sample().build();
    set_global_build_hooks(previous);

    let built = built.unwrap();
    assert_eq!(built.sql, "SELECT id FROM users WHERE (id = ?)");
    assert_eq!(built.args.len(), 1);
}

#[test]
fn register_appends_and_set_replaces() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let previous = set_global_build_hooks(Vec::new());

    let stats = Arc::new(StatsHook::new());
    register_build_hooks(BuildHookFns::new());
    let mut hooks = global_build_hooks().to_vec();
    hooks.push(stats.clone());
    set_global_build_hooks(hooks);
    assert_eq!(global_build_hooks().len(), 2);

    sample().build().unwrap();
    sample().build().unwrap();
    let replaced = set_global_build_hooks(previous);

    assert_eq!(replaced.len(), 2);
    assert_eq!(stats.stats().total_builds, 2);
    assert_eq!(stats.stats().select_count, 2);
}

#[test]
fn render_skips_hooks() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let stats = Arc::new(StatsHook::new());
    let hook: Arc<dyn BuildHook> = stats.clone();
    let previous = set_global_build_hooks(vec![hook]);

    let q = sample();
    let rendered = sqlweave::render(&q, q.dialect());
    set_global_build_hooks(previous);

    assert!(rendered.is_ok());
    assert_eq!(stats.stats().total_builds, 0);
}
