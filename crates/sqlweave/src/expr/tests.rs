use super::*;
use crate::config;
use crate::dialect::Dialect;
use crate::query::Query;
use crate::render::BuildContext;

fn render(expr: &Expr, dialect: &Dialect) -> (String, Vec<Value>) {
    let mut ctx = BuildContext::new(dialect);
    let sql = expr.build(&mut ctx).unwrap();
    (sql, ctx.into_args())
}

fn sql(expr: &Expr) -> String {
    render(expr, &Dialect::MySql).0
}

// ==================== Comparisons ====================

#[test]
fn test_comparisons() {
    assert_eq!(sql(&col("age").gt(18)), "age > ?");
    assert_eq!(sql(&col("age").gte(18)), "age >= ?");
    assert_eq!(sql(&col("age").lt(65)), "age < ?");
    assert_eq!(sql(&col("age").lte(65)), "age <= ?");
    assert_eq!(sql(&col("status").ne("banned")), "status <> ?");
    assert_eq!(sql(&col("name").like("al%")), "name LIKE ?");
}

#[test]
fn test_column_to_column_comparison_binds_nothing() {
    let (text, args) = render(&col("u.id").eq(col("p.user_id")), &Dialect::Postgres);
    assert_eq!(text, "u.id = p.user_id");
    assert!(args.is_empty());
}

#[test]
fn test_value_binds_one_argument() {
    let (text, args) = render(&col("id").eq(42), &Dialect::Postgres);
    assert_eq!(text, "id = $1");
    assert_eq!(args, vec![Value::Int(42)]);
}

#[test]
fn test_null_value_still_binds() {
    let (text, args) = render(&col("deleted_at").eq(None::<i64>), &Dialect::MySql);
    assert_eq!(text, "deleted_at = ?");
    assert_eq!(args, vec![Value::Null]);
}

#[test]
fn test_null_checks() {
    assert_eq!(sql(&col("deleted_at").is_null()), "deleted_at IS NULL");
    assert_eq!(sql(&col("email").is_not_null()), "email IS NOT NULL");
}

#[test]
fn test_column_alias() {
    assert_eq!(sql(&col_alias("u.email", "contact")), "u.email AS contact");
}

// ==================== IN / BETWEEN ====================

#[test]
fn test_in_list() {
    let expr = col("id").in_list([1, 2, 3]).unwrap();
    let (text, args) = render(&expr, &Dialect::Postgres);
    assert_eq!(text, "id IN ($1, $2, $3)");
    assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_not_in_list() {
    let expr = col("id").not_in([1, 2, 3]).unwrap();
    assert_eq!(sql(&expr), "id NOT IN (?, ?, ?)");
}

#[test]
fn test_empty_in_list_is_rejected() {
    let err = col("id").in_list(Vec::<i64>::new()).unwrap_err();
    assert_eq!(err, QueryError::EmptyInList);

    let hand_built = Expr::InList {
        left: Box::new(col("id")),
        list: Vec::new(),
        negated: false,
    };
    assert_eq!(
        hand_built.to_sql(&Dialect::MySql).unwrap_err(),
        QueryError::EmptyInList
    );
}

#[test]
fn test_single_subquery_operand_becomes_in_subquery() {
    let sub = Query::new().select(["doc_id"]).from("urgent_docs");
    let expr = col("doc_id").in_list([sub]).unwrap();
    assert!(matches!(expr, Expr::InSubquery { negated: false, .. }));
    assert_eq!(sql(&expr), "doc_id IN (SELECT doc_id FROM urgent_docs)");
}

#[test]
fn test_not_in_subquery() {
    let sub = Query::new().select(["user_id"]).from("logs");
    assert_eq!(
        sql(&col("id").not_in_subquery(sub)),
        "id NOT IN (SELECT user_id FROM logs)"
    );
}

#[test]
fn test_between() {
    let (text, args) = render(&col("age").between(18, 65), &Dialect::Postgres);
    assert_eq!(text, "age BETWEEN $1 AND $2");
    assert_eq!(args, vec![Value::Int(18), Value::Int(65)]);
    assert_eq!(
        sql(&col("status").not_between(1, 3)),
        "status NOT BETWEEN ? AND ?"
    );
}

// ==================== Compound predicates ====================

#[test]
fn test_and_or_nesting() {
    let expr = Expr::or([
        Expr::and([col("a").eq(1), col("b").eq(2)]),
        col("c").eq(3),
    ]);
    let (text, args) = render(&expr, &Dialect::Postgres);
    assert_eq!(text, "((a = $1 AND b = $2) OR c = $3)");
    assert_eq!(args.len(), 3);
}

#[test]
fn test_empty_compound_renders_empty() {
    assert_eq!(sql(&Expr::and([])), "");
    assert_eq!(sql(&Expr::or([])), "");
    assert_eq!(sql(&Expr::and([Expr::or([]), Expr::and([])])), "");
}

#[test]
fn test_compound_drops_empty_children() {
    let expr = Expr::and([Expr::or([]), col("a").eq(1)]);
    assert_eq!(sql(&expr), "(a = ?)");
}

#[test]
fn test_not() {
    let expr = Expr::not(Expr::or([col("a").eq(1), col("b").eq(2)]));
    assert_eq!(sql(&expr), "NOT ((a = ? OR b = ?))");
    assert_eq!(sql(&Expr::not(Expr::and([]))), "");
}

// ==================== Raw / template ====================

#[test]
fn test_raw_args_are_not_renumbered() {
    let expr = Expr::and([
        col("a").eq(1),
        Expr::raw_with("b = $9", vec![Value::Int(2)]),
        col("c").eq(3),
    ]);
    let (text, args) = render(&expr, &Dialect::Postgres);
    assert_eq!(text, "(a = $1 AND b = $9 AND c = $3)");
    assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_template_renumbers() {
    let expr = Expr::and([
        col("tenant_id").eq(10),
        Expr::template(
            "created_at > ? AND created_at < ?",
            vec![Value::Int(1), Value::Int(2)],
        ),
    ]);
    let (text, args) = render(&expr, &Dialect::Postgres);
    assert_eq!(text, "(tenant_id = $1 AND created_at > $2 AND created_at < $3)");
    assert_eq!(args.len(), 3);
}

#[test]
fn test_template_extra_marker_stays_literal() {
    let expr = Expr::template("data ? 'key' AND id = ?", vec![Value::Int(5)]);
    let (text, args) = render(&expr, &Dialect::Postgres);
    assert_eq!(text, "data $1 'key' AND id = ?");
    assert_eq!(args, vec![Value::Int(5)]);
}

// ==================== Functions / windows ====================

#[test]
fn test_function_call() {
    assert_eq!(sql(&func("COALESCE", [col("nickname"), col("name")])), "COALESCE(nickname, name)");
    assert_eq!(sql(&func("now", Vec::<Expr>::new())), "now()");
    let (text, args) = render(&func("LOWER", ["Alice"]), &Dialect::Postgres);
    assert_eq!(text, "LOWER($1)");
    assert_eq!(args, vec![Value::from("Alice")]);
}

#[test]
fn test_window_function() {
    let window = WindowSpec::new()
        .partition_by(["department_id"])
        .order_by([col("salary").desc()])
        .rows_between(FrameBound::UnboundedPreceding, FrameBound::CurrentRow);
    let expr = func("row_number", Vec::<Expr>::new()).over(window);
    assert_eq!(
        sql(&expr),
        "row_number() OVER (PARTITION BY department_id ORDER BY salary DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
    );
}

#[test]
fn test_window_range_frame_and_empty_spec() {
    let window = WindowSpec::new()
        .order_by(["day"])
        .range_between(FrameBound::Preceding(7), FrameBound::Following(1));
    assert_eq!(
        sql(&func("avg", [col("amount")]).over(window)),
        "avg(amount) OVER (ORDER BY day RANGE BETWEEN 7 PRECEDING AND 1 FOLLOWING)"
    );
    assert_eq!(
        sql(&func("count", [raw("*")]).over(WindowSpec::new())),
        "count(*) OVER ()"
    );
}

// ==================== Grouping ====================

#[test]
fn test_grouping_constructs() {
    let sets = grouping_sets([group_set(["region"]), group_set(["channel"]), grand_total()]).unwrap();
    assert_eq!(sql(&sets), "GROUPING SETS ((region), (channel), ())");
    assert_eq!(sql(&rollup(["region", "channel"]).unwrap()), "ROLLUP (region, channel)");
    assert_eq!(sql(&cube(["category", "region"]).unwrap()), "CUBE (category, region)");
}

#[test]
fn test_empty_grouping_is_rejected() {
    assert_eq!(
        rollup(Vec::<&str>::new()).unwrap_err(),
        QueryError::EmptyGrouping("ROLLUP")
    );
    assert_eq!(
        cube(Vec::<&str>::new()).unwrap_err(),
        QueryError::EmptyGrouping("CUBE")
    );
    assert_eq!(
        grouping_sets(Vec::new()).unwrap_err(),
        QueryError::EmptyGrouping("GROUPING SETS")
    );
}

// ==================== Full-text search ====================

#[test]
fn test_match_against_modes() {
    let search = match_columns(["title", "body"]);
    let (text, args) = render(&search.against("rust"), &Dialect::MySql);
    assert_eq!(text, "MATCH(title, body) AGAINST (?)");
    assert_eq!(args, vec![Value::from("rust")]);

    let boolean = search.clone().mode(MatchMode::Boolean);
    assert_eq!(
        sql(&boolean.score("+rust -go")),
        "MATCH(title, body) AGAINST (? IN BOOLEAN MODE)"
    );
    assert_eq!(
        sql(&search.mode(MatchMode::QueryExpansion).against("db")),
        "MATCH(title, body) AGAINST (? WITH QUERY EXPANSION)"
    );
}

#[test]
fn test_match_against_rejects_other_dialects() {
    let expr = match_columns(["title"]).against("rust");
    assert_eq!(
        expr.to_sql(&Dialect::Postgres).unwrap_err(),
        QueryError::UnsupportedDialect {
            feature: "MATCH ... AGAINST",
            dialect: "postgres"
        }
    );
}

#[test]
fn test_tsvector_queries() {
    let vector = ts_vector(["title"]).config("simple");
    let (text, args) = render(&vector.plain_query("rust"), &Dialect::Postgres);
    assert_eq!(text, "to_tsvector('simple', title) @@ plainto_tsquery('simple', $1)");
    assert_eq!(args, vec![Value::from("rust")]);

    assert_eq!(
        render(&vector.phrase_query("fast db"), &Dialect::Postgres).0,
        "to_tsvector('simple', title) @@ phraseto_tsquery('simple', $1)"
    );
    assert_eq!(
        render(&ts_vector(Vec::<&str>::new()).config("simple").web_search("x"), &Dialect::Postgres).0,
        "to_tsvector('simple', '') @@ websearch_to_tsquery('simple', $1)"
    );
}

#[test]
fn test_tsvector_config_is_escaped() {
    let vector = ts_vector(["title"]).language("portuguese'safe");
    assert_eq!(
        render(&vector.plain_query("x"), &Dialect::Postgres).0,
        "to_tsvector('portuguese''safe', title) @@ plainto_tsquery('portuguese''safe', $1)"
    );
}

#[test]
fn test_ts_rank_normalization() {
    let vector = ts_vector(["title", "body"]).config("english");
    assert_eq!(
        render(&vector.rank(TsQueryMode::WebSearch, "x", Some(16)), &Dialect::Postgres).0,
        "ts_rank(to_tsvector('english', CONCAT_WS(' ', title, body)), websearch_to_tsquery('english', $1), 16)"
    );
}

#[test]
fn test_tsvector_rejects_custom_dialect() {
    #[derive(Debug)]
    struct Named;
    impl crate::dialect::CustomDialect for Named {
        fn placeholder(&self, index: usize) -> String {
            format!(":p{index}")
        }
        fn name(&self) -> &str {
            "named"
        }
    }
    let expr = ts_vector(["title"]).config("simple").plain_query("x");
    assert_eq!(
        expr.to_sql(&Dialect::custom(Named)).unwrap_err(),
        QueryError::UnrecognizedDialect {
            feature: "Full Text Search (tsvector)"
        }
    );
}

#[test]
fn test_ts_vector_snapshots_default_config_at_creation() {
    // Only this test touches the global text-search config within the unit tests.
    let vector = ts_vector(["title"]);
    let previous = config::set_default_text_search_config("french");
    let text = render(&vector.plain_query("x"), &Dialect::Postgres).0;
    config::set_default_text_search_config(previous.clone());
    assert!(text.starts_with(&format!("to_tsvector('{previous}', title)")));
}

// ==================== JSON ====================

#[test]
fn test_json_shapes() {
    let extract = json_extract("metadata", "$.author");
    let text = json_extract_text("metadata", "$.title");
    let contains = json_contains("metadata", r#"{"tag":"rust"}"#);

    assert_eq!(sql(&extract), "JSON_EXTRACT(metadata, ?)");
    assert_eq!(sql(&text), "JSON_UNQUOTE(JSON_EXTRACT(metadata, ?))");
    assert_eq!(sql(&contains), "JSON_CONTAINS(metadata, ?)");

    let pg = |e: &Expr| render(e, &Dialect::Postgres).0;
    assert_eq!(
        pg(&extract),
        "jsonb_path_query_first(to_jsonb(metadata), ($1)::text::jsonpath)"
    );
    assert_eq!(
        pg(&text),
        "(jsonb_path_query_first(to_jsonb(metadata), ($1)::text::jsonpath) #>> '{}')"
    );
    assert_eq!(pg(&contains), "to_jsonb(metadata) @> ($1)::text::jsonb");
}

#[test]
fn test_json_on_sqlite_is_unsupported() {
    let err = json_contains("metadata", "{}")
        .to_sql(&Dialect::Sqlite)
        .unwrap_err();
    assert!(err.is_dialect_error());
    assert_eq!(
        err,
        QueryError::UnsupportedDialect {
            feature: "JSON_CONTAINS",
            dialect: "sqlite"
        }
    );
}

// ==================== Keyset ====================

#[test]
fn test_keyset_after_mixed_directions() {
    let orderings = [raw("id DESC"), raw("created_at ASC")];
    let expr = keyset_after(&orderings, vec![Value::Int(100), Value::from("2024-01-01")]).unwrap();
    let (text, args) = render(&expr, &Dialect::MySql);
    assert_eq!(text, "((id < ?) OR (id = ? AND created_at > ?))");
    assert_eq!(
        args,
        vec![Value::Int(100), Value::Int(100), Value::from("2024-01-01")]
    );
}

#[test]
fn test_keyset_before_with_typed_ordering() {
    let orderings = [col("score").desc(), col("id").asc()];
    let expr = keyset_before(&orderings, vec![Value::Float(95.5), Value::Int(50)]).unwrap();
    assert_eq!(sql(&expr), "((score > ?) OR (score = ? AND id < ?))");
}

#[test]
fn test_keyset_errors() {
    assert_eq!(
        keyset_after(&[], vec![]).unwrap_err(),
        QueryError::KeysetEmptyOrdering
    );
    assert_eq!(
        keyset_after(&[col("id")], vec![Value::Int(1), Value::Int(2)]).unwrap_err(),
        QueryError::KeysetArity {
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn test_split_ordering_defaults_to_ascending() {
    let (base, order) = keyset::split_ordering(&raw("lower(name)"));
    assert_eq!(order, SortOrder::Asc);
    assert_eq!(sql(&base), "lower(name)");

    let (base, order) = keyset::split_ordering(&raw("created_at desc"));
    assert_eq!(order, SortOrder::Desc);
    assert_eq!(sql(&base), "created_at");
}
