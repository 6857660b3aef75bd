//! AQL-to-SQL translation tests
//!
//! Exact generated-SQL assertions for the documented scenarios, plus the
//! pagination and junction boundary behaviors.

use aql::{optimize, parse_query, translate, TranslateError};

fn sql_for(input: &str) -> String {
    translate(&parse_query(input).unwrap()).unwrap()
}

fn optimized_sql_for(input: &str) -> String {
    translate(&optimize(parse_query(input).unwrap())).unwrap()
}

#[test]
fn test_empty_query() {
    assert_eq!(sql_for("(aql-query)"), "SELECT\n  FROM triple AS t0");
}

#[test]
fn test_single_select_with_node_join() {
    assert_eq!(
        sql_for("(aql-query (select \"x\" (property \"root\" subject)))"),
        "SELECT t0_s.str AS col0\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_s ON (t0.s=t0_s.id)"
    );
}

#[test]
fn test_multiple_selects_share_a_node_join() {
    assert_eq!(
        sql_for(
            "(aql-query (select \"a\" (property \"root\" subject)) \
             (select \"b\" (property \"root\" subject)))"
        ),
        "SELECT t0_s.str AS col0, t0_s.str AS col1\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_s ON (t0.s=t0_s.id)"
    );
}

#[test]
fn test_node_joins_emitted_in_column_order() {
    assert_eq!(
        sql_for(
            "(aql-query (select \"o\" (property \"root\" object)) \
             (select \"s\" (property \"root\" subject)))"
        ),
        "SELECT t0_o.str AS col0, t0_s.str AS col1\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_s ON (t0.s=t0_s.id)\n\
         \x20    INNER JOIN node AS t0_o ON (t0.o=t0_o.id)"
    );
}

#[test]
fn test_criterion_against_literal() {
    assert_eq!(
        sql_for(
            "(aql-query (criterion (comp-eq (property \"root\" predicate) \
             (literal \"rdf:type\"))))"
        ),
        "SELECT\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_p ON (t0.p=t0_p.id)\n\
         \x20WHERE (t0_p.str='rdf:type')"
    );
}

#[test]
fn test_inner_join_aliases() {
    let sql = sql_for(
        "(aql-query (join inner \"j\" (comp-eq (property \"j\" subject) (literal \"x\"))))",
    );
    assert_eq!(
        sql,
        "SELECT\n\
         \x20 FROM triple AS t0\n\
         \x20 INNER JOIN triple AS t1 ON ((t1_s.str='x'))\n\
         \x20    INNER JOIN node AS t1_s ON (t1.s=t1_s.id)"
    );
}

#[test]
fn test_left_join_marks_node_joins_optional() {
    let sql = sql_for(
        "(aql-query (join left \"j\" (comp-eq (property \"j\" object) (literal \"x\"))))",
    );
    assert_eq!(
        sql,
        "SELECT\n\
         \x20 FROM triple AS t0\n\
         \x20 LEFT  JOIN triple AS t1 ON ((t1_o.str='x'))\n\
         \x20    LEFT  JOIN node AS t1_o ON (t1.o=t1_o.id)"
    );
}

#[test]
fn test_optimizer_removes_node_joins_from_property_pairs() {
    let input =
        "(aql-query (join inner \"j\" (comp-eq (property \"root\" subject) \
         (property \"j\" subject))))";

    let optimized = optimized_sql_for(input);
    assert_eq!(
        optimized,
        "SELECT\n\
         \x20 FROM triple AS t0\n\
         \x20 INNER JOIN triple AS t1 ON ((t0.s=t1.s))"
    );
    assert!(!optimized.contains("JOIN node"));

    // Without the optimizer both sides go through the dictionary.
    let plain = sql_for(input);
    assert!(plain.contains("t0_s.str=t1_s.str"));
    assert!(plain.contains("INNER JOIN node AS t0_s"));
    assert!(plain.contains("INNER JOIN node AS t1_s"));
}

#[test]
fn test_concatenate_lowering() {
    let sql = sql_for(
        "(aql-query (select \"c\" (function \"concatenate\" (literal \"a\") (literal \"b\"))))",
    );
    assert_eq!(
        sql,
        "SELECT (('a') || ('b')) AS col0\n  FROM triple AS t0"
    );
}

#[test]
fn test_concatenate_empty_is_empty_string() {
    assert_eq!(
        sql_for("(aql-query (select \"c\" (function \"concatenate\")))"),
        "SELECT '' AS col0\n  FROM triple AS t0"
    );
}

#[test]
fn test_named_function_lowering() {
    assert_eq!(
        sql_for("(aql-query (select \"u\" (function \"to-upper\" (literal \"a\"))))"),
        "SELECT upper('a') AS col0\n  FROM triple AS t0"
    );
    assert_eq!(
        sql_for("(aql-query (select \"t\" (function \"type-of\" (literal \"a\"))))"),
        "SELECT typeof('a') AS col0\n  FROM triple AS t0"
    );
}

#[test]
fn test_nested_functions() {
    assert_eq!(
        sql_for(
            "(aql-query (select \"n\" (function \"length\" \
             (function \"to-lower\" (property \"root\" object)))))"
        ),
        "SELECT length(lower(t0_o.str)) AS col0\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_o ON (t0.o=t0_o.id)"
    );
}

#[test]
fn test_unknown_function_is_a_compile_error() {
    let query = parse_query("(aql-query (select \"x\" (function \"exotic\")))").unwrap();
    let err = translate(&query).unwrap_err();
    assert!(matches!(err, TranslateError::UnknownFunction(name) if name == "exotic"));
}

#[test]
fn test_literal_quote_escaping() {
    assert_eq!(
        sql_for("(aql-query (criterion (comp-eq (literal \"it's\") (literal \"x\"))))"),
        "SELECT\n  FROM triple AS t0\n WHERE ('it''s'='x')"
    );
}

#[test]
fn test_not_and_junctions() {
    assert_eq!(
        sql_for(
            "(aql-query (criterion (and (comp-eq (literal \"a\") (literal \"b\")) \
             (not (comp-ne (literal \"c\") (literal \"d\"))))))"
        ),
        "SELECT\n  FROM triple AS t0\n WHERE (('a'='b') AND NOT ('c'<>'d'))"
    );
    assert_eq!(
        sql_for(
            "(aql-query (criterion (or (comp-eq (literal \"a\") (literal \"b\")) \
             (comp-eq (literal \"c\") (literal \"d\")))))"
        ),
        "SELECT\n  FROM triple AS t0\n WHERE (('a'='b') OR ('c'='d'))"
    );
}

#[test]
fn test_empty_junctions() {
    assert_eq!(
        sql_for("(aql-query (criterion (and)))"),
        "SELECT\n  FROM triple AS t0\n WHERE (1=1)"
    );
    assert_eq!(
        sql_for("(aql-query (criterion (or)))"),
        "SELECT\n  FROM triple AS t0\n WHERE (0=1)"
    );
}

#[test]
fn test_sorts() {
    assert_eq!(
        sql_for(
            "(aql-query (sort ascending (property \"root\" subject)) \
             (sort descending (literal \"x\")))"
        ),
        "SELECT\n\
         \x20 FROM triple AS t0\n\
         \x20    INNER JOIN node AS t0_s ON (t0.s=t0_s.id)\n\
         ORDER BY t0_s.str ASC, 'x' DESC"
    );
}

#[test]
fn test_limit_forms() {
    assert_eq!(
        sql_for("(aql-query (result-max-rows 3))"),
        "SELECT\n  FROM triple AS t0\nLIMIT 3"
    );
    assert_eq!(
        sql_for("(aql-query (result-row-offset 2))"),
        format!("SELECT\n  FROM triple AS t0\nLIMIT 2, {}", i32::MAX)
    );
    assert_eq!(
        sql_for("(aql-query (result-row-offset 2) (result-max-rows 3))"),
        "SELECT\n  FROM triple AS t0\nLIMIT 2, 3"
    );
    assert_eq!(
        sql_for("(aql-query (result-max-rows 0))"),
        "SELECT\n  FROM triple AS t0\nLIMIT 0"
    );
}
