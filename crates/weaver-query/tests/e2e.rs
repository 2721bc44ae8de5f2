//! End-to-end tests for weaver-query using insta for snapshot testing.
//!
//! These tests drive the public API the way an embedding tool would:
//! compile a query, run it over parsed source, and rewrite the matches.

use std::sync::Arc;

use insta::assert_snapshot;
use rstest::{fixture, rstest};

use weaver_query::{
    Parser, Predicates, Query, QueryCursor, QueryErrorKind, SupportedLanguage, Transformation,
    transform,
};

const FIELD_ACCESS: &str = r#"(field_expression argument: (_) @arg "." field: (_) @field) @from"#;

/// Fixture providing a C++ parser.
#[fixture]
fn cpp_parser() -> Parser {
    Parser::new(SupportedLanguage::Cpp).unwrap_or_else(|err| panic!("parser: {err}"))
}

fn cpp_query(text: &str) -> Arc<Query> {
    Arc::new(
        Query::new(SupportedLanguage::Cpp, text).unwrap_or_else(|err| panic!("query: {err}")),
    )
}

/// Renders every accepted match as `pattern: name=text, ...` lines.
fn render_matches(parser: &mut Parser, query: &Query, source: &str) -> String {
    let tree = parser
        .parse(source)
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let mut cursor = QueryCursor::new();
    cursor.execute(query, tree.root_node(), Some(Predicates::new(tree.source())));

    cursor
        .map(|m| {
            let captures: Vec<_> = m
                .captures()
                .iter()
                .map(|capture| format!("{}={}", capture.name(), capture.node().text()))
                .collect();
            format!("{}: {}", m.pattern_index(), captures.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Happy Path: Transformation
// =============================================================================

#[rstest]
fn rewrites_every_field_access(cpp_parser: Parser) {
    let source = "\
int area(Rect rect) {
    return rect.width * rect.height;
}
";
    let result = transform(source, cpp_parser, cpp_query(FIELD_ACCESS), "@arg->@field")
        .unwrap_or_else(|err| panic!("transform: {err}"));

    assert_eq!(result.num_replacements(), 2);
    assert_snapshot!(result.output(), @r"
    int area(Rect rect) {
        return rect->width * rect->height;
    }
    ");
}

#[rstest]
fn rewrites_message_map_entries_only(cpp_parser: Parser) {
    let source = "\
void Dialog::wire() {
    BEGIN_MESSAGE_MAP(Dialog, Base);
    ON_BN_CLICKED(IDC_ADD, OnAdd);
    END_MESSAGE_MAP();
    connect(a, b);
}
";
    let query = cpp_query(
        "((call_expression
            function: (identifier) @macro
            arguments: (argument_list . (_) @id . (_) @handler .)) @from
          (#in_message_map? @from))",
    );
    let mut transformation =
        Transformation::new(source, cpp_parser, query, "@macro(@id, &Dialog::@handler)")
            .unwrap_or_else(|err| panic!("transformation: {err}"));
    let result = transformation
        .run()
        .unwrap_or_else(|err| panic!("run: {err}"));

    assert_snapshot!(result.output(), @r"
    void Dialog::wire() {
        BEGIN_MESSAGE_MAP(Dialog, Base);
        ON_BN_CLICKED(IDC_ADD, &Dialog::OnAdd);
        END_MESSAGE_MAP();
        connect(a, b);
    }
    ");
}

#[rstest]
fn file_scope_message_maps_are_recognised(mut cpp_parser: Parser) {
    let source = "\
BEGIN_MESSAGE_MAP(CDlg, CDialog)
    ON_BN_CLICKED(IDC_ADD, OnAdd)
    ON_BN_CLICKED(IDC_DEL, OnDel)
END_MESSAGE_MAP()

void f() { Foo(a, b); }
";
    let query = cpp_query(
        "((call_expression (argument_list . (_) . (_) .) @args) @call
          (#in_message_map? @call @args))",
    );

    assert_snapshot!(render_matches(&mut cpp_parser, &query, source), @r"
    0: call=ON_BN_CLICKED(IDC_ADD, OnAdd), args=(IDC_ADD, OnAdd)
    0: call=ON_BN_CLICKED(IDC_DEL, OnDel), args=(IDC_DEL, OnDel)
    ");
}

// =============================================================================
// Happy Path: Matching
// =============================================================================

#[rstest]
fn match_predicate_selects_free_functions(mut cpp_parser: Parser) {
    let source = "\
void myFreeFunction() {}
void myOtherFreeFunction() {}
void myOtherOtherFreeFunction() {}
";
    let query = cpp_query(
        r#"(function_declarator declarator: (_) @name (#match? "my(Other)?FreeFunction" @name))"#,
    );

    assert_snapshot!(render_matches(&mut cpp_parser, &query, source), @r"
    0: name=myFreeFunction
    0: name=myOtherFreeFunction
    ");
}

#[rstest]
fn quantified_parameters_are_reported_individually(mut cpp_parser: Parser) {
    let query = cpp_query(r#"(parameter_list ["," (parameter_declaration) @arg]+)"#);

    assert_snapshot!(
        render_matches(&mut cpp_parser, &query, "void f(int a, int b, int c, int d);"),
        @"0: arg=int a, arg=int b, arg=int c, arg=int d"
    );
}

// =============================================================================
// Unhappy Path: Transformation Errors
// =============================================================================

#[rstest]
fn overlapping_matches_abort_the_run(cpp_parser: Parser) {
    let error = transform(
        "void f() { a.b.c = 1; }",
        cpp_parser,
        cpp_query(FIELD_ACCESS),
        "@arg->@field",
    )
    .err()
    .unwrap_or_else(|| panic!("expected an overlap error"));

    assert_snapshot!(
        error.to_string(),
        @"match at bytes 11..14 overlaps the replacement at bytes 11..16"
    );
}

#[rstest]
fn missing_anchor_is_reported(cpp_parser: Parser) {
    let error = transform(
        "int x;",
        cpp_parser,
        cpp_query(r#"(field_expression argument: (_) @arg "." field: (_) @field)"#),
        "@arg->@field",
    )
    .err()
    .unwrap_or_else(|| panic!("expected a missing anchor error"));

    assert_snapshot!(
        error.to_string(),
        @"pattern 0 does not bind the anchor capture @from"
    );
}

#[rstest]
fn undefined_placeholders_are_reported(cpp_parser: Parser) {
    let error = Transformation::new("int x;", cpp_parser, cpp_query(FIELD_ACCESS), "@arg->@member")
        .err()
        .unwrap_or_else(|| panic!("expected a placeholder error"));

    assert_snapshot!(error.to_string(), @"template references undefined capture @member");
}

#[rstest]
fn escaped_sigils_survive_rewriting(cpp_parser: Parser) {
    let result = transform(
        "void f() { object.field = 1; }",
        cpp_parser,
        cpp_query(FIELD_ACCESS),
        "/* @@todo */ @arg->@field",
    )
    .unwrap_or_else(|error| panic!("rewrite failed: {error}"));

    assert_snapshot!(result.output(), @"void f() { /* @todo */ object->field = 1; }");
}

// =============================================================================
// Unhappy Path: Query Compilation
// =============================================================================

#[rstest]
#[case("((identifier) @id (#shiny? @id))", "unknown predicate at 0:19: unknown predicate #shiny?")]
#[case(
    "((identifier) @id (#match? @id))",
    "predicate arity error at 0:19: #match? expects exactly 2 arguments, got 1"
)]
#[case(
    "((identifier) @id\n  (#eq? \"a\" \"b\"))",
    "predicate argument error at 1:3: #eq? requires at least one capture argument"
)]
fn predicate_errors_name_the_clause(#[case] text: &str, #[case] expected: &str) {
    let error = Query::new(SupportedLanguage::Cpp, text)
        .err()
        .unwrap_or_else(|| panic!("expected a compile error"));

    assert_eq!(error.to_string(), expected);
}

#[test]
fn invalid_regex_is_a_compile_error() {
    let error = Query::new(
        SupportedLanguage::Cpp,
        r#"((identifier) @id (#match? @id "(unclosed"))"#,
    )
    .err()
    .unwrap_or_else(|| panic!("expected a compile error"));

    assert_eq!(error.kind(), QueryErrorKind::PredicateArgument);
    assert!(error.message().starts_with("#match?: invalid regular expression"));
}

#[rstest]
#[case("(field_expression", QueryErrorKind::Syntax)]
#[case("(field_expr)", QueryErrorKind::NodeType)]
#[case("(field_expression arg: (_))", QueryErrorKind::Field)]
#[case("((identifier) @id (#eq? @other \"x\"))", QueryErrorKind::Capture)]
fn grammar_errors_keep_their_kind(#[case] text: &str, #[case] expected: QueryErrorKind) {
    let error = Query::new(SupportedLanguage::Cpp, text)
        .err()
        .unwrap_or_else(|| panic!("expected a compile error"));

    assert_eq!(error.kind(), expected, "{error}");
    assert!(!error.message().contains("weaver-"), "{error}");
}
