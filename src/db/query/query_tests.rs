use super::*;
use crate::error::ScriptError;

fn oracle(sql: &str) -> SqlScript {
    SqlScript::parse(sql, SqlDialect::Oracle, None).unwrap()
}

fn statements(sql: &str) -> Vec<String> {
    oracle(sql)
        .sql_texts()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn parse_error_line(sql: &str) -> usize {
    match SqlScript::parse(sql, SqlDialect::Oracle, None) {
        Err(ScriptError::ParseBoundary { line, .. }) => line,
        Err(other) => panic!("expected a parse boundary error, got {other}"),
        Ok(script) => panic!("expected a parse boundary error, got {:?}", script.sql_texts()),
    }
}

#[test]
fn test_simple_select() {
    let stmts = statements("SELECT 1 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL"]);
}

#[test]
fn test_multiple_selects() {
    let stmts = statements("SELECT 1 FROM DUAL;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_multi_line_statement_keeps_line_breaks() {
    let stmts = statements("SELECT a,\n       b\n  FROM t;");
    assert_eq!(stmts, vec!["SELECT a,\n       b\n  FROM t"]);
}

#[test]
fn test_last_statement_without_terminator() {
    let stmts = statements("SELECT 1 FROM DUAL;\nSELECT 2 FROM DUAL");
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[1], "SELECT 2 FROM DUAL");
}

#[test]
fn test_default_policy() {
    let script = oracle("SELECT 1 FROM DUAL;\nSELECT 2 FROM DUAL;");
    for stmt in script.statements() {
        assert!(stmt.fail_on_exception());
        assert!(!stmt.echo_output());
    }
}

#[test]
fn test_continue_then_exit_directive() {
    let sql = "SELECT 1 FROM DUAL;\n\
               WHENEVER SQLERROR CONTINUE\n\
               SELECT 2 FROM DUAL;\n\
               SELECT 3 FROM DUAL;\n\
               WHENEVER SQLERROR EXIT FAILURE;\n\
               SELECT 4 FROM DUAL;";
    let script = oracle(sql);
    let flags: Vec<bool> = script
        .statements()
        .iter()
        .map(Statement::fail_on_exception)
        .collect();
    assert_eq!(flags, vec![true, false, false, true]);
}

#[test]
fn test_directives_are_case_insensitive_and_allow_comments() {
    let sql = "whenever sqlerror continue -- keep going\n\
               SELECT 1 FROM DUAL;";
    let script = oracle(sql);
    assert_eq!(script.len(), 1);
    assert!(!script.statements()[0].fail_on_exception());
}

#[test]
fn test_exit_directive_with_exit_code() {
    let sql = "WHENEVER SQLERROR CONTINUE\n\
               WHENEVER SQLERROR EXIT SQL.SQLCODE ROLLBACK\n\
               SELECT 1 FROM DUAL;";
    let script = oracle(sql);
    assert_eq!(script.len(), 1);
    assert!(script.statements()[0].fail_on_exception());
}

#[test]
fn test_directives_never_emitted() {
    let sql = "WHENEVER SQLERROR CONTINUE\n\
               SET SERVEROUTPUT ON\n\
               SELECT 1 FROM DUAL;\n\
               SET SERVEROUT OFF;\n\
               WHENEVER SQLERROR EXIT FAILURE";
    let stmts = statements(sql);
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL"]);
}

#[test]
fn test_echo_directive_toggles() {
    let sql = "SELECT 0 FROM DUAL;\n\
               SET SERVEROUTPUT ON SIZE UNLIMITED\n\
               BEGIN\n\
               DBMS_OUTPUT.PUT_LINE('hello');\n\
               END;\n\
               /\n\
               SET SERVEROUTPUT OFF\n\
               SELECT 1 FROM DUAL;";
    let script = oracle(sql);
    let echo: Vec<bool> = script
        .statements()
        .iter()
        .map(Statement::echo_output)
        .collect();
    assert_eq!(echo, vec![false, true, false]);
    assert_eq!(
        script.statements()[1].sql(),
        "BEGIN\nDBMS_OUTPUT.PUT_LINE('hello');\nEND;"
    );
}

#[test]
fn test_semicolon_inside_alternate_quote() {
    let stmts = statements("INSERT INTO t VALUES (q'[a;b]');\nSELECT 1 FROM DUAL;");
    assert_eq!(
        stmts,
        vec!["INSERT INTO t VALUES (q'[a;b]')", "SELECT 1 FROM DUAL"]
    );
}

#[test]
fn test_alternate_quote_across_lines() {
    let stmts = statements("INSERT INTO t VALUES (q'{first;\nsecond;}');");
    assert_eq!(stmts, vec!["INSERT INTO t VALUES (q'{first;\nsecond;}')"]);
}

#[test]
fn test_paren_alternate_quote_keeps_original_text() {
    let stmts = statements("SELECT q'(a;b)' FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT q'(a;b)' FROM DUAL"]);
}

#[test]
fn test_national_alternate_quote() {
    let stmts = statements("SELECT nq'<x;y>' FROM DUAL;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0], "SELECT nq'<x;y>' FROM DUAL");
}

#[test]
fn test_keyword_abutting_alternate_quote_closer() {
    let stmts = statements("SELECT x FROM t WHERE a = q'[x;y]'AND b = 1;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts.len(), 2, "got: {:?}", stmts);
}

#[test]
fn test_alternate_quote_with_separator_delimiter() {
    let stmts = statements("SELECT q'|it's|' FROM DUAL;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT q'|it's|' FROM DUAL", "SELECT 2 FROM DUAL"]);

    let stmts = statements("SELECT q';a;b;' FROM DUAL;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT q';a;b;' FROM DUAL", "SELECT 2 FROM DUAL"]);

    let stmts = statements("INSERT INTO t VALUES (Q'=x;\ny=');\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["INSERT INTO t VALUES (Q'=x;\ny=')", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_national_literal_across_lines() {
    let stmts = statements("SELECT N'a;\nb' FROM DUAL;\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT N'a;\nb' FROM DUAL", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_keyword_glued_to_literal_inside_block() {
    let sql = "BEGIN\n  EXECUTE IMMEDIATE'drop;\n table t';\nEND;\n/";
    let stmts = statements(sql);
    assert_eq!(stmts, vec!["BEGIN\n  EXECUTE IMMEDIATE'drop;\n table t';\nEND;"]);
}

#[test]
fn test_date_literal_beside_quoted_semicolon() {
    let stmts =
        statements("INSERT INTO t VALUES (DATE'2024-01-01', 'x;y');\nSELECT 1 FROM DUAL;");
    assert_eq!(
        stmts,
        vec![
            "INSERT INTO t VALUES (DATE'2024-01-01', 'x;y')",
            "SELECT 1 FROM DUAL"
        ]
    );
}

#[test]
fn test_semicolon_inside_standard_quote() {
    let stmts = statements("INSERT INTO t VALUES ('a;b', 'it''s');\nSELECT 1 FROM DUAL;");
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b', 'it''s')");
}

#[test]
fn test_standard_quote_across_lines() {
    let stmts = statements("INSERT INTO t VALUES ('line one;\nline two');");
    assert_eq!(stmts, vec!["INSERT INTO t VALUES ('line one;\nline two')"]);
}

#[test]
fn test_anonymous_block_terminates_once() {
    let sql = "BEGIN\n  NULL;\nEND;\n/\nSELECT 1 FROM DUAL;";
    let stmts = statements(sql);
    assert_eq!(stmts, vec!["BEGIN\n  NULL;\nEND;", "SELECT 1 FROM DUAL"]);
}

#[test]
fn test_declare_block() {
    let sql = "DECLARE\n  v NUMBER;\nBEGIN\n  v := 1;\nEND;\n/";
    let stmts = statements(sql);
    assert_eq!(stmts.len(), 1);
    assert!(stmts[0].starts_with("DECLARE"));
    assert!(stmts[0].ends_with("END;"));
}

#[test]
fn test_create_procedure_uses_slash() {
    let sql = "CREATE OR REPLACE PROCEDURE test_proc AS\n\
               BEGIN\n\
               NULL;\n\
               END;\n\
               /\n\
               SELECT 1 FROM DUAL;";
    let stmts = statements(sql);
    assert_eq!(stmts.len(), 2, "got: {:?}", stmts);
    assert_eq!(stmts[0], "CREATE OR REPLACE PROCEDURE test_proc AS\nBEGIN\nNULL;\nEND;");
}

#[test]
fn test_create_editionable_package() {
    let sql = "create or replace editionable package pkg as\n\
               procedure p;\n\
               end pkg;\n\
               /";
    let stmts = statements(sql);
    assert_eq!(stmts.len(), 1, "got: {:?}", stmts);
}

#[test]
fn test_create_java_source() {
    let sql = "CREATE OR REPLACE AND COMPILE JAVA SOURCE NAMED \"Hello\" AS\n\
               public class Hello { public static void run() { int x = 1; } }\n\
               /";
    let stmts = statements(sql);
    assert_eq!(stmts.len(), 1, "got: {:?}", stmts);
}

#[test]
fn test_slash_runs_plain_statement() {
    let stmts = statements("SELECT 1 FROM DUAL\n/\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_stray_slash_is_discarded() {
    let stmts = statements("SELECT 1 FROM DUAL;\n/\n/\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_slash_with_trailing_comment_is_discarded() {
    let stmts = statements("SELECT 1 FROM DUAL;\n/ -- rerun\nSELECT 2 FROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL", "SELECT 2 FROM DUAL"]);
}

#[test]
fn test_block_closed_by_slash_with_comment() {
    let stmts = statements("BEGIN\n  NULL;\nEND;\n/ -- done\nSELECT 1 FROM DUAL;");
    assert_eq!(stmts, vec!["BEGIN\n  NULL;\nEND;", "SELECT 1 FROM DUAL"]);
}

#[test]
fn test_sqlplus_commands_are_discarded() {
    let sql = "SET DEFINE OFF\n\
               SET ECHO ON\n\
               SET TIMING OFF;\n\
               SET SQLBLANKLINES ON\n\
               COLUMN spoolfile NEW_VALUE v_spoolfile\n\
               SPOOL &v_spoolfile\n\
               SELECT 1 FROM DUAL;\n\
               SPOOL OFF";
    let stmts = statements(sql);
    assert_eq!(stmts, vec!["SELECT 1 FROM DUAL"]);
}

#[test]
fn test_comments_are_discarded() {
    let sql = "-- header\n\
               /* block\n\
               comment */\n\
               SELECT 1 FROM DUAL; -- trailing\n";
    let script = oracle(sql);
    assert_eq!(script.sql_texts(), vec!["SELECT 1 FROM DUAL"]);
    assert_eq!(script.statements()[0].line_number(), 4);
}

#[test]
fn test_semicolon_inside_comment_does_not_terminate() {
    let stmts = statements("SELECT 1 -- not here;\nFROM DUAL;");
    assert_eq!(stmts, vec!["SELECT 1 -- not here;\nFROM DUAL"]);
}

#[test]
fn test_line_numbers_skip_blank_lines() {
    let script = oracle("\n\nSELECT 1 FROM DUAL;\n\nSELECT 2\nFROM DUAL;");
    let lines: Vec<usize> = script
        .statements()
        .iter()
        .map(Statement::line_number)
        .collect();
    assert_eq!(lines, vec![3, 5]);
}

#[test]
fn test_empty_script() {
    let script = oracle("\n  \n-- only a comment\n");
    assert!(script.is_empty());
}

#[test]
fn test_unterminated_string_is_parse_error() {
    assert_eq!(parse_error_line("SELECT 1 FROM DUAL;\nSELECT 'abc FROM DUAL;\n"), 2);
}

#[test]
fn test_unterminated_alternate_quote_is_parse_error() {
    assert_eq!(parse_error_line("SELECT q'[abc FROM DUAL;\nSELECT 1;"), 2);
}

#[test]
fn test_unterminated_block_comment_is_parse_error() {
    assert_eq!(parse_error_line("/* never closed\nSELECT 1 FROM DUAL;"), 2);
}

#[test]
fn test_block_without_slash_is_parse_error() {
    assert_eq!(parse_error_line("BEGIN\n  NULL;\nEND;"), 3);
}

#[test]
fn test_resource_is_kept() {
    let resource = ScriptResource::new("V1__init.sql").with_location("db/migration");
    let script = SqlScript::parse("SELECT 1 FROM DUAL;", SqlDialect::Oracle, Some(resource))
        .unwrap();
    assert_eq!(script.resource().map(|r| r.name.as_str()), Some("V1__init.sql"));
    assert_eq!(script.dialect(), SqlDialect::Oracle);
}

#[test]
fn test_generic_dialect_splits_blocks_on_semicolon() {
    let script = SqlScript::parse("BEGIN\n  NULL;\nEND;", SqlDialect::Generic, None).unwrap();
    assert_eq!(script.sql_texts(), vec!["BEGIN\n  NULL", "END"]);
}

#[test]
fn test_generic_dialect_has_no_directives() {
    let script = SqlScript::parse(
        "WHENEVER SQLERROR CONTINUE;\nSELECT 1;",
        SqlDialect::Generic,
        None,
    )
    .unwrap();
    assert_eq!(script.sql_texts(), vec!["WHENEVER SQLERROR CONTINUE", "SELECT 1"]);
    assert!(script.statements()[1].fail_on_exception());
}

#[test]
fn test_builder_switches_to_slash_on_begin() {
    let mut builder = StatementBuilder::new(SqlDialect::Oracle.rules());
    builder.add_line("BEGIN");
    assert_eq!(builder.delimiter(), &Delimiter::slash());
    builder.add_line("  NULL;");
    assert!(!builder.is_terminated());
    assert!(builder.is_incomplete());
    builder.add_line("END;");
    builder.add_line("/");
    assert!(builder.is_terminated());
    assert!(!builder.is_incomplete());
    assert!(!builder.can_discard());
}

#[test]
fn test_builder_discards_lone_slash() {
    let mut builder = StatementBuilder::new(SqlDialect::Oracle.rules());
    builder.add_line("/");
    assert!(builder.can_discard());
}

#[test]
fn test_builder_directive_needs_no_delimiter() {
    let mut builder = StatementBuilder::new(SqlDialect::Oracle.rules());
    builder.add_line("SET SERVEROUTPUT ON");
    assert!(builder.is_terminated());
    assert_eq!(
        builder.directive(),
        Some(Directive::OutputEcho { enabled: true })
    );
}

#[test]
fn test_abbreviated_server_output_directives() {
    let sql = "SET SERVEROUTPUT ON SIZE UNL FOR WRA\n\
               BEGIN\n\
               NULL;\n\
               END;\n\
               /\n\
               SET SERVEROUT OFF\n\
               SELECT 1 FROM DUAL;";
    let script = oracle(sql);
    let echo: Vec<bool> = script
        .statements()
        .iter()
        .map(Statement::echo_output)
        .collect();
    assert_eq!(echo, vec![true, false]);

    let mut builder = StatementBuilder::new(SqlDialect::Oracle.rules());
    builder.add_line("set serverout on format truncated");
    assert_eq!(
        builder.directive(),
        Some(Directive::OutputEcho { enabled: true })
    );
}
