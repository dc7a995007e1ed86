// Integration tests for the diagnostic assistant and the repair driver
//
// These tests feed real failures from the pipeline into the assistant and run
// the driver against in-memory and on-disk sources. Tests cover:
// - Explanations and patches for each failure class
// - "Did you mean" candidates for undefined names
// - Patch idempotence and the bounded retry loop
// - Auto-apply writing to disk, and leaving the file alone when disabled

use mend::assistant::{classify, explain, suggest_fix, FailureClass};
use mend::config::RepairConfig;
use mend::driver::{FileSource, MemorySource, RepairDriver, RunState, StopReason};
use mend::errors::Failure;
use mend::interpreter::{Evaluator, Interpreter};
use mend::parser::parse_source;
use std::fs;
use std::sync::{Arc, Mutex};

/// Run the pipeline once and return the failure it stops with
fn failure_of(source: &str) -> Failure {
    let program = match parse_source(source) {
        Ok(program) => program,
        Err(failure) => return failure,
    };
    let mut interp = Interpreter::new();
    interp.set_output(Arc::new(Mutex::new(Vec::new())));
    interp.evaluate(&program).expect_err("source should fail")
}

fn driver(auto_apply: bool) -> RepairDriver<Interpreter> {
    let mut interp = Interpreter::new();
    interp.set_output(Arc::new(Mutex::new(Vec::new())));
    RepairDriver::new(interp, RepairConfig { auto_apply, ..RepairConfig::default() })
}

#[test]
fn missing_semicolon_single_statement() {
    let source = "int x = 5";
    let failure = failure_of(source);
    assert!(failure.message.contains("Expected SEMICOL"));
    assert!(failure.message.contains("line 1"));
    assert!(explain(&failure).contains("semicolon"));

    let suggestion = suggest_fix(source, &failure);
    assert_eq!(suggestion.new_source.as_deref(), Some("int x = 5;"));
    assert_eq!(suggestion.description, "Inserted ';' at end of line 1.");
}

#[test]
fn missing_semicolon_patches_the_statement_line() {
    let source = "int x = 5\nprint(x);\n";
    let failure = failure_of(source);
    let suggestion = suggest_fix(source, &failure);
    assert_eq!(suggestion.new_source.as_deref(), Some("int x = 5;\nprint(x);\n"));
}

#[test]
fn applied_patch_is_not_reproduced() {
    let source = "int x = 5";
    let fixed = suggest_fix(source, &failure_of(source)).new_source.unwrap();
    assert!(parse_source(&fixed).is_ok());

    // A line that already ends with ';' never gets a second one
    let stale = failure_of(source);
    let again = suggest_fix(&fixed, &stale);
    assert!(again.new_source.is_none());
}

#[test]
fn undefined_name_lists_candidates_without_patching() {
    let source = "int total = 10;\nint count = 2;\nprint(tot);";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::UndefinedName);

    let suggestion = suggest_fix(source, &failure);
    assert!(suggestion.new_source.is_none());
    assert!(suggestion.description.contains("Did you mean"));
    assert!(suggestion.description.contains("total"));
    assert!(!suggestion.description.contains("count"));
}

#[test]
fn undefined_name_without_candidates() {
    let source = "print(zebra);";
    let suggestion = suggest_fix(source, &failure_of(source));
    assert!(suggestion.new_source.is_none());
    assert_eq!(
        suggestion.description,
        "Name 'zebra' not defined. Check for missing declaration or typo."
    );
}

#[test]
fn missing_rparen_appends_to_line() {
    let source = "int x = 1;\nprint(x\nint y = 2;";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::MissingRParen);
    assert!(explain(&failure).contains(")"));
    let fixed = suggest_fix(source, &failure).new_source.unwrap();
    assert_eq!(fixed, "int x = 1;\nprint(x)\nint y = 2;");
}

#[test]
fn missing_rbrace_always_appends_at_end_of_file() {
    let source = "func f(a) {\n    return a;\n\nint x = 1;";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::MissingRBrace);
    let fixed = suggest_fix(source, &failure).new_source.unwrap();
    assert!(fixed.starts_with(source));
    assert_eq!(fixed[source.len()..].trim(), "}");
}

#[test]
fn missing_rbrace_keeps_trailing_newline_last() {
    let source = "func f(a) {\n    return a;\n";
    let fixed = suggest_fix(source, &failure_of(source)).new_source.unwrap();
    assert_eq!(fixed, format!("{}}}\n", source));
    assert!(parse_source(&fixed).is_ok());
}

#[test]
fn type_failures_get_advice_only() {
    let source = "int x = 1;\nstring s = \"a\";\nprint(s - x);";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::TypeMismatch);
    let suggestion = suggest_fix(source, &failure);
    assert!(suggestion.new_source.is_none());
    assert!(suggestion.description.contains("Type error"));
}

#[test]
fn declared_type_mismatch_is_not_an_undefined_name() {
    let source = "int x = \"five\";";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::TypeMismatch);
    assert!(explain(&failure).starts_with("A type error occurred"));
    assert!(!suggest_fix(source, &failure).description.contains("not defined"));

    let source = "int x = 1;\nx = \"one\";";
    assert_eq!(classify(&failure_of(source)), FailureClass::TypeMismatch);
}

#[test]
fn semicolon_after_multiline_string_goes_on_its_last_line() {
    let source = "string s = \"a\nb\"\nprint(s);";
    let suggestion = suggest_fix(source, &failure_of(source));
    assert_eq!(
        suggestion.new_source.as_deref(),
        Some("string s = \"a\nb\";\nprint(s);")
    );
    assert_eq!(suggestion.description, "Inserted ';' at end of line 2.");
}

#[test]
fn driver_leaves_string_contents_alone() {
    let mut source = MemorySource::new("multiline", "string s = \"a\nb\"\nprint(s);");
    let report = driver(true).run(&mut source).unwrap();
    assert!(report.succeeded(), "states: {:?}", report.states);
    assert_eq!(report.patches_applied, 1);
    assert_eq!(source.text(), "string s = \"a\nb\";\nprint(s);");
}

#[test]
fn unexpected_token_has_no_fix() {
    let source = "if x;";
    let failure = failure_of(source);
    assert_eq!(classify(&failure), FailureClass::UnexpectedToken);
    let suggestion = suggest_fix(source, &failure);
    assert!(suggestion.description.starts_with("No automatic fix found"));
}

#[test]
fn driver_repairs_several_problems_in_sequence() {
    let mut source = MemorySource::new("multi", "int x = 5\nprint(x\n");
    let report = driver(true).run(&mut source).unwrap();
    assert!(report.succeeded(), "states: {:?}", report.states);
    // ';' on line 1, then ')' and ';' on line 2
    assert_eq!(report.patches_applied, 3);
    assert_eq!(source.text(), "int x = 5;\nprint(x);\n");
}

#[test]
fn driver_reports_when_auto_apply_is_off() {
    let mut source = MemorySource::new("off", "int x = 5");
    let report = driver(false).run(&mut source).unwrap();
    assert_eq!(report.final_state(), Some(RunState::Reported));
    assert_eq!(report.stop_reason, Some(StopReason::AutoApplyDisabled));
    assert_eq!(
        report.states,
        vec![RunState::Parsing, RunState::Failed, RunState::Diagnosing, RunState::Reported]
    );
}

#[test]
fn auto_apply_rewrites_the_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.mnd");
    fs::write(&path, "int x = 5\nprint(x);\n").unwrap();

    let report = driver(true).run(&mut FileSource::new(&path)).unwrap();
    assert!(report.succeeded());
    assert_eq!(fs::read_to_string(&path).unwrap(), "int x = 5;\nprint(x);\n");
}

#[test]
fn file_is_untouched_without_auto_apply() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.mnd");
    fs::write(&path, "int x = 5").unwrap();

    let report = driver(false).run(&mut FileSource::new(&path)).unwrap();
    assert!(!report.succeeded());
    assert_eq!(fs::read_to_string(&path).unwrap(), "int x = 5");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = driver(true).run(&mut FileSource::new(dir.path().join("absent.mnd")));
    assert!(result.is_err());
}

#[test]
fn retry_loop_is_bounded() {
    let config = RepairConfig { auto_apply: true, max_attempts: 4, ..RepairConfig::default() };
    let mut d = RepairDriver::new(Interpreter::new(), config);
    let mut source = MemorySource::new("paren", "print(1;");
    let report = d.run(&mut source).unwrap();
    assert_eq!(report.stop_reason, Some(StopReason::AttemptLimit));
    assert_eq!(report.patches_applied, 4);
}
