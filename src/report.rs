// File: src/report.rs
//
// Human-readable and JSON rendering of repair runs.

use crate::driver::{Attempt, RunReport, StopReason};
use colored::Colorize;
use std::fmt::Write;

impl StopReason {
    pub fn describe(self) -> &'static str {
        match self {
            StopReason::NoPatch => "no automatic fix is available",
            StopReason::AutoApplyDisabled => "a fix is available; rerun with --fix to apply it",
            StopReason::AttemptLimit => "gave up after reaching the patch attempt limit",
            StopReason::Cycle => "the fix would repeat an earlier version of the source",
        }
    }
}

/// Render a run for the terminal
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    for attempt in report.attempts.iter().filter(|a| a.applied) {
        let _ = writeln!(
            out,
            "{} {}",
            "patched:".bright_green(),
            attempt.diagnosis.suggestion.description
        );
    }

    match report.last_attempt() {
        None => {
            let _ = writeln!(out, "{} {}", "✓".bright_green().bold(), report.name);
        }
        Some(attempt) => {
            let _ = writeln!(
                out,
                "{} {} {}",
                "✗".bright_red().bold(),
                report.name,
                format!("(attempt {})", attempt.number).dimmed()
            );
            render_attempt(&mut out, attempt);
            if let Some(reason) = report.stop_reason {
                let _ = writeln!(out, "   {} {}", "stopped:".bright_cyan(), reason.describe());
            }
        }
    }
    out
}

fn render_attempt(out: &mut String, attempt: &Attempt) {
    let _ = write!(out, "{}", attempt.failure);
    let _ = writeln!(out, "   {} {}", "why:".bright_yellow(), attempt.diagnosis.explanation);
    let suggestion = &attempt.diagnosis.suggestion;
    let _ = writeln!(out, "   {} {}", "fix:".bright_yellow(), suggestion.description);
    if let (Some(fixed), false) = (&suggestion.new_source, attempt.applied) {
        let _ = writeln!(out, "{}", "--- Fixed Code Preview ---".dimmed());
        let _ = writeln!(out, "{}", fixed);
    }
}

/// Render the state trace of a run on one line
pub fn render_states(report: &RunReport) -> String {
    report
        .states
        .iter()
        .map(|s| format!("{:?}", s))
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub fn to_json(reports: &[RunReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepairConfig;
    use crate::driver::{MemorySource, RepairDriver};
    use crate::interpreter::Interpreter;
    use std::sync::{Arc, Mutex};

    fn run(source: &str, auto_apply: bool) -> RunReport {
        let mut interp = Interpreter::new();
        interp.set_output(Arc::new(Mutex::new(Vec::new())));
        let config = RepairConfig { auto_apply, ..RepairConfig::default() };
        let mut driver = RepairDriver::new(interp, config);
        driver.run(&mut MemorySource::new("demo.mnd", source)).unwrap()
    }

    #[test]
    fn failed_run_shows_explanation_and_preview() {
        let text = render(&run("int x = 5", false));
        assert!(text.contains("demo.mnd"));
        assert!(text.contains("semicolon"));
        assert!(text.contains("Fixed Code Preview"));
        assert!(text.contains("rerun with --fix"));
    }

    #[test]
    fn applied_patches_are_listed() {
        let text = render(&run("int x = 5", true));
        assert!(text.contains("Inserted ';' at end of line 1."));
        assert!(!text.contains("Fixed Code Preview"));
    }

    #[test]
    fn state_trace_joins_states() {
        assert_eq!(render_states(&run("int x = 1;", false)), "Parsing -> Evaluating -> Succeeded");
    }

    #[test]
    fn json_contains_structured_failure() {
        let json = to_json(&[run("print(y);", false)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let attempt = &value[0]["attempts"][0];
        assert_eq!(attempt["failure"]["kind"], "Name");
        assert_eq!(attempt["failure"]["detail"]["type"], "undefined_name");
        assert_eq!(attempt["diagnosis"]["class"], "undefined_name");
        assert_eq!(value[0]["stop_reason"], "no_patch");
    }
}
