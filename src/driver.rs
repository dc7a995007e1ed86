// File: src/driver.rs
//
// Repair driver: runs a program, and on failure asks the assistant for a
// diagnosis and optionally applies its patch and tries again.
//
// States:
//   Parsing -> Evaluating -> Succeeded
//   Parsing | Evaluating -> Failed -> Diagnosing -> PatchApplied -> Parsing ...
//                                              \-> Reported
//
// The retry edge is an explicit loop bounded two ways: at most
// `max_attempts` patches are applied per run, and a patch that reproduces a
// text already seen in this run stops the loop.
//
// Source text is read through a `SourceStore` at the start of every attempt,
// so a patch written by the previous attempt is what the next one parses.

use crate::assistant::{self, Diagnosis};
use crate::config::RepairConfig;
use crate::errors::Failure;
use crate::interpreter::Evaluator;
use crate::parser;
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the driver reads source text from and writes patches to
pub trait SourceStore {
    fn load(&mut self) -> io::Result<String>;
    fn store(&mut self, text: &str) -> io::Result<()>;
    /// Label used in reports
    fn name(&self) -> String;
}

/// Source file on disk; patches overwrite it in full
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceStore for FileSource {
    fn load(&mut self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn store(&mut self, text: &str) -> io::Result<()> {
        fs::write(&self.path, text)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory source, used by the REPL and tests
pub struct MemorySource {
    name: String,
    text: String,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        MemorySource { name: name.into(), text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl SourceStore for MemorySource {
    fn load(&mut self) -> io::Result<String> {
        Ok(self.text.clone())
    }

    fn store(&mut self, text: &str) -> io::Result<()> {
        self.text = text.to_string();
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Parsing,
    Evaluating,
    Failed,
    Diagnosing,
    PatchApplied,
    Succeeded,
    Reported,
}

/// Why a run ended in `Reported`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The assistant had no patch for the failure
    NoPatch,
    /// A patch exists but auto-apply is off
    AutoApplyDisabled,
    /// `max_attempts` patches were already applied
    AttemptLimit,
    /// The patch would recreate a text already tried in this run
    Cycle,
}

/// One failed attempt and what the assistant said about it
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub number: usize,
    pub failure: Failure,
    pub diagnosis: Diagnosis,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub name: String,
    pub states: Vec<RunState>,
    pub attempts: Vec<Attempt>,
    pub patches_applied: usize,
    pub stop_reason: Option<StopReason>,
    /// Text of the last attempt, including any applied patches
    pub final_source: String,
}

impl RunReport {
    fn new(name: String) -> Self {
        RunReport {
            name,
            states: Vec::new(),
            attempts: Vec::new(),
            patches_applied: 0,
            stop_reason: None,
            final_source: String::new(),
        }
    }

    pub fn final_state(&self) -> Option<RunState> {
        self.states.last().copied()
    }

    pub fn succeeded(&self) -> bool {
        self.final_state() == Some(RunState::Succeeded)
    }

    /// The failure that ended the run, if it did not succeed
    pub fn last_attempt(&self) -> Option<&Attempt> {
        if self.succeeded() {
            None
        } else {
            self.attempts.last()
        }
    }
}

pub struct RepairDriver<E: Evaluator> {
    evaluator: E,
    config: RepairConfig,
    trace: bool,
}

impl<E: Evaluator> RepairDriver<E> {
    pub fn new(evaluator: E, config: RepairConfig) -> Self {
        RepairDriver { evaluator, config, trace: false }
    }

    /// Print every state transition to stderr
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    fn enter(&self, report: &mut RunReport, state: RunState) {
        if self.trace {
            eprintln!("{} {} {:?}", "[mend]".dimmed(), report.name.bright_blue(), state);
        }
        report.states.push(state);
    }

    /// Run the program held by `store` until it succeeds or the loop has to stop.
    ///
    /// # Errors
    /// Only I/O errors from the store are returned; language failures end up
    /// in the report.
    pub fn run(&mut self, store: &mut dyn SourceStore) -> io::Result<RunReport> {
        let mut report = RunReport::new(store.name());
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            self.enter(&mut report, RunState::Parsing);
            let source = store.load()?;
            seen.insert(source.clone());
            report.final_source = source.clone();

            let failure = match parser::parse_source(&source) {
                Ok(program) => {
                    self.enter(&mut report, RunState::Evaluating);
                    self.evaluator.reset();
                    match self.evaluator.evaluate(&program) {
                        Ok(()) => {
                            self.enter(&mut report, RunState::Succeeded);
                            return Ok(report);
                        }
                        Err(failure) => failure,
                    }
                }
                Err(failure) => failure,
            };
            self.enter(&mut report, RunState::Failed);

            self.enter(&mut report, RunState::Diagnosing);
            let failure = failure.with_source(&source);
            let diagnosis = assistant::diagnose(&source, &failure);
            let patch = diagnosis.suggestion.new_source.clone();

            let stop = match &patch {
                None => Some(StopReason::NoPatch),
                Some(_) if !self.config.auto_apply => Some(StopReason::AutoApplyDisabled),
                Some(_) if report.patches_applied >= self.config.max_attempts => {
                    Some(StopReason::AttemptLimit)
                }
                Some(text) if seen.contains(text) => Some(StopReason::Cycle),
                Some(_) => None,
            };

            report.attempts.push(Attempt {
                number: report.attempts.len() + 1,
                failure,
                diagnosis,
                applied: stop.is_none(),
            });

            match (stop, patch) {
                (None, Some(text)) => {
                    store.store(&text)?;
                    seen.insert(text);
                    report.patches_applied += 1;
                    self.enter(&mut report, RunState::PatchApplied);
                }
                (reason, _) => {
                    report.stop_reason = reason;
                    self.enter(&mut report, RunState::Reported);
                    return Ok(report);
                }
            }
        }
    }
}
