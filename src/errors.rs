// File: src/errors.rs
//
// Failure types for the Mend pipeline.
// Every stage (tokenizer, parser, evaluator) reports problems as a `Failure`:
// a kind, the historical message text, an optional source location and a
// structured detail the diagnostic assistant can match on without parsing
// the message.

use crate::lexer::TokenKind;
use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Categories of failure that can stop a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Lex,
    Parse,
    Name,
    Type,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureKind::Lex => write!(f, "Lex Error"),
            FailureKind::Parse => write!(f, "Parse Error"),
            FailureKind::Name => write!(f, "Name Error"),
            FailureKind::Type => write!(f, "Type Error"),
            FailureKind::Other => write!(f, "Runtime Error"),
        }
    }
}

/// Machine-readable facts about a failure.
///
/// `found: None` means the input ended where a token was required.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureDetail {
    None,
    UnexpectedChar { ch: char },
    Expected {
        expected: TokenKind,
        found: Option<TokenKind>,
        /// Line of the last token consumed before the mismatch
        anchor_line: usize,
    },
    Unexpected { found: Option<TokenKind> },
    DuplicateParam { name: String },
    UndefinedName { name: String },
}

/// A structured failure with location information
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub detail: FailureDetail,
    #[serde(skip)]
    pub source_line: Option<String>,
    #[serde(skip)]
    pub help: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            detail: FailureDetail::None,
            source_line: None,
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_detail(mut self, detail: FailureDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the offending line of `source`, if the failure has a location on it
    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(loc) = self.location {
            self.source_line = source
                .split('\n')
                .nth(loc.line.saturating_sub(1))
                .map(|l| l.trim_end().to_string());
        }
        self
    }

    /// Lexer failure for a character no token pattern accepts
    pub fn unexpected_char(ch: char, location: SourceLocation) -> Self {
        Self::new(
            FailureKind::Lex,
            format!(
                "Unexpected character {:?} at line {}, col {}",
                ch, location.line, location.column
            ),
        )
        .at(location)
        .with_detail(FailureDetail::UnexpectedChar { ch })
    }

    /// Parser failure raised by `eat` when the next token has the wrong kind
    pub fn expected(
        expected: TokenKind,
        found: Option<TokenKind>,
        location: SourceLocation,
        anchor_line: usize,
    ) -> Self {
        let got = found.map(|k| k.to_string()).unwrap_or_else(|| "EOF".to_string());
        Self::new(
            FailureKind::Parse,
            format!("Expected {}, got {} at line {}", expected, got, location.line),
        )
        .at(location)
        .with_detail(FailureDetail::Expected { expected, found, anchor_line })
    }

    /// Parser failure for a token that cannot start the current production
    pub fn unexpected_token(found: Option<TokenKind>, location: SourceLocation) -> Self {
        let got = found.map(|k| k.to_string()).unwrap_or_else(|| "EOF".to_string());
        Self::new(
            FailureKind::Parse,
            format!("Unexpected token {} at line {}", got, location.line),
        )
        .at(location)
        .with_detail(FailureDetail::Unexpected { found })
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str) -> Self {
        Self::new(FailureKind::Name, format!("Variable '{}' is not defined", name))
            .with_detail(FailureDetail::UndefinedName { name: name.to_string() })
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Type, format!("Type error: {}", message.into()))
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }

    /// Line the failure points at, if known
    pub fn line(&self) -> Option<usize> {
        self.location.map(|l| l.line)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if let Some(location) = self.location {
            writeln!(f, "{}", format!("  --> {}", location).bright_blue())?;

            if let Some(ref source) = self.source_line {
                writeln!(f, "   {}", "|".bright_blue())?;
                writeln!(
                    f,
                    "{} {} {}",
                    format!("{:3}", location.line).bright_blue(),
                    "|".bright_blue(),
                    source
                )?;
                writeln!(
                    f,
                    "   {} {}{}",
                    "|".bright_blue(),
                    " ".repeat(location.column.saturating_sub(1)),
                    "^".red().bold()
                )?;
            }
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for Failure {}
