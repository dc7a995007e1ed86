// File: src/assistant.rs
//
// Diagnostic assistant for failed Mend runs.
//
// Given a failure and the source that produced it, the assistant:
// - classifies the failure against a fixed, ordered rule table
// - explains it in one plain sentence
// - proposes a patch (a complete replacement source) when a cheap textual
//   fix exists, or a description of what to check otherwise
//
// Classification reads the structured `FailureDetail` first and falls back to
// the message text, so failures from evaluators that only fill in a message
// are still recognized. Nothing here has side effects or fails.

use crate::errors::{Failure, FailureDetail, FailureKind};
use crate::lexer::TokenKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"line (\d+)").expect("valid regex"));
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").expect("valid regex"));
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[Vv]ariable '([^']+)'|Function '([^']+)'").expect("valid regex")
});

/// Minimum similarity for a "did you mean" candidate
pub const CANDIDATE_CUTOFF: f64 = 0.6;
/// Maximum number of "did you mean" candidates
pub const MAX_CANDIDATES: usize = 3;

/// Failure categories the assistant knows how to talk about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    MissingSemicolon,
    MissingRParen,
    MissingRBrace,
    UnexpectedToken,
    UndefinedName,
    TypeMismatch,
    Unknown,
}

/// Checked in order; the first matching rule decides the class
static RULES: &[(FailureClass, fn(&Failure) -> bool)] = &[
    (FailureClass::MissingSemicolon, is_missing_semicolon),
    (FailureClass::MissingRParen, is_missing_rparen),
    (FailureClass::MissingRBrace, is_missing_rbrace),
    (FailureClass::UnexpectedToken, is_unexpected_token),
    (FailureClass::UndefinedName, is_undefined_name),
    (FailureClass::TypeMismatch, is_type_mismatch),
];

fn message_has(failure: &Failure, needle: &str) -> bool {
    failure.message.to_lowercase().contains(&needle.to_lowercase())
}

fn expects(failure: &Failure, kind: TokenKind) -> bool {
    matches!(failure.detail, FailureDetail::Expected { expected, .. } if expected == kind)
}

fn is_missing_semicolon(failure: &Failure) -> bool {
    expects(failure, TokenKind::Semicol) || message_has(failure, "Expected SEMICOL")
}

fn is_missing_rparen(failure: &Failure) -> bool {
    let found_rparen = matches!(
        failure.detail,
        FailureDetail::Expected { found: Some(TokenKind::RParen), .. }
    );
    expects(failure, TokenKind::RParen)
        || found_rparen
        || message_has(failure, "Expected RPAREN")
        || message_has(failure, "got RPAREN")
}

fn is_missing_rbrace(failure: &Failure) -> bool {
    expects(failure, TokenKind::RBrace) || message_has(failure, "Expected RBRACE")
}

fn is_unexpected_token(failure: &Failure) -> bool {
    matches!(failure.detail, FailureDetail::Unexpected { .. })
        || message_has(failure, "Unexpected token")
}

fn is_undefined_name(failure: &Failure) -> bool {
    if failure.kind == FailureKind::Name
        || matches!(failure.detail, FailureDetail::UndefinedName { .. })
    {
        return true;
    }
    // Message text only counts for failures that carry no structure of their own
    failure.kind != FailureKind::Type
        && failure.detail == FailureDetail::None
        && message_has(failure, "variable '")
}

fn is_type_mismatch(failure: &Failure) -> bool {
    failure.kind == FailureKind::Type
}

pub fn classify(failure: &Failure) -> FailureClass {
    RULES
        .iter()
        .find(|(_, matches)| matches(failure))
        .map(|(class, _)| *class)
        .unwrap_or(FailureClass::Unknown)
}

/// One plain-language sentence describing the failure
pub fn explain(failure: &Failure) -> String {
    let canned = match classify(failure) {
        FailureClass::MissingSemicolon => {
            "It looks like a statement is missing a semicolon (`;`) at the end."
        }
        FailureClass::MissingRParen => "A closing parenthesis `)` is missing.",
        FailureClass::MissingRBrace => {
            "A closing brace `}` is missing (maybe you forgot to close a block)."
        }
        FailureClass::UnexpectedToken => concat!(
            "There's an unexpected token at the mentioned location. ",
            "Maybe a typo or missing punctuation."
        ),
        FailureClass::UndefinedName => concat!(
            "A variable or function name is used but not defined. ",
            "Maybe you misspelled it or forgot a declaration."
        ),
        FailureClass::TypeMismatch => {
            "A type error occurred: argument counts or operand types may be incorrect."
        }
        FailureClass::Unknown => return format!("Error: {}", failure.message),
    };
    canned.to_string()
}

/// A proposed fix: a full replacement source when one could be built, and a
/// one-line description either way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub new_source: Option<String>,
    pub description: String,
}

impl Suggestion {
    fn patch(new_source: String, description: String) -> Self {
        Suggestion { new_source: Some(new_source), description }
    }

    fn advice(description: impl Into<String>) -> Self {
        Suggestion { new_source: None, description: description.into() }
    }

    pub fn has_patch(&self) -> bool {
        self.new_source.is_some()
    }
}

/// Everything the assistant has to say about one failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub class: FailureClass,
    pub explanation: String,
    pub suggestion: Suggestion,
}

pub fn diagnose(source: &str, failure: &Failure) -> Diagnosis {
    Diagnosis {
        class: classify(failure),
        explanation: explain(failure),
        suggestion: suggest_fix(source, failure),
    }
}

const NO_FIX: &str = "No automatic fix found. Try correcting the code near the mentioned line.";

/// Try to build a simple textual fix for `source` given `failure`
pub fn suggest_fix(source: &str, failure: &Failure) -> Suggestion {
    match classify(failure) {
        FailureClass::MissingSemicolon => {
            let line_no = anchor_line(failure);
            let Some(line) = nth_line(source, line_no) else {
                return Suggestion::advice(out_of_range(line_no));
            };
            if line.trim_end().ends_with([';', '{', '}']) {
                return Suggestion::advice(format!(
                    "{} Line {} already ends with ';', '{{' or '}}'.",
                    NO_FIX, line_no
                ));
            }
            match append_to_line(source, line_no, ";") {
                Some(fixed) => {
                    Suggestion::patch(fixed, format!("Inserted ';' at end of line {}.", line_no))
                }
                None => Suggestion::advice(out_of_range(line_no)),
            }
        }
        FailureClass::MissingRParen => {
            let line_no = if expects(failure, TokenKind::RParen) {
                anchor_line(failure)
            } else {
                referenced_line(failure)
            };
            match append_to_line(source, line_no, ")") {
                Some(fixed) => {
                    Suggestion::patch(fixed, format!("Inserted ')' at end of line {}.", line_no))
                }
                None => Suggestion::advice(out_of_range(line_no)),
            }
        }
        FailureClass::MissingRBrace => {
            let mut fixed = source.to_string();
            if fixed.ends_with('\n') {
                fixed.push_str("}\n");
            } else {
                fixed.push_str("\n}");
            }
            Suggestion::patch(
                fixed,
                "Appended a '}' at the end of the file (closing a block).".to_string(),
            )
        }
        FailureClass::UndefinedName => match missing_name(failure) {
            Some(name) => {
                let candidates = close_matches(&name, source);
                if candidates.is_empty() {
                    Suggestion::advice(format!(
                        "Name '{}' not defined. Check for missing declaration or typo.",
                        name
                    ))
                } else {
                    Suggestion::advice(format!(
                        "Name '{}' not defined. Did you mean: {}?",
                        name,
                        candidates.join(", ")
                    ))
                }
            }
            None => Suggestion::advice("Name not defined. Check for missing declaration or typo."),
        },
        FailureClass::TypeMismatch => Suggestion::advice(
            "Type error or wrong number of function arguments. Please verify types/arg counts.",
        ),
        FailureClass::UnexpectedToken | FailureClass::Unknown => Suggestion::advice(NO_FIX),
    }
}

/// Explanation plus either the fix description or a full preview of the fixed source
pub fn explain_and_suggest(source: &str, failure: &Failure) -> (String, String) {
    let explanation = explain(failure);
    let suggestion = suggest_fix(source, failure);
    let text = match suggestion.new_source {
        Some(fixed) => format!(
            "Suggested fix: {}\n\n--- Fixed Code Preview ---\n{}",
            suggestion.description, fixed
        ),
        None => suggestion.description,
    };
    (explanation, text)
}

fn out_of_range(line_no: usize) -> String {
    format!("{} Line {} is outside the source.", NO_FIX, line_no)
}

/// Line a failure refers to: its location, else the first "line N" in the message, else 1
fn referenced_line(failure: &Failure) -> usize {
    failure
        .line()
        .or_else(|| {
            LINE_RE
                .captures(&failure.message)
                .and_then(|caps| caps[1].parse().ok())
        })
        .unwrap_or(1)
}

/// Line where a missing terminator belongs (end of the last complete token)
fn anchor_line(failure: &Failure) -> usize {
    match failure.detail {
        FailureDetail::Expected { anchor_line, .. } => anchor_line,
        _ => referenced_line(failure),
    }
}

fn nth_line(source: &str, line_no: usize) -> Option<&str> {
    source.split('\n').nth(line_no.max(1) - 1)
}

/// Append `suffix` to line `line_no` (1-based), keeping a trailing `\r` last
fn append_to_line(source: &str, line_no: usize, suffix: &str) -> Option<String> {
    let idx = line_no.max(1) - 1;
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();
    let line = lines.get_mut(idx)?;
    match line.strip_suffix('\r') {
        Some(body) => *line = format!("{}{}\r", body, suffix),
        None => line.push_str(suffix),
    }
    Some(lines.join("\n"))
}

fn missing_name(failure: &Failure) -> Option<String> {
    if let FailureDetail::UndefinedName { name } = &failure.detail {
        return Some(name.clone());
    }
    if let Some(caps) = NAME_RE.captures(&failure.message) {
        return caps.iter().skip(1).flatten().next().map(|m| m.as_str().to_string());
    }
    failure
        .message
        .split_whitespace()
        .last()
        .map(|word| word.trim_matches(|c| c == '\'' || c == '.').to_string())
        .filter(|word| !word.is_empty())
}

/// Every distinct identifier-shaped word in `source`. Coarse on purpose: keywords
/// and names from any scope are included.
pub fn identifiers(source: &str) -> BTreeSet<&str> {
    IDENT_RE.find_iter(source).map(|m| m.as_str()).collect()
}

/// Up to `MAX_CANDIDATES` words from `source` similar to `name`, best first
pub fn close_matches(name: &str, source: &str) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = identifiers(source)
        .into_iter()
        .filter(|candidate| *candidate != name)
        .map(|candidate| (similarity(candidate, name), candidate))
        .filter(|(score, _)| *score >= CANDIDATE_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(a.1)));
    scored
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Ratcliff/Obershelp similarity: twice the number of matched characters over
/// the total length of both strings, in [0, 1]. Not symmetric: `a` is the
/// sequence searched for matching blocks first.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_run(a, b);
    if k == 0 {
        return 0;
    }
    k + matched_chars(&a[..i], &b[..j]) + matched_chars(&a[i + k..], &b[j + k..])
}

/// Longest common substring as (start in a, start in b, length); earliest in `a` wins ties
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceLocation;

    #[test]
    fn similarity_matches_reference_values() {
        assert!((similarity("tot", "total") - 0.75).abs() < 1e-9);
        assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn close_matches_rank_best_first() {
        let source = "int counter = 0;\nint count = 1;\nint amount = 2;";
        let matches = close_matches("coutn", source);
        assert_eq!(matches.first().map(String::as_str), Some("count"));
        assert!(matches.len() <= MAX_CANDIDATES);
    }

    #[test]
    fn similarity_scores_candidate_against_name() {
        // matching blocks depend on which side is scanned first
        assert!((similarity("ccaab", "cabcc") - 0.4).abs() < 1e-9);
        assert!((similarity("cabcc", "ccaab") - 0.6).abs() < 1e-9);
        assert!(close_matches("cabcc", "int ccaab = 1;").is_empty());
    }

    #[test]
    fn structured_type_failures_ignore_message_wording() {
        let f = Failure::type_error("cannot use variable 'x' here");
        assert_eq!(classify(&f), FailureClass::TypeMismatch);
    }

    #[test]
    fn identifiers_include_keywords() {
        let ids = identifiers("int x = 1; print(x);");
        assert!(ids.contains("int"));
        assert!(ids.contains("print"));
        assert!(ids.contains("x"));
    }

    #[test]
    fn text_only_failures_are_still_classified() {
        let foreign = Failure::new(FailureKind::Other, "expected semicol near here");
        assert_eq!(classify(&foreign), FailureClass::MissingSemicolon);
        let foreign = Failure::new(FailureKind::Other, "Expected IDENT, got RPAREN at line 3");
        assert_eq!(classify(&foreign), FailureClass::MissingRParen);
        let foreign = Failure::new(FailureKind::Other, "Unknown variable 'zz' referenced");
        assert_eq!(classify(&foreign), FailureClass::UndefinedName);
    }

    #[test]
    fn first_matching_rule_wins() {
        // expected SEMICOL but found RPAREN: semicolon rule is checked first
        let found = Some(TokenKind::RParen);
        let f = Failure::expected(TokenKind::Semicol, found, SourceLocation::new(1, 9), 1);
        assert_eq!(classify(&f), FailureClass::MissingSemicolon);
    }

    #[test]
    fn lex_failures_fall_back_to_raw_message() {
        let f = Failure::unexpected_char('@', SourceLocation::new(1, 3));
        assert_eq!(explain(&f), format!("Error: {}", f.message));
        assert!(!suggest_fix("x@", &f).has_patch());
    }

    #[test]
    fn name_extracted_from_message_when_unstructured() {
        let f = Failure::new(FailureKind::Name, "Function 'sumall' is not defined");
        assert_eq!(missing_name(&f).as_deref(), Some("sumall"));
        let f = Failure::new(FailureKind::Name, "undefined: 'foo'.");
        assert_eq!(missing_name(&f).as_deref(), Some("foo"));
    }

    #[test]
    fn line_falls_back_to_message_then_one() {
        let f = Failure::new(FailureKind::Parse, "Expected RPAREN somewhere around line 7");
        assert_eq!(referenced_line(&f), 7);
        let f = Failure::new(FailureKind::Parse, "Expected RPAREN");
        assert_eq!(referenced_line(&f), 1);
    }

    #[test]
    fn append_keeps_carriage_return_last() {
        assert_eq!(
            append_to_line("int x = 1\r\nprint(x);", 1, ";").as_deref(),
            Some("int x = 1;\r\nprint(x);")
        );
        assert_eq!(append_to_line("a", 3, ";"), None);
    }

    #[test]
    fn explain_and_suggest_previews_patches() {
        let f = Failure::expected(TokenKind::Semicol, None, SourceLocation::new(1, 9), 1);
        let (explanation, text) = explain_and_suggest("int x = 5", &f);
        assert!(explanation.contains("semicolon"));
        assert!(text.starts_with("Suggested fix: Inserted ';' at end of line 1."));
        assert!(text.ends_with("--- Fixed Code Preview ---\nint x = 5;"));
    }
}
