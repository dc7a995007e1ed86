// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Mend language.
// Converts source text into a vector of positioned tokens for parsing.
//
// Supports:
// - Keywords: int, float, bool, string, if, else, while, return, func, print, input, true, false
// - Identifiers, integer and float numbers
// - String literals delimited by " (no escape sequences)
// - Operators: == != <= >= + - * / % = < >
// - Punctuation: ( ) { } ; ,
//
// Tokenizing is eager: the whole source is scanned before parsing starts, and
// the first character that no pattern accepts aborts the scan.

use crate::errors::{Failure, FailureKind, SourceLocation};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Number,
    #[serde(rename = "STRING")]
    Str,
    Ident,
    // Keywords
    Int,
    Float,
    Bool,
    StringType,
    If,
    Else,
    While,
    Return,
    Func,
    Print,
    Input,
    True,
    False,
    Op,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicol,
    Comma,
}

impl TokenKind {
    /// Keywords that start a variable declaration
    pub fn is_type_keyword(self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float | TokenKind::Bool | TokenKind::StringType)
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Number => "NUMBER",
            TokenKind::Str => "STRING",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Bool => "BOOL",
            TokenKind::StringType => "STRING_TYPE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Return => "RETURN",
            TokenKind::Func => "FUNC",
            TokenKind::Print => "PRINT",
            TokenKind::Input => "INPUT",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Op => "OP",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Semicol => "SEMICOL",
            TokenKind::Comma => "COMMA",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reserved words, resolved by exact match after an identifier is scanned
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("int", TokenKind::Int),
        ("float", TokenKind::Float),
        ("bool", TokenKind::Bool),
        ("string", TokenKind::StringType),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("return", TokenKind::Return),
        ("func", TokenKind::Func),
        ("print", TokenKind::Print),
        ("input", TokenKind::Input),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
    ])
});

const TWO_CHAR_OPS: [&str; 4] = ["==", "!=", "<=", ">="];
const ONE_CHAR_OPS: [char; 8] = ['+', '-', '*', '/', '%', '=', '<', '>'];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TokenValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TokenValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenValue::Int(n) => write!(f, "{}", n),
            TokenValue::Float(n) => write!(f, "{:?}", n),
            TokenValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub line: usize,
    pub column: usize,
    /// Line of the token's last character; differs from `line` only for
    /// string literals that span lines
    pub end_line: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Token({}, {}, line={}, col={})", self.kind, self.value, self.line, self.column)
    }
}

/// Tokenizes Mend source code into a vector of tokens.
///
/// Patterns are tried in a fixed priority order at each position: numbers,
/// strings, identifiers and keywords, operators (longest match first),
/// punctuation, newlines and whitespace. Newlines and whitespace produce no
/// token; a newline advances the line counter and resets the column.
///
/// # Errors
/// Returns a `Lex` failure for the first character no pattern accepts, an
/// unterminated string literal, or an integer literal that does not fit in
/// an `i64`. No partial token list is returned.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Failure> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut line_start = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let start = pos;
        let location = SourceLocation::new(line, start - line_start + 1);

        let (kind, value) = match c {
            '0'..='9' => {
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                let is_float =
                    pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit();
                if is_float {
                    pos += 1;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                let value = if is_float {
                    TokenValue::Float(text.parse().map_err(|_| number_failure(&text, location))?)
                } else {
                    TokenValue::Int(text.parse().map_err(|_| number_failure(&text, location))?)
                };
                (TokenKind::Number, value)
            }
            '"' => {
                pos += 1; // skip opening quote
                let body_start = pos;
                let (mut body_line, mut body_line_start) = (line, line_start);
                while pos < chars.len() && chars[pos] != '"' {
                    if chars[pos] == '\n' {
                        body_line += 1;
                        body_line_start = pos + 1;
                    }
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(Failure::unexpected_char('"', location)
                        .with_help("string literal is never closed"));
                }
                let text: String = chars[body_start..pos].iter().collect();
                pos += 1; // skip closing quote
                line = body_line;
                line_start = body_line_start;
                (TokenKind::Str, TokenValue::Text(text))
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_')
                {
                    pos += 1;
                }
                let ident: String = chars[start..pos].iter().collect();
                let kind = KEYWORDS.get(ident.as_str()).copied().unwrap_or(TokenKind::Ident);
                (kind, TokenValue::Text(ident))
            }
            '\n' => {
                pos += 1;
                line += 1;
                line_start = pos;
                continue;
            }
            ' ' | '\t' | '\r' => {
                pos += 1;
                continue;
            }
            '(' | ')' | '{' | '}' | ';' | ',' => {
                pos += 1;
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ';' => TokenKind::Semicol,
                    _ => TokenKind::Comma,
                };
                (kind, TokenValue::Text(c.to_string()))
            }
            _ => {
                let pair: String = chars[pos..chars.len().min(pos + 2)].iter().collect();
                if TWO_CHAR_OPS.contains(&pair.as_str()) {
                    pos += 2;
                    (TokenKind::Op, TokenValue::Text(pair))
                } else if ONE_CHAR_OPS.contains(&c) {
                    pos += 1;
                    (TokenKind::Op, TokenValue::Text(c.to_string()))
                } else {
                    return Err(Failure::unexpected_char(c, location));
                }
            }
        };

        tokens.push(Token {
            kind,
            value,
            line: location.line,
            column: location.column,
            end_line: line,
        });
    }

    Ok(tokens)
}

fn number_failure(text: &str, location: SourceLocation) -> Failure {
    Failure::new(
        FailureKind::Lex,
        format!(
            "Number literal {} out of range at line {}, col {}",
            text, location.line, location.column
        ),
    )
    .at(location)
}
