// File: src/lib.rs
//
// Library interface for Mend.
// Exposes the language pipeline (lexer, parser, interpreter), the diagnostic
// assistant and the repair driver for the CLI and integration tests.

pub mod assistant;
pub mod ast;
pub mod config;
pub mod driver;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod report;
