// File: src/main.rs
//
// Main entry point for the Mend command-line tool.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, check, tokens, ast, repl).

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use mend::assistant;
use mend::config::RepairConfig;
use mend::driver::{FileSource, RepairDriver, RunReport};
use mend::interpreter::Interpreter;
use mend::repl::Repl;
use mend::{lexer, parser, report};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    name = "mend",
    about = "Mend: a tiny language that explains and repairs its own errors",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Config file (defaults to ./mend.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run source files, diagnosing failures and optionally patching them
    Run {
        /// Source files, processed one at a time
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write suggested patches back to the file and retry
        #[arg(long)]
        fix: bool,

        /// Maximum patches applied per file
        #[arg(long)]
        max_attempts: Option<usize>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Trace driver state transitions on stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Diagnose a file without running the repair loop or writing anything
    Check {
        file: PathBuf,
    },

    /// Print the token list of a file
    Tokens {
        file: PathBuf,
    },

    /// Print the parsed program of a file
    Ast {
        file: PathBuf,
    },

    /// Launch interactive Mend REPL
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {}", "error:".bright_red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

/// Returns Ok(false) when the program itself failed
fn dispatch(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = RepairConfig::discover(cli.config.as_deref())?;
    if cli.no_color {
        config.color = false;
    }
    if !config.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Run { files, fix, max_attempts, json, verbose } => {
            if fix {
                config.auto_apply = true;
            }
            if let Some(n) = max_attempts {
                config.max_attempts = n;
            }
            run_files(&files, config, json, verbose)
        }
        Commands::Check { file } => check_file(&file),
        Commands::Tokens { file } => {
            let source = fs::read_to_string(&file)?;
            match lexer::tokenize(&source) {
                Ok(tokens) => {
                    for token in tokens {
                        println!("{}", token);
                    }
                    Ok(true)
                }
                Err(failure) => {
                    eprint!("{}", failure.with_source(&source));
                    Ok(false)
                }
            }
        }
        Commands::Ast { file } => {
            let source = fs::read_to_string(&file)?;
            match parser::parse_source(&source) {
                Ok(program) => {
                    print!("{}", program);
                    Ok(true)
                }
                Err(failure) => {
                    eprint!("{}", failure.with_source(&source));
                    Ok(false)
                }
            }
        }
        Commands::Repl => {
            Repl::new()?.run()?;
            Ok(true)
        }
    }
}

fn run_files(
    files: &[PathBuf],
    config: RepairConfig,
    json: bool,
    verbose: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut reports: Vec<RunReport> = Vec::new();

    for file in files {
        let mut driver = RepairDriver::new(Interpreter::new(), config.clone()).with_trace(verbose);
        let mut source = FileSource::new(file);
        let run = driver.run(&mut source)?;
        if !json {
            print!("{}", report::render(&run));
            if verbose {
                eprintln!("{}", report::render_states(&run).dimmed());
            }
        }
        reports.push(run);
    }

    if json {
        println!("{}", report::to_json(&reports)?);
    }

    Ok(reports.iter().all(RunReport::succeeded))
}

/// Parse and evaluate once, then print the assistant's explanation and suggestion
fn check_file(file: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let result = parser::parse_source(&source).and_then(|program| {
        let mut interp = Interpreter::new();
        interp.eval_stmts(&program.statements).map(|_| ())
    });

    match result {
        Ok(()) => {
            println!("{} {}", "✓".bright_green().bold(), file.display());
            Ok(true)
        }
        Err(failure) => {
            let (explanation, suggestion) = assistant::explain_and_suggest(&source, &failure);
            print!("{}", failure.with_source(&source));
            println!("{}", explanation.bright_yellow());
            println!("{}", suggestion);
            Ok(false)
        }
    }
}
