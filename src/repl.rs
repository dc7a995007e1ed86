// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Mend language.
// Provides an interactive shell with:
// - Multi-line input: an unclosed brace or parenthesis continues on the next line
// - Command history and line editing
// - Special commands (:help, :quit, :clear, :vars, :reset, :fix)
// - Persistent variables across inputs
// - Every failure explained by the diagnostic assistant; :fix runs the
//   suggested patch of the last failed input

use crate::assistant;
use crate::interpreter::Interpreter;
use crate::parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL session that maintains interpreter state and handles user interaction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
    pending_fix: Option<String>,
}

impl Repl {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { interpreter: Interpreter::new(), editor, pending_fix: None })
    }

    fn show_banner(&self) {
        println!("{}", format!("Mend REPL v{}", env!("CARGO_PKG_VERSION")).bright_cyan().bold());
        println!(
            "  {} Use {} for commands or {} to exit",
            "Welcome!".bright_green(),
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "mend> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        let input = std::mem::take(&mut buffer);
                        self.eval_input(&input);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (:quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "\nGoodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles special REPL commands starting with ':'
    /// Returns true to continue REPL, false to quit
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                return false;
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
            }
            ":vars" | ":v" => self.show_variables(),
            ":reset" | ":r" => {
                self.interpreter = Interpreter::new();
                self.pending_fix = None;
                println!("{}", "✓ Environment reset".bright_green());
            }
            ":fix" | ":f" => match self.pending_fix.take() {
                Some(fixed) => {
                    println!("{}", fixed.dimmed());
                    self.eval_input(&fixed);
                }
                None => println!("{}", "No suggested fix to apply".dimmed()),
            },
            _ => println!(
                "{} Unknown command: {}. Type {} for available commands.",
                "Error:".bright_red(),
                cmd.bright_yellow(),
                ":help".bright_yellow()
            ),
        }
        true
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q ".dimmed());
        println!("  {}{}  Clear the screen", ":clear".bright_yellow(), " or :c".dimmed());
        println!("  {}{}  Show declared variables", ":vars".bright_yellow(), " or :v ".dimmed());
        println!("  {}{}  Reset environment", ":reset".bright_yellow(), " or :r".dimmed());
        println!(
            "  {}{}  Run the suggested fix for the last error",
            ":fix".bright_yellow(),
            " or :f  ".dimmed()
        );
        println!();
        println!("{}", "Examples:".bright_cyan().bold());
        println!("  {}", "mend> int total = 40 + 2;".dimmed());
        println!("  {}", "mend> print(total);".dimmed());
        println!();
    }

    fn show_variables(&self) {
        let vars = self.interpreter.env.visible();
        if vars.is_empty() {
            println!("  {}", "(no variables declared)".dimmed());
            return;
        }
        for (name, binding) in vars {
            println!(
                "  {} {} = {}",
                binding.declared_type.bright_blue(),
                name.bright_yellow(),
                binding.value
            );
        }
    }

    /// Parses and runs one complete input against the persistent environment
    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        let result = parser::parse_source(input)
            .and_then(|program| self.interpreter.eval_stmts(&program.statements));

        match result {
            Ok(Some(value)) => println!("{} {}", "=>".bright_blue(), value),
            Ok(None) => {}
            Err(failure) => {
                let diagnosis = assistant::diagnose(input, &failure);
                print!("{}", failure.with_source(input));
                println!("   {} {}", "why:".bright_yellow(), diagnosis.explanation);
                println!("   {} {}", "fix:".bright_yellow(), diagnosis.suggestion.description);
                if diagnosis.suggestion.has_patch() {
                    println!("   {}", "type :fix to run the suggested fix".dimmed());
                }
                self.pending_fix = diagnosis.suggestion.new_source;
            }
        }
    }
}

/// True once braces and parentheses outside string literals are balanced
pub fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;

    for ch in input.trim().chars() {
        match ch {
            '"' => in_string = !in_string,
            '{' | '(' if !in_string => depth += 1,
            '}' | ')' if !in_string => depth -= 1,
            _ => {}
        }
    }

    !in_string && depth <= 0
}
