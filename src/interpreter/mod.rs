// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Mend language.
//
// The repair driver only depends on the `Evaluator` trait: take a `Program`,
// run it, and either succeed or return a typed `Failure`. `Interpreter` is the
// reference implementation of that contract:
// - Declarations bind a typed variable (zero value when no initializer)
// - Assignments require a prior declaration and a compatible value
// - print(...) writes the value and a newline to the configured output
// - A top-level return ends the program early
// - Function declarations are bound as values
//
// Failure message formats are part of the contract: undefined names produce
// "Variable '<name>' is not defined", operand mismatches produce a Type failure.

mod control_flow;
mod environment;
mod value;

pub use environment::{Binding, Environment};
pub use value::Value;

use control_flow::ControlFlow;

use crate::ast::{Expr, Program, Stmt};
use crate::errors::Failure;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Anything that can execute a parsed program
pub trait Evaluator {
    /// Execute `program`, stopping at the first failure
    fn evaluate(&mut self, program: &Program) -> Result<(), Failure>;

    /// Forget all state from previous runs
    fn reset(&mut self) {}
}

/// Where `print` output goes
#[derive(Clone, Default)]
enum Output {
    #[default]
    Stdout,
    Buffer(Arc<Mutex<Vec<u8>>>),
}

/// Reference tree-walking evaluator
#[derive(Default)]
pub struct Interpreter {
    pub env: Environment,
    output: Output,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect print output into a shared buffer
    pub fn set_output(&mut self, buffer: Arc<Mutex<Vec<u8>>>) {
        self.output = Output::Buffer(buffer);
    }

    /// Execute statements in order; returns the value of a top-level return, if any
    pub fn eval_stmts(&mut self, stmts: &[Stmt]) -> Result<Option<Value>, Failure> {
        for stmt in stmts {
            if let ControlFlow::Return(value) = self.eval_stmt(stmt)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn eval_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow, Failure> {
        match stmt {
            Stmt::VarDecl { declared_type, name, init } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::default_for(declared_type).ok_or_else(|| {
                        Failure::type_error(format!("unknown type '{}'", declared_type))
                    })?,
                };
                let found = value.type_name();
                let value = value.coerce_to(declared_type).ok_or_else(|| {
                    Failure::type_error(format!(
                        "cannot initialize '{}' ({}) with a {} value",
                        name, declared_type, found
                    ))
                })?;
                self.env.define(name.clone(), declared_type.clone(), value);
            }
            Stmt::Assignment { name, value } => {
                let value = self.eval_expr(value)?;
                let declared_type = match self.env.get(name) {
                    Some(binding) => binding.declared_type.clone(),
                    None => return Err(Failure::undefined_variable(name)),
                };
                let found = value.type_name();
                let value = value.coerce_to(&declared_type).ok_or_else(|| {
                    Failure::type_error(format!(
                        "cannot assign a {} value to '{}' ({})",
                        found, name, declared_type
                    ))
                })?;
                self.env.mutate(name, |binding| binding.value = value);
            }
            Stmt::Print { expr } => {
                let value = self.eval_expr(expr)?;
                self.write_line(&value.to_string())?;
            }
            Stmt::Return { expr } => {
                return Ok(ControlFlow::Return(self.eval_expr(expr)?));
            }
            Stmt::FuncDecl { name, params, body } => {
                let function = Value::Function {
                    params: params.clone(),
                    body: Arc::new(body.clone()),
                };
                self.env.define(name.clone(), "func".to_string(), function);
            }
        }
        Ok(ControlFlow::Next)
    }

    pub fn eval_expr(&self, expr: &Expr) -> Result<Value, Failure> {
        match expr {
            Expr::Literal(lit) => Ok(Value::from(lit)),
            Expr::Identifier(name) => self
                .env
                .get(name)
                .map(|binding| binding.value.clone())
                .ok_or_else(|| Failure::undefined_variable(name)),
            Expr::BinOp { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                binary_op(op, left, right)
            }
        }
    }

    fn write_line(&self, text: &str) -> Result<(), Failure> {
        let result = match &self.output {
            Output::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                writeln!(lock, "{}", text)
            }
            Output::Buffer(buffer) => match buffer.lock() {
                Ok(mut buf) => writeln!(buf, "{}", text),
                Err(_) => return Err(Failure::runtime("Output buffer is poisoned")),
            },
        };
        result.map_err(|e| Failure::runtime(format!("Failed to write output: {}", e)))
    }
}

impl Evaluator for Interpreter {
    fn evaluate(&mut self, program: &Program) -> Result<(), Failure> {
        self.eval_stmts(&program.statements).map(|_| ())
    }

    fn reset(&mut self) {
        self.env.clear();
    }
}

fn binary_op(op: &str, left: Value, right: Value) -> Result<Value, Failure> {
    use Value::*;

    let mismatch = |left: &Value, right: &Value| {
        Failure::type_error(format!(
            "unsupported operand types for '{}': {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))
    };

    match (op, &left, &right) {
        (_, Int(a), Int(b)) if is_arithmetic(op) => int_arithmetic(op, *a, *b),
        (_, Int(_) | Float(_), Int(_) | Float(_)) if is_arithmetic(op) => {
            let (a, b) = (left.as_f64().unwrap_or_default(), right.as_f64().unwrap_or_default());
            float_arithmetic(op, a, b)
        }
        ("+", Str(a), Str(b)) => Ok(Str(format!("{}{}", a, b))),
        ("==" | "!=", _, _) => {
            let equal = match (&left, &right) {
                (Int(_) | Float(_), Int(_) | Float(_)) => left.as_f64() == right.as_f64(),
                (Str(a), Str(b)) => a == b,
                (Bool(a), Bool(b)) => a == b,
                _ => return Err(mismatch(&left, &right)),
            };
            Ok(Bool(if op == "==" { equal } else { !equal }))
        }
        ("<" | ">" | "<=" | ">=", _, _) => {
            let ordering = match (&left, &right) {
                (Int(a), Int(b)) => a.partial_cmp(b),
                (Int(_) | Float(_), Int(_) | Float(_)) => {
                    left.as_f64().partial_cmp(&right.as_f64())
                }
                (Str(a), Str(b)) => a.partial_cmp(b),
                _ => return Err(mismatch(&left, &right)),
            };
            let Some(ordering) = ordering else {
                return Ok(Bool(false));
            };
            Ok(Bool(match op {
                "<" => ordering.is_lt(),
                ">" => ordering.is_gt(),
                "<=" => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
        ("=", _, _) => Err(Failure::type_error("'=' cannot be used inside an expression")),
        _ => Err(mismatch(&left, &right)),
    }
}

fn is_arithmetic(op: &str) -> bool {
    matches!(op, "+" | "-" | "*" | "/" | "%")
}

fn int_arithmetic(op: &str, a: i64, b: i64) -> Result<Value, Failure> {
    if matches!(op, "/" | "%") && b == 0 {
        return Err(Failure::runtime("Division by zero"));
    }
    let result = match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| Failure::runtime(format!("Integer overflow in {} {} {}", a, op, b)))
}

fn float_arithmetic(op: &str, a: f64, b: f64) -> Result<Value, Failure> {
    if matches!(op, "/" | "%") && b == 0.0 {
        return Err(Failure::runtime("Division by zero"));
    }
    Ok(Value::Float(match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        _ => a % b,
    }))
}
