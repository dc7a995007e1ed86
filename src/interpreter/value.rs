// File: src/interpreter/value.rs
//
// Runtime values for the Mend interpreter.

use crate::ast::{Literal, Stmt};
use std::fmt;
use std::sync::Arc;

/// Runtime values in Mend
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    Str(String),
    Bool(bool),
    /// Declared function: parameter names and shared body
    Function { params: Vec<String>, body: Arc<Vec<Stmt>> },
}

impl Value {
    /// Name of the value's type as written in declarations
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Function { .. } => "func",
        }
    }

    /// Zero value used by declarations without an initializer
    pub fn default_for(declared_type: &str) -> Option<Value> {
        match declared_type {
            "int" => Some(Value::Int(0)),
            "float" => Some(Value::Float(0.0)),
            "bool" => Some(Value::Bool(false)),
            "string" => Some(Value::Str(String::new())),
            _ => None,
        }
    }

    /// Convert to the declared type, promoting int to float.
    /// Returns `None` if the value does not fit.
    pub fn coerce_to(self, declared_type: &str) -> Option<Value> {
        match (declared_type, self) {
            ("int", v @ Value::Int(_)) => Some(v),
            ("float", Value::Int(n)) => Some(Value::Float(n as f64)),
            ("float", v @ Value::Float(_)) => Some(v),
            ("bool", v @ Value::Bool(_)) => Some(v),
            ("string", v @ Value::Str(_)) => Some(v),
            ("func", v @ Value::Function { .. }) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Function { params, .. } => write!(f, "<func({})>", params.join(", ")),
        }
    }
}
