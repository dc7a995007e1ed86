// File: src/interpreter/control_flow.rs
//
// Control flow signals for statement execution.
//
// After each statement the interpreter checks the signal to decide whether to
// keep going or unwind (a top-level `return` ends the program early).

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    /// Normal execution, continue to next statement
    Next,
    /// Return statement encountered with its value
    Return(Value),
}
