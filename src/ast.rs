// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Mend language.
// Defines the structure of parsed Mend programs.
//
// The AST is a closed set of node types. Expressions (Expr) represent values
// and computations, while statements (Stmt) represent actions. Nodes are built
// once by the parser and never mutated afterwards.
//
// The Display impls print a program back as normalized source text, which is
// what `mend ast` shows.

use serde::Serialize;
use std::fmt;

/// Literal values that can appear directly in source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// Represents an expression in Mend - something that evaluates to a value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    BinOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binop(left: Expr, op: impl Into<String>, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        }
    }
}

/// Represents a statement in Mend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    VarDecl {
        declared_type: String,
        name: String,
        init: Option<Expr>,
    },
    Assignment {
        name: String,
        value: Expr,
    },
    Print {
        expr: Expr,
    },
    Return {
        expr: Expr,
    },
    FuncDecl {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
}

/// Root of a parsed source file
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{:?}", n),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Identifier(name) => write!(f, "{}", name),
            // Parenthesize nested operands so the left-to-right grouping stays visible
            Expr::BinOp { left, op, right } => {
                match left.as_ref() {
                    Expr::BinOp { .. } => write!(f, "({})", left)?,
                    _ => write!(f, "{}", left)?,
                }
                write!(f, " {} ", op)?;
                match right.as_ref() {
                    Expr::BinOp { .. } => write!(f, "({})", right),
                    _ => write!(f, "{}", right),
                }
            }
        }
    }
}

impl Stmt {
    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        match self {
            Stmt::VarDecl { declared_type, name, init: Some(init) } => {
                writeln!(f, "{}{} {} = {};", pad, declared_type, name, init)
            }
            Stmt::VarDecl { declared_type, name, init: None } => {
                writeln!(f, "{}{} {};", pad, declared_type, name)
            }
            Stmt::Assignment { name, value } => writeln!(f, "{}{} = {};", pad, name, value),
            Stmt::Print { expr } => writeln!(f, "{}print({});", pad, expr),
            Stmt::Return { expr } => writeln!(f, "{}return {};", pad, expr),
            Stmt::FuncDecl { name, params, body } => {
                writeln!(f, "{}func {}({}) {{", pad, name, params.join(", "))?;
                for stmt in body {
                    stmt.write_indented(f, depth + 1)?;
                }
                writeln!(f, "{}}}", pad)
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for stmt in &self.statements {
            stmt.write_indented(f, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_binops_print_with_grouping() {
        let expr = Expr::binop(
            Expr::binop(Expr::Identifier("a".into()), "+", Expr::Identifier("b".into())),
            "*",
            Expr::Literal(Literal::Int(2)),
        );
        assert_eq!(expr.to_string(), "(a + b) * 2");
    }

    #[test]
    fn function_bodies_are_indented() {
        let program = Program::new(vec![Stmt::FuncDecl {
            name: "f".into(),
            params: vec!["a".into(), "b".into()],
            body: vec![Stmt::Return {
                expr: Expr::binop(Expr::Identifier("a".into()), "+", Expr::Identifier("b".into())),
            }],
        }]);
        assert_eq!(program.to_string(), "func f(a, b) {\n    return a + b;\n}\n");
    }
}
