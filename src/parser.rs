// File: src/parser.rs
//
// Recursive descent parser for the Mend language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// Grammar:
//   program     ::= { statement }
//   statement   ::= var_decl | assignment | print_stmt | return_stmt | func_decl
//   var_decl    ::= TYPE_KEYWORD IDENT [ '=' expr ] ';'
//   assignment  ::= IDENT '=' expr ';'
//   print_stmt  ::= 'print' '(' expr ')' ';'
//   return_stmt ::= 'return' expr ';'
//   func_decl   ::= 'func' IDENT '(' [ IDENT { ',' IDENT } ] ')' '{' { statement } '}'
//   expr        ::= term { OP term }
//   term        ::= NUMBER | STRING | IDENT | 'true' | 'false' | '(' expr ')'
//
// All binary operators share one precedence level and associate to the left.
// The parser uses a single-token lookahead, never backtracks, and stops at the
// first grammar violation.

use crate::ast::{Expr, Literal, Program, Stmt};
use crate::errors::{Failure, FailureDetail, FailureKind, SourceLocation};
use crate::lexer::{self, Token, TokenKind, TokenValue};

/// Parser maintains position in token stream and provides methods to parse statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Tokenize and parse `source` in one step
pub fn parse_source(source: &str) -> Result<Program, Failure> {
    let tokens = lexer::tokenize(source)?;
    Parser::new(tokens).parse_program()
}

/// Parse an already tokenized program
pub fn parse_program(tokens: Vec<Token>) -> Result<Program, Failure> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    /// Where a failure at the current position should point: the current
    /// token, or the last token once input is exhausted
    fn here(&self) -> SourceLocation {
        self.current()
            .or_else(|| self.tokens.last())
            .map(Token::location)
            .unwrap_or_else(|| SourceLocation::new(1, 1))
    }

    /// Line where the last consumed token ends
    fn anchor_line(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end_line)
            .unwrap_or(1)
    }

    /// Consume and return the current token, whatever its kind
    fn advance(&mut self) -> Result<Token, Failure> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                Ok(tok.clone())
            }
            None => Err(Failure::unexpected_token(None, self.here())),
        }
    }

    /// Consume the current token, requiring it to be of `expected` kind
    fn eat(&mut self, expected: TokenKind) -> Result<Token, Failure> {
        match self.current_kind() {
            Some(kind) if kind == expected => self.advance(),
            found => Err(Failure::expected(expected, found, self.here(), self.anchor_line())),
        }
    }

    fn eat_name(&mut self) -> Result<String, Failure> {
        let tok = self.eat(TokenKind::Ident)?;
        Ok(text_of(tok))
    }

    /// Parse the entire token stream into a program
    pub fn parse_program(&mut self) -> Result<Program, Failure> {
        let mut statements = Vec::new();
        while self.current().is_some() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program::new(statements))
    }

    fn parse_statement(&mut self) -> Result<Stmt, Failure> {
        match self.current_kind() {
            Some(kind) if kind.is_type_keyword() => self.parse_var_decl(),
            Some(TokenKind::Ident) => self.parse_assignment(),
            Some(TokenKind::Print) => self.parse_print(),
            Some(TokenKind::Func) => self.parse_func_decl(),
            Some(TokenKind::Return) => self.parse_return(),
            found => Err(Failure::unexpected_token(found, self.here())),
        }
    }

    fn at_assign_op(&self) -> bool {
        matches!(
            self.current(),
            Some(t) if t.kind == TokenKind::Op && t.value.as_text() == Some("=")
        )
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Failure> {
        let declared_type = text_of(self.advance()?);
        let name = self.eat_name()?;
        let init = if self.at_assign_op() {
            self.advance()?;
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.eat(TokenKind::Semicol)?;
        Ok(Stmt::VarDecl { declared_type, name, init })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, Failure> {
        let name = self.eat_name()?;
        if !self.at_assign_op() {
            let location = self.here();
            let op = self.eat(TokenKind::Op)?;
            return Err(Failure::new(
                FailureKind::Parse,
                format!(
                    "Expected '=' after '{}', got OP '{}' at line {}",
                    name, op.value, location.line
                ),
            )
            .at(location)
            .with_detail(FailureDetail::Unexpected { found: Some(TokenKind::Op) }));
        }
        self.advance()?;
        let value = self.parse_expr()?;
        self.eat(TokenKind::Semicol)?;
        Ok(Stmt::Assignment { name, value })
    }

    fn parse_print(&mut self) -> Result<Stmt, Failure> {
        self.eat(TokenKind::Print)?;
        self.eat(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::Semicol)?;
        Ok(Stmt::Print { expr })
    }

    fn parse_return(&mut self) -> Result<Stmt, Failure> {
        self.eat(TokenKind::Return)?;
        let expr = self.parse_expr()?;
        self.eat(TokenKind::Semicol)?;
        Ok(Stmt::Return { expr })
    }

    fn parse_func_decl(&mut self) -> Result<Stmt, Failure> {
        self.eat(TokenKind::Func)?;
        let name = self.eat_name()?;
        self.eat(TokenKind::LParen)?;

        let mut params: Vec<String> = Vec::new();
        if self.current_kind() != Some(TokenKind::RParen) {
            loop {
                let location = self.here();
                let param = self.eat_name()?;
                if params.contains(&param) {
                    return Err(Failure::new(
                        FailureKind::Parse,
                        format!(
                            "Duplicate parameter '{}' in function '{}' at line {}",
                            param, name, location.line
                        ),
                    )
                    .at(location)
                    .with_detail(FailureDetail::DuplicateParam { name: param }));
                }
                params.push(param);
                if self.current_kind() == Some(TokenKind::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::LBrace)?;

        let mut body = Vec::new();
        while matches!(self.current_kind(), Some(kind) if kind != TokenKind::RBrace) {
            body.push(self.parse_statement()?);
        }
        self.eat(TokenKind::RBrace)?;
        Ok(Stmt::FuncDecl { name, params, body })
    }

    /// Fold `term { OP term }` into a left-associative chain
    fn parse_expr(&mut self) -> Result<Expr, Failure> {
        let mut left = self.parse_term()?;
        while self.current_kind() == Some(TokenKind::Op) {
            let op = text_of(self.advance()?);
            let right = self.parse_term()?;
            left = Expr::binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, Failure> {
        match self.current_kind() {
            Some(TokenKind::Number) => match self.advance()?.value {
                TokenValue::Int(n) => Ok(Expr::Literal(Literal::Int(n))),
                TokenValue::Float(n) => Ok(Expr::Literal(Literal::Float(n))),
                TokenValue::Text(s) => Ok(Expr::Literal(Literal::Str(s))),
            },
            Some(TokenKind::Str) => Ok(Expr::Literal(Literal::Str(text_of(self.advance()?)))),
            Some(TokenKind::Ident) => Ok(Expr::Identifier(text_of(self.advance()?))),
            Some(TokenKind::True) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            Some(TokenKind::False) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            Some(TokenKind::LParen) => {
                self.advance()?;
                let expr = self.parse_expr()?;
                self.eat(TokenKind::RParen)?;
                Ok(expr)
            }
            found => Err(Failure::unexpected_token(found, self.here())),
        }
    }
}

fn text_of(tok: Token) -> String {
    match tok.value {
        TokenValue::Text(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    fn parse_err(source: &str) -> Failure {
        parse_source(source).unwrap_err()
    }

    #[test]
    fn chain_folds_left_associative() {
        let program = parse_source("x = a + b + c;").unwrap();
        let expected = Expr::binop(Expr::binop(ident("a"), "+", ident("b")), "+", ident("c"));
        assert_eq!(
            program.statements,
            vec![Stmt::Assignment { name: "x".into(), value: expected }]
        );
    }

    #[test]
    fn comparison_binds_like_arithmetic() {
        let program = parse_source("bool b = 1 < 2 + 3;").unwrap();
        let Stmt::VarDecl { init: Some(init), .. } = &program.statements[0] else {
            panic!("expected declaration");
        };
        let expected = Expr::binop(
            Expr::binop(Expr::Literal(Literal::Int(1)), "<", Expr::Literal(Literal::Int(2))),
            "+",
            Expr::Literal(Literal::Int(3)),
        );
        assert_eq!(init, &expected);
    }

    #[test]
    fn parentheses_regroup() {
        let program = parse_source("x = a - (b - c);").unwrap();
        let expected = Expr::binop(ident("a"), "-", Expr::binop(ident("b"), "-", ident("c")));
        assert_eq!(program.statements[0], Stmt::Assignment { name: "x".into(), value: expected });
    }

    #[test]
    fn declaration_without_initializer() {
        let program = parse_source("float f;").unwrap();
        assert_eq!(
            program.statements[0],
            Stmt::VarDecl { declared_type: "float".into(), name: "f".into(), init: None }
        );
    }

    #[test]
    fn function_declaration_with_body() {
        let program = parse_source("func add(a, b) {\n  int c = a + b;\n  return c;\n}").unwrap();
        match &program.statements[0] {
            Stmt::FuncDecl { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(body.len(), 2);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn bool_literals_are_terms() {
        let program = parse_source("bool ok = true;").unwrap();
        assert_eq!(
            program.statements[0],
            Stmt::VarDecl {
                declared_type: "bool".into(),
                name: "ok".into(),
                init: Some(Expr::Literal(Literal::Bool(true))),
            }
        );
    }

    #[test]
    fn missing_semicolon_reports_next_token_and_anchor() {
        let err = parse_err("int x = 5\nprint(x);");
        assert_eq!(err.message, "Expected SEMICOL, got PRINT at line 2");
        assert_eq!(
            err.detail,
            FailureDetail::Expected {
                expected: TokenKind::Semicol,
                found: Some(TokenKind::Print),
                anchor_line: 1,
            }
        );
    }

    #[test]
    fn anchor_follows_multiline_string_to_its_last_line() {
        let err = parse_err("string s = \"a\nb\"\nprint(s);");
        assert!(matches!(err.detail, FailureDetail::Expected { anchor_line: 2, .. }));
    }

    #[test]
    fn missing_semicolon_at_end_of_input() {
        let err = parse_err("int x = 5");
        assert_eq!(err.message, "Expected SEMICOL, got EOF at line 1");
    }

    #[test]
    fn unclosed_block_expects_rbrace() {
        let err = parse_err("func f() {\n  print(1);\n");
        assert_eq!(err.message, "Expected RBRACE, got EOF at line 2");
    }

    #[test]
    fn unknown_leading_token() {
        let err = parse_err("int x;\nwhile");
        assert_eq!(err.message, "Unexpected token WHILE at line 2");
    }

    #[test]
    fn term_position_rejects_punctuation() {
        let err = parse_err("x = ;");
        assert_eq!(err.message, "Unexpected token SEMICOL at line 1");
    }

    #[test]
    fn assignment_requires_plain_equals() {
        let err = parse_err("x + 1;");
        assert_eq!(err.message, "Expected '=' after 'x', got OP '+' at line 1");
        assert_eq!(err.kind, FailureKind::Parse);
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let err = parse_err("func f(a, a) { return a; }");
        assert_eq!(err.detail, FailureDetail::DuplicateParam { name: "a".into() });
    }

    #[test]
    fn empty_source_is_empty_program() {
        assert!(parse_source("  \n\n").unwrap().is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "int a = 1;\nfunc f(x) { return x * 2; }\nprint(a + 2 * 3);";
        assert_eq!(parse_source(source).unwrap(), parse_source(source).unwrap());
    }
}
