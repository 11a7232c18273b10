//! Reads the text produced by `Program`'s `Display` impl back into a
//! [`Program`].
//!
//! Grammar (whitespace-insensitive, `*` binds tighter than `+`/`-`, both
//! levels left-associative):
//!
//! ```text
//! program := "fn" IDENT "(" params ")" "->" "[" "i64" ";" INT "]"
//!            "{" let* "[" idents "]" "}"
//! params  := (IDENT ":" "i64") ("," IDENT ":" "i64")* ","?
//! let     := "let" IDENT "=" expr ";"
//! expr    := term (("+" | "-") term)*
//! term    := factor ("*" factor)*
//! factor  := IDENT | "(" expr ")"
//! ```

use super::node::{Node, Operator};
use super::program::{Assignment, Program};
use crate::error::{GpError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(usize),
    Punct(char),
    Arrow,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Ident(name) => format!("`{name}`"),
        Tok::Int(n) => format!("`{n}`"),
        Tok::Punct(c) => format!("`{c}`"),
        Tok::Arrow => "`->`".into(),
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
        } else if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                tok: Tok::Ident(ident),
                line,
            });
        } else if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let value = digits.parse::<usize>().map_err(|_| GpError::Parse {
                line,
                message: format!("integer literal `{digits}` is too large"),
            })?;
            tokens.push(Token {
                tok: Tok::Int(value),
                line,
            });
        } else if c == '-' {
            chars.next();
            let tok = if chars.peek() == Some(&'>') {
                chars.next();
                Tok::Arrow
            } else {
                Tok::Punct('-')
            };
            tokens.push(Token { tok, line });
        } else if "()[]{},:;=+*".contains(c) {
            chars.next();
            tokens.push(Token {
                tok: Tok::Punct(c),
                line,
            });
        } else {
            return Err(GpError::Parse {
                line,
                message: format!("unexpected character `{c}`"),
            });
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    inputs: HashSet<String>,
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(GpError::Parse {
            line: self.line(),
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek() == Some(&Tok::Punct(c))
    }

    fn expect(&mut self, expected: Tok) -> Result<()> {
        match self.peek() {
            Some(tok) if *tok == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => {
                let found = describe(tok);
                self.error(format!("expected {}, found {found}", describe(&expected)))
            }
            None => self.error(format!("expected {}, found end of input", describe(&expected))),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        self.expect(Tok::Punct(c))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        self.expect(Tok::Ident(keyword.to_string()))
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.advance() {
            Some(Tok::Ident(name)) => Ok(name),
            Some(tok) => {
                self.pos -= 1;
                self.error(format!("expected identifier, found {}", describe(&tok)))
            }
            None => self.error("expected identifier, found end of input"),
        }
    }

    fn expect_int(&mut self) -> Result<usize> {
        match self.advance() {
            Some(Tok::Int(n)) => Ok(n),
            Some(tok) => {
                self.pos -= 1;
                self.error(format!("expected integer, found {}", describe(&tok)))
            }
            None => self.error("expected integer, found end of input"),
        }
    }

    fn program(&mut self) -> Result<Program> {
        self.expect_keyword("fn")?;
        self.expect_ident()?;
        let inputs = self.params()?;
        self.expect(Tok::Arrow)?;
        self.expect_punct('[')?;
        self.expect_keyword("i64")?;
        self.expect_punct(';')?;
        let declared = self.expect_int()?;
        self.expect_punct(']')?;
        self.expect_punct('{')?;

        let mut assignments: Vec<Assignment> = Vec::new();
        while self.peek() == Some(&Tok::Ident("let".into())) {
            self.pos += 1;
            let output = self.expect_ident()?;
            if self.inputs.contains(&output) {
                return self.error(format!("output `{output}` shadows an input"));
            }
            if assignments.iter().any(|a| a.output == output) {
                return self.error(format!("output `{output}` assigned twice"));
            }
            self.expect_punct('=')?;
            let expr = self.expr()?;
            self.expect_punct(';')?;
            assignments.push(Assignment::new(output, expr));
        }

        self.expect_punct('[')?;
        let mut returned = Vec::new();
        if !self.at_punct(']') {
            returned.push(self.expect_ident()?);
            while self.at_punct(',') {
                self.pos += 1;
                returned.push(self.expect_ident()?);
            }
        }
        self.expect_punct(']')?;
        self.expect_punct('}')?;
        if let Some(tok) = self.peek() {
            let found = describe(tok);
            return self.error(format!("unexpected trailing {found}"));
        }

        let outputs: Vec<&str> = assignments.iter().map(|a| a.output.as_str()).collect();
        if returned != outputs {
            return self.error(format!(
                "returned [{}] does not match assigned outputs [{}]",
                returned.join(", "),
                outputs.join(", ")
            ));
        }
        if declared != assignments.len() {
            return self.error(format!(
                "signature declares {declared} outputs but {} are assigned",
                assignments.len()
            ));
        }

        Ok(Program::new(inputs, assignments))
    }

    fn params(&mut self) -> Result<Vec<String>> {
        self.expect_punct('(')?;
        let mut inputs = Vec::new();
        while !self.at_punct(')') {
            let name = self.expect_ident()?;
            self.expect_punct(':')?;
            self.expect_keyword("i64")?;
            if !self.inputs.insert(name.clone()) {
                return self.error(format!("duplicate input `{name}`"));
            }
            inputs.push(name);
            if self.at_punct(',') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expect_punct(')')?;
        Ok(inputs)
    }

    fn expr(&mut self) -> Result<Node> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Punct('+')) => Operator::Add,
                Some(Tok::Punct('-')) => Operator::Subtract,
                _ => return Ok(node),
            };
            self.pos += 1;
            let rhs = self.term()?;
            node = Node::binary(op, node, rhs);
        }
    }

    fn term(&mut self) -> Result<Node> {
        let mut node = self.factor()?;
        while self.at_punct('*') {
            self.pos += 1;
            let rhs = self.factor()?;
            node = Node::mul(node, rhs);
        }
        Ok(node)
    }

    fn factor(&mut self) -> Result<Node> {
        if self.at_punct('(') {
            self.pos += 1;
            let node = self.expr()?;
            self.expect_punct(')')?;
            return Ok(node);
        }
        let name = self.expect_ident()?;
        if !self.inputs.contains(&name) {
            self.pos -= 1;
            return self.error(format!("unknown variable `{name}`"));
        }
        Ok(Node::Variable(name))
    }
}

/// Parses program source text.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        inputs: HashSet::new(),
    };
    parser.program()
}
