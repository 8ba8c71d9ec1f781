//! Expression parser for unit expressions.
//!
//! Supports:
//! - Numbers (integers, floats, scientific notation)
//! - Symbol and binding names (`kg`, `u_E`, `mu0`)
//! - Arithmetic operators (+, -, *, /, ^)
//! - Parentheses for grouping
//! - Single-argument function calls (sqrt, abs, sin, ...)
//! - The constant `pi`

use std::iter::Peekable;
use std::str::Chars;

/// Parse error with location info
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Shift the position when the parsed text was a slice of a longer line
    pub(crate) fn offset(mut self, by: usize) -> Self {
        self.position += by;
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Named numeric constants understood by the parser
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Pi,
}

impl Constant {
    pub fn value(&self) -> f64 {
        match self {
            Self::Pi => std::f64::consts::PI,
        }
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Reference to a declared symbol or an earlier binding
    Symbol(String),
    Constant(Constant),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    FnCall {
        name: String,
        arg: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Eof,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let pos = self.position;
        let Some(&c) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        if c.is_ascii_digit() || c == '.' {
            self.read_number()
        } else if c.is_ascii_alphabetic() || c == '_' {
            Ok(Token::Identifier(self.read_identifier()))
        } else {
            Err(ParseError::new(format!("Unexpected character: '{}'", c), pos))
        }
    }

    fn advance(&mut self) -> Option<char> {
        self.position += 1;
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                into.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let pos = self.position;
        let mut num_str = String::new();

        self.read_digits(&mut num_str);
        if self.chars.peek() == Some(&'.') {
            num_str.push('.');
            self.advance();
            self.read_digits(&mut num_str);
        }

        // Scientific notation (1e10, 1.5e-3)
        if let Some(&c) = self.chars.peek() {
            if c == 'e' || c == 'E' {
                num_str.push(c);
                self.advance();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        num_str.push(sign);
                        self.advance();
                    }
                }
                self.read_digits(&mut num_str);
            }
        }

        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::new(format!("Invalid number: '{}'", num_str), pos))
    }

    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.lexer.position)
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_additive()?;
        if self.current != Token::Eof {
            return Err(self.error(format!(
                "Unexpected token after expression: {:?}",
                self.current
            )));
        }
        Ok(expr)
    }

    // Additive: term (('+' | '-') term)*
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    // Multiplicative: unary (('*' | '/') unary)*
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    // Unary: '-' unary | power
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.current == Token::Minus {
            self.advance()?;
            let operand = self.parse_unary()?;
            Ok(Expr::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(operand),
            })
        } else {
            self.parse_power()
        }
    }

    // Power: primary ('^' unary)?
    // The exponent goes through unary so `10^-7` parses and `^` stays right associative.
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;

        if self.current == Token::Caret {
            self.advance()?;
            let exp = self.parse_unary()?;
            Ok(Expr::BinaryOp {
                op: BinaryOperator::Pow,
                left: Box::new(base),
                right: Box::new(exp),
            })
        } else {
            Ok(base)
        }
    }

    // Primary: number | name | constant | function_call | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match &self.current {
            Token::Number(n) => {
                let val = *n;
                self.advance()?;
                Ok(Expr::Number(val))
            }
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;

                if self.current == Token::LParen {
                    self.advance()?;
                    let arg = self.parse_additive()?;
                    if self.current != Token::RParen {
                        return Err(self.error("Expected ')' after function argument"));
                    }
                    self.advance()?;
                    return Ok(Expr::FnCall {
                        name,
                        arg: Box::new(arg),
                    });
                }

                match name.as_str() {
                    "pi" | "PI" => Ok(Expr::Constant(Constant::Pi)),
                    _ => Ok(Expr::Symbol(name)),
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_additive()?;
                if self.current != Token::RParen {
                    return Err(self.error("Expected ')'"));
                }
                self.advance()?;
                Ok(expr)
            }
            _ => Err(self.error(format!("Unexpected token: {:?}", self.current))),
        }
    }
}

/// Parse an expression string into an AST
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new("Empty expression", 0));
    }
    let mut parser = Parser::new(input)?;
    parser.parse()
}

/// Built-in constants and functions; these names cannot be declared or bound
pub const RESERVED_NAMES: &[&str] = &[
    "pi", "PI", "sqrt", "abs", "sin", "cos", "tan", "exp", "ln", "log10",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// True if `name` is a valid symbol or binding name
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
