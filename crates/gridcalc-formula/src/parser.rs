//! Cell input classification and formula parser
//!
//! A recursive descent parser for arithmetic formulas with proper operator
//! precedence. The grammar is
//!
//! ```text
//! expr    := term   (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := number | cellref
//! number  := optional sign, digits, optional '.' and digits
//! cellref := one or more uppercase letters, followed by one or more digits
//! ```
//!
//! Whitespace between tokens is ignored. A sign belongs to a number only when
//! it directly precedes the digits and an operand is expected, so `=2+-3` is
//! valid while `=2+- 3` is not.
//!
//! Every error position is a byte offset into the raw cell input, not into the
//! formula body.

use crate::ast::{BinaryOperator, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};
use gridcalc_core::CellAddress;
use std::collections::BTreeSet;

/// Classified and parsed cell input
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    /// Empty or whitespace-only input
    Empty,
    /// A finite number
    Literal(f64),
    /// Input beginning with `=`
    Formula(FormulaExpr),
}

impl ParsedInput {
    /// Addresses this input reads
    pub fn references(&self) -> BTreeSet<CellAddress> {
        match self {
            ParsedInput::Formula(expr) => expr.references(),
            ParsedInput::Empty | ParsedInput::Literal(_) => BTreeSet::new(),
        }
    }
}

/// Classify raw cell input and parse it
///
/// Input is a formula only when its first character is `=`. Anything else
/// that is not blank must parse as a finite real number once surrounding
/// whitespace is trimmed; exponent forms such as `1e5` or `2.5E-3` are
/// accepted there, unlike inside formulas.
///
/// # Example
/// ```rust
/// use gridcalc_formula::{parse_input, ParsedInput};
///
/// assert_eq!(parse_input("  ").unwrap(), ParsedInput::Empty);
/// assert_eq!(parse_input("-2.5").unwrap(), ParsedInput::Literal(-2.5));
/// assert_eq!(parse_input("1e3").unwrap(), ParsedInput::Literal(1000.0));
/// assert!(matches!(parse_input("=A1+1").unwrap(), ParsedInput::Formula(_)));
/// assert!(parse_input("hello").is_err());
/// ```
pub fn parse_input(raw: &str) -> FormulaResult<ParsedInput> {
    if raw.starts_with('=') {
        return parse_formula(raw).map(ParsedInput::Formula);
    }

    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok(ParsedInput::Empty);
    }

    let start = raw.len() - trimmed.len();
    let literal = trimmed.trim_end();
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(ParsedInput::Literal(value)),
        Ok(_) => Err(FormulaError::parse(start, "number is not finite")),
        Err(_) => Err(literal_error(literal, start)),
    }
}

/// Locate the first offending character of a rejected literal
fn literal_error(literal: &str, start: usize) -> FormulaError {
    let mut lexer = Lexer::new(literal, start);
    match lexer.scan_number() {
        Err(err) => err,
        Ok(_) => FormulaError::parse(
            lexer.position(),
            "input is not a number, a formula, or empty",
        ),
    }
}

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=A1 * 2 - B10").unwrap();
/// assert!(parse_formula("=1+").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let trimmed = formula.trim_start();
    let start = formula.len() - trimmed.len();

    // Formula must start with '='
    let body = trimmed
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::parse(start, "formula must start with '='"))?;

    let tokens = Lexer::new(body, start + 1).tokenize()?;
    let mut parser = FormulaParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    let trailing = parser.current();
    if trailing.kind != TokenKind::Eof {
        return Err(FormulaError::parse(
            trailing.position,
            format!("unexpected {} after expression", trailing.kind.describe()),
        ));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// Unsigned number
    Number(f64),
    CellRef(CellAddress),

    Plus,
    Minus,
    Star,
    Slash,

    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::CellRef(addr) => format!("cell reference {}", addr),
            TokenKind::Plus => "'+'".into(),
            TokenKind::Minus => "'-'".into(),
            TokenKind::Star => "'*'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Byte offset into the raw input
    position: usize,
    /// Byte offset just past the token
    end: usize,
}

/// Token scanner over a slice of the raw input
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Offset of `input` within the raw cell text
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, offset: usize) -> Self {
        Self {
            input,
            pos: 0,
            offset,
        }
    }

    fn tokenize(mut self) -> FormulaResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let position = self.position();

            let Some(c) = self.peek_char() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    position,
                    end: position,
                });
                return Ok(tokens);
            };

            let kind = match c {
                '+' => {
                    self.advance();
                    TokenKind::Plus
                }
                '-' => {
                    self.advance();
                    TokenKind::Minus
                }
                '*' => {
                    self.advance();
                    TokenKind::Star
                }
                '/' => {
                    self.advance();
                    TokenKind::Slash
                }
                c if c.is_ascii_digit() => TokenKind::Number(self.scan_number()?),
                c if c.is_ascii_uppercase() => TokenKind::CellRef(self.scan_cell_ref()?),
                c => {
                    return Err(FormulaError::parse(
                        position,
                        format!("unexpected character '{}'", c),
                    ))
                }
            };

            tokens.push(Token {
                kind,
                position,
                end: self.position(),
            });
        }
    }

    /// Scan `[+-]?digits(.digits)?` and return its finite value
    fn scan_number(&mut self) -> FormulaResult<f64> {
        let start = self.pos;

        if matches!(self.peek_char(), Some('+') | Some('-')) {
            self.advance();
        }

        // Integer part
        if !self.skip_digits() {
            return Err(FormulaError::parse(self.position(), "expected a digit"));
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            if !self.skip_digits() {
                return Err(FormulaError::parse(
                    self.position(),
                    "expected a digit after '.'",
                ));
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str.parse().map_err(|_| {
            FormulaError::parse(self.offset + start, format!("invalid number '{}'", num_str))
        })?;

        if !num.is_finite() {
            return Err(FormulaError::parse(
                self.offset + start,
                format!("number '{}' is out of range", num_str),
            ));
        }

        Ok(num)
    }

    /// Scan `[A-Z]+[0-9]+`
    fn scan_cell_ref(&mut self) -> FormulaResult<CellAddress> {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_uppercase()) {
            self.advance();
        }

        if !self.skip_digits() {
            return Err(FormulaError::parse(
                self.position(),
                "expected row digits in cell reference",
            ));
        }

        let text = &self.input[start..self.pos];
        CellAddress::parse(text).map_err(|e| {
            FormulaError::parse(
                self.offset + start,
                format!("invalid cell reference '{}': {}", text, e),
            )
        })
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    /// Returns whether at least one digit was consumed
    fn skip_digits(&mut self) -> bool {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos > start
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn position(&self) -> usize {
        self.offset + self.pos
    }
}

/// Formula parser
struct FormulaParser {
    tokens: Vec<Token>,
    index: usize,
}

impl FormulaParser {
    /// `tokens` always ends with an `Eof` token
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Primary: signed numbers, cell references

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_factor()?;
            left = FormulaExpr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FormulaResult<FormulaExpr> {
        let token = self.consume();

        match token.kind {
            TokenKind::Number(n) => Ok(FormulaExpr::Number(n)),

            TokenKind::CellRef(addr) => Ok(FormulaExpr::CellRef(addr)),

            TokenKind::Plus | TokenKind::Minus => {
                // A sign is only valid glued to the digits that follow it
                let next = self.peek_signed_operand(&token)?;
                self.consume();
                if token.kind == TokenKind::Minus {
                    Ok(FormulaExpr::Number(-next))
                } else {
                    Ok(FormulaExpr::Number(next))
                }
            }

            other => Err(FormulaError::parse(
                token.position,
                format!(
                    "expected a number or cell reference, found {}",
                    other.describe()
                ),
            )),
        }
    }

    fn peek_signed_operand(&self, sign: &Token) -> FormulaResult<f64> {
        let next = self.current();
        match next.kind {
            TokenKind::Number(n) if next.position == sign.end => Ok(n),
            _ => Err(FormulaError::parse(
                sign.position,
                format!(
                    "sign {} must be directly followed by digits",
                    sign.kind.describe()
                ),
            )),
        }
    }
}
