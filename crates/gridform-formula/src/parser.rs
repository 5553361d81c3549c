//! Formula parser
//!
//! A recursive descent parser with precedence climbing. There is no separate tokenizer: a
//! single cursor scans characters and builds AST nodes directly.
//!
//! Precedence (lowest to highest):
//! 1. Comparison: `=`, `!=`, `<`, `<=`, `>`, `>=`
//! 2. Additive and concatenation: `+`, `-`, `&`
//! 3. Multiplicative: `*`, `/`, `%`
//! 4. Exponentiation: `^` (right associative)
//! 5. Prefix unary: `-`, `+`, `!`
//! 6. Primary: literals, `{Field}` references, function calls, parentheses

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::ParseError;
use gridform_core::Value;
use std::collections::BTreeSet;

/// Outcome of parsing a formula
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Parsed tree, if parsing succeeded
    pub ast: Option<FormulaExpr>,
    /// Every `{Field}` referenced in the source, including those scanned before a syntax
    /// error
    pub dependencies: BTreeSet<String>,
    /// Syntax error, if parsing failed
    pub error: Option<ParseError>,
}

impl ParseResult {
    /// Check if the formula parsed successfully
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.ast.is_some()
    }

    /// Convert into the tree and its dependencies, or the syntax error
    pub fn into_result(self) -> Result<(FormulaExpr, BTreeSet<String>), ParseError> {
        match (self.ast, self.error) {
            (Some(ast), None) => Ok((ast, self.dependencies)),
            (_, Some(err)) => Err(err),
            (None, None) => Err(ParseError::UnexpectedEnd),
        }
    }
}

/// Parse a formula string.
///
/// Never fails outright: syntax errors are reported in [`ParseResult::error`].
///
/// # Example
/// ```rust
/// use gridform_formula::parse;
///
/// let result = parse("{Price} * {Quantity}");
/// assert!(result.is_valid());
/// assert!(result.dependencies.contains("Price"));
///
/// let result = parse("IF({Score} >= 90, \"A\"");
/// assert!(!result.is_valid());
/// assert!(result.dependencies.contains("Score"));
/// ```
pub fn parse(formula: &str) -> ParseResult {
    let mut parser = FormulaParser::new(formula);
    let outcome = parser.parse_formula();

    match outcome {
        Ok(ast) => ParseResult {
            ast: Some(ast),
            dependencies: parser.dependencies,
            error: None,
        },
        Err(err) => ParseResult {
            ast: None,
            dependencies: parser.dependencies,
            error: Some(err),
        },
    }
}

type ParseOutcome<T> = Result<T, ParseError>;

/// Deepest expression tree the parser builds. Groupings, calls, prefix operators and each
/// operator in a chain all count as one level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parser state for one parse call
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    dependencies: BTreeSet<String>,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            dependencies: BTreeSet::new(),
        }
    }

    fn parse_formula(&mut self) -> ParseOutcome<FormulaExpr> {
        let expr = self.parse_comparison()?;

        // Make sure we consumed all input
        self.skip_whitespace();
        match self.peek_char() {
            None => Ok(expr),
            Some(c) => Err(self.unexpected(c)),
        }
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

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Skip whitespace, then consume `symbol` if it comes next
    fn eat(&mut self, symbol: &str) -> bool {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(symbol) {
            self.pos += symbol.len();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, character: char) -> ParseError {
        ParseError::UnexpectedCharacter {
            character,
            position: self.pos,
        }
    }

    /// Enter one more level of the tree
    fn descend(&mut self) -> ParseOutcome<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeeplyNested { position: self.pos });
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_closing_paren(&mut self) -> ParseOutcome<()> {
        if self.eat(")") {
            Ok(())
        } else {
            Err(ParseError::ExpectedClosingParen { position: self.pos })
        }
    }

    // === Expression parsing with precedence ===

    fn parse_comparison(&mut self) -> ParseOutcome<FormulaExpr> {
        let base = self.depth;
        let mut left = self.parse_additive()?;

        loop {
            // Two-character operators first
            let op = if self.eat("<=") {
                BinaryOperator::LessEqual
            } else if self.eat(">=") {
                BinaryOperator::GreaterEqual
            } else if self.eat("!=") {
                BinaryOperator::NotEqual
            } else if self.eat("<") {
                BinaryOperator::LessThan
            } else if self.eat(">") {
                BinaryOperator::GreaterThan
            } else if self.eat("=") {
                BinaryOperator::Equal
            } else {
                break;
            };

            self.descend()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseOutcome<FormulaExpr> {
        let base = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = if self.eat("+") {
                BinaryOperator::Add
            } else if self.eat("-") {
                BinaryOperator::Subtract
            } else if self.eat("&") {
                BinaryOperator::Concat
            } else {
                break;
            };

            self.descend()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseOutcome<FormulaExpr> {
        let base = self.depth;
        let mut left = self.parse_power()?;

        loop {
            let op = if self.eat("*") {
                BinaryOperator::Multiply
            } else if self.eat("/") {
                BinaryOperator::Divide
            } else if self.eat("%") {
                BinaryOperator::Modulo
            } else {
                break;
            };

            self.descend()?;
            let right = self.parse_power()?;
            left = binary(op, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_power(&mut self) -> ParseOutcome<FormulaExpr> {
        let left = self.parse_unary()?;

        if self.eat("^") {
            self.descend()?;
            let right = self.parse_power()?; // Right associative
            self.depth -= 1;
            return Ok(binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseOutcome<FormulaExpr> {
        let op = if self.eat("-") {
            UnaryOperator::Negate
        } else if self.eat("+") {
            UnaryOperator::Plus
        } else if self.eat("!") {
            UnaryOperator::Not
        } else {
            return self.parse_primary();
        };

        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(FormulaExpr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> ParseOutcome<FormulaExpr> {
        self.skip_whitespace();

        match self.peek_char() {
            None => Err(ParseError::UnexpectedEnd),
            Some(c) if c.is_ascii_digit() => Ok(self.parse_number()),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some('{') => self.parse_field_reference(),
            Some('(') => {
                self.advance();
                self.descend()?;
                let expr = self.parse_comparison()?;
                self.expect_closing_paren()?;
                self.depth -= 1;
                Ok(expr)
            }
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_identifier(),
            Some(c) => Err(self.unexpected(c)),
        }
    }

    fn parse_number(&mut self) -> FormulaExpr {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part, only when a digit follows the dot
        let rest = &self.input[self.pos..];
        if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        FormulaExpr::number(num_str.parse().unwrap_or(0.0))
    }

    fn parse_string(&mut self, quote: char) -> ParseOutcome<FormulaExpr> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return Err(ParseError::UnterminatedString { position: start }),
                Some('\\') => {
                    // Backslash takes the next character literally
                    self.advance();
                    match self.peek_char() {
                        Some(c) => {
                            s.push(c);
                            self.advance();
                        }
                        None => return Err(ParseError::UnterminatedString { position: start }),
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }

        Ok(FormulaExpr::string(s))
    }

    fn parse_field_reference(&mut self) -> ParseOutcome<FormulaExpr> {
        let start = self.pos;
        self.advance(); // Skip '{'

        let close = self.input[self.pos..]
            .find('}')
            .ok_or(ParseError::UnterminatedFieldReference { position: start })?;

        let name = self.input[self.pos..self.pos + close].trim().to_string();
        self.pos += close + 1;

        self.dependencies.insert(name.clone());
        Ok(FormulaExpr::FieldRef(name))
    }

    fn parse_identifier(&mut self) -> ParseOutcome<FormulaExpr> {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let name = &self.input[start..self.pos];

        // A '(' directly after the name makes it a call, even for TRUE/FALSE
        if self.peek_char() == Some('(') {
            self.advance();
            return self.parse_call(name.to_uppercase());
        }

        match name.to_uppercase().as_str() {
            "TRUE" => Ok(FormulaExpr::Literal(Value::Boolean(true))),
            "FALSE" => Ok(FormulaExpr::Literal(Value::Boolean(false))),
            _ => Err(ParseError::UnexpectedIdentifier {
                name: name.to_string(),
                position: start,
            }),
        }
    }

    /// Parse call arguments; the opening '(' is already consumed
    fn parse_call(&mut self, name: String) -> ParseOutcome<FormulaExpr> {
        let mut args = Vec::new();

        if !self.eat(")") {
            self.descend()?;
            loop {
                args.push(self.parse_comparison()?);
                if self.eat(",") {
                    continue;
                }
                self.expect_closing_paren()?;
                break;
            }
            self.depth -= 1;
        }

        Ok(FormulaExpr::Call { name, args })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
