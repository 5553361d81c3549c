//! Formula Abstract Syntax Tree types

use gridform_core::Value;
use std::fmt::{self, Write as _};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Number, string or boolean literal
    Literal(Value),

    /// `{Field Name}` reference
    FieldRef(String),

    /// Prefix operation
    Unary {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Infix operation
    Binary {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },

    /// Function call; `name` is upper-cased by the parser
    Call { name: String, args: Vec<FormulaExpr> },
}

impl FormulaExpr {
    /// Number literal
    pub fn number(n: f64) -> Self {
        FormulaExpr::Literal(Value::Number(n))
    }

    /// String literal
    pub fn string<S: Into<String>>(s: S) -> Self {
        FormulaExpr::Literal(Value::String(s.into()))
    }

    /// Field reference
    pub fn field<S: Into<String>>(name: S) -> Self {
        FormulaExpr::FieldRef(name.into())
    }
}

/// Canonical, fully parenthesized rendering (`({Price} * {Quantity})`)
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Literal(Value::String(s)) => {
                f.write_char('"')?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
            FormulaExpr::Literal(v) => write!(f, "{}", v),
            FormulaExpr::FieldRef(name) => write!(f, "{{{}}}", name),
            FormulaExpr::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            FormulaExpr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            FormulaExpr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

impl BinaryOperator {
    /// Operator as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

impl UnaryOperator {
    /// Operator as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_literal_display() {
        assert_eq!(FormulaExpr::string("plain").to_string(), "\"plain\"");
        assert_eq!(
            FormulaExpr::string("say \"hi\" \\ bye").to_string(),
            "\"say \\\"hi\\\" \\\\ bye\""
        );
        assert_eq!(FormulaExpr::string("a\nb\u{1b}").to_string(), "\"a\nb\u{1b}\"");
    }

    #[test]
    fn test_control_characters_survive_reparse() {
        let expr = FormulaExpr::string("line\n\ttab\u{1b}[0m \"quoted\" \\");
        let reparsed = parse(&expr.to_string()).ast;
        assert_eq!(reparsed, Some(expr));
    }
}
