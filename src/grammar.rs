//! Lua 5.1/5.2 operator grammar
//!
//! Binary operators carry separate left and right binding priorities so
//! the precedence climb can express right associativity: `..` and `^`
//! recurse with a right priority one below their left priority.

use crate::token::{Token, TokenKind};

/// Binding priority of the unary operators `not`, `-` and `#`.
pub const UNARY_PRIORITY: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    Mod,    // %
    Pow,    // ^   (right-associative)
    Concat, // ..  (right-associative)
    Eq,     // ==
    Neq,    // ~=
    Lt,     // <
    Le,     // <=
    Gt,     // >
    Ge,     // >=
    And,    // and
    Or,     // or
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,    // not
    Negate, // -
    Length, // #
}

impl BinaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::Symbol => match token.source {
                "+" => Some(BinaryOp::Add),
                "-" => Some(BinaryOp::Sub),
                "*" => Some(BinaryOp::Mul),
                "/" => Some(BinaryOp::Div),
                "%" => Some(BinaryOp::Mod),
                "^" => Some(BinaryOp::Pow),
                ".." => Some(BinaryOp::Concat),
                "==" => Some(BinaryOp::Eq),
                "~=" => Some(BinaryOp::Neq),
                "<" => Some(BinaryOp::Lt),
                "<=" => Some(BinaryOp::Le),
                ">" => Some(BinaryOp::Gt),
                ">=" => Some(BinaryOp::Ge),
                _ => None,
            },
            TokenKind::Keyword => match token.source {
                "and" => Some(BinaryOp::And),
                "or" => Some(BinaryOp::Or),
                _ => None,
            },
            _ => None,
        }
    }

    /// Priority the operator binds with on its left side. The climb
    /// consumes an operator while this exceeds the current limit.
    pub fn left_priority(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Neq => 3,
            BinaryOp::Concat => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 7,
            BinaryOp::Pow => 10,
        }
    }

    /// Priority passed down when parsing the right operand.
    pub fn right_priority(self) -> u8 {
        match self {
            BinaryOp::Concat => 4,
            BinaryOp::Pow => 9,
            other => other.left_priority(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "..",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "~=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    /// Word operators keep a flanking space even in compressed output.
    pub fn is_word(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match (token.kind, token.source) {
            (TokenKind::Keyword, "not") => Some(UnaryOp::Not),
            (TokenKind::Symbol, "-") => Some(UnaryOp::Negate),
            (TokenKind::Symbol, "#") => Some(UnaryOp::Length),
            _ => None,
        }
    }
}
