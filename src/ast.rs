//! Abstract Syntax Tree definitions for Lua
//!
//! Nodes live in a per-file arena and reference each other through
//! arena pointers; identifiers, keywords and literals keep non-owning
//! references into the token vector so the printer can replay their
//! exact source text and query their line numbers. Sub-sequences
//! (statement lists, expression lists, name lists) are arena-allocated
//! slices.

use crate::grammar::{BinaryOp, UnaryOp};
use crate::token::Token;
use bumpalo::Bump;

/// Common slice aliases to simplify list types across the AST
pub type List<'a, T> = &'a [T];
pub type TokenRef<'a> = &'a Token<'a>;

/// A block is a sequence of statements; `return` and `break` may only
/// appear in the final position.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub stats: List<'a, &'a Stat<'a>>,
}

/// Lua expressions
#[derive(Debug, Clone)]
pub enum Expr<'a> {
    /// Number literal, printed verbatim from its token
    Number { token: TokenRef<'a> },

    /// String literal, quoted or long-bracket form
    String { token: TokenRef<'a> },

    Nil { token: TokenRef<'a> },

    /// `true` or `false`; the value is the token text
    Boolean { token: TokenRef<'a> },

    /// `...`
    Varargs { token: TokenRef<'a> },

    /// `not e`, `-e` or `#e`; the operator token is kept for line queries
    Unary {
        op: UnaryOp,
        token: TokenRef<'a>,
        rhs: &'a Expr<'a>,
    },

    /// Any binary operation; the operator itself is re-synthesised by
    /// the printer, so no token is stored
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },

    /// Plain identifier reference
    Variable { token: TokenRef<'a> },

    /// `(e)`; the token is the opening parenthesis
    Paren {
        token: TokenRef<'a>,
        expr: &'a Expr<'a>,
    },

    /// `base.name`
    Field {
        base: &'a Expr<'a>,
        name: TokenRef<'a>,
    },

    /// `base:name(args)` (or table/string call args)
    Method {
        base: &'a Expr<'a>,
        name: TokenRef<'a>,
        args: &'a CallArgs<'a>,
    },

    /// `base[index]`
    Index {
        base: &'a Expr<'a>,
        index: &'a Expr<'a>,
    },

    /// `base(args)` (or table/string call args)
    Call {
        base: &'a Expr<'a>,
        args: &'a CallArgs<'a>,
    },

    /// `{ ... }`; the token is the opening brace
    Table {
        token: TokenRef<'a>,
        entries: List<'a, TableEntry<'a>>,
        end_token: TokenRef<'a>,
    },

    /// Anonymous `function(...) ... end`
    Function { func: &'a FuncBody<'a> },
}

/// Arguments of a call or method suffix
#[derive(Debug, Clone)]
pub enum CallArgs<'a> {
    /// `(e, e, ...)`; the token is the opening parenthesis
    Parens {
        token: TokenRef<'a>,
        args: List<'a, &'a Expr<'a>>,
    },

    /// `f{ ... }`: a single table literal
    Table { expr: &'a Expr<'a> },

    /// `f"..."`: a single string literal
    String { token: TokenRef<'a> },
}

/// One entry of a table constructor
#[derive(Debug, Clone)]
pub enum TableEntry<'a> {
    /// `[index] = value`; the bracket token is kept for line queries
    Index {
        bracket: TokenRef<'a>,
        index: &'a Expr<'a>,
        value: &'a Expr<'a>,
    },

    /// `name = value`
    Field {
        name: TokenRef<'a>,
        value: &'a Expr<'a>,
    },

    /// bare `value`
    Value { value: &'a Expr<'a> },
}

/// Parameter list and body shared by every function form. The `function`
/// keyword and closing `end` tokens bracket the construct in the source.
#[derive(Debug, Clone, Copy)]
pub struct FuncBody<'a> {
    pub token: TokenRef<'a>,
    pub params: List<'a, TokenRef<'a>>,
    pub body: &'a Block<'a>,
    pub end_token: TokenRef<'a>,
}

/// `elseif cond then body` or final `else body`
#[derive(Debug, Clone)]
pub enum ElseClause<'a> {
    ElseIf {
        token: TokenRef<'a>,
        condition: &'a Expr<'a>,
        body: &'a Block<'a>,
    },
    Else {
        token: TokenRef<'a>,
        body: &'a Block<'a>,
    },
}

/// Lua statements
#[derive(Debug, Clone)]
pub enum Stat<'a> {
    /// A call or method expression in statement position
    Call { expr: &'a Expr<'a> },

    /// `lhs, lhs = rhs, rhs`
    Assignment {
        lhs: List<'a, &'a Expr<'a>>,
        rhs: List<'a, &'a Expr<'a>>,
    },

    /// `if cond then body {elseif ...} [else ...] end`
    If {
        token: TokenRef<'a>,
        condition: &'a Expr<'a>,
        body: &'a Block<'a>,
        else_clauses: List<'a, ElseClause<'a>>,
        end_token: TokenRef<'a>,
    },

    /// `do body end`
    Do {
        token: TokenRef<'a>,
        body: &'a Block<'a>,
        end_token: TokenRef<'a>,
    },

    /// `while cond do body end`
    While {
        token: TokenRef<'a>,
        condition: &'a Expr<'a>,
        body: &'a Block<'a>,
        end_token: TokenRef<'a>,
    },

    /// `for v = start, stop[, step] do body end`; the range always holds
    /// two or three expressions
    NumericFor {
        token: TokenRef<'a>,
        vars: List<'a, TokenRef<'a>>,
        range: List<'a, &'a Expr<'a>>,
        body: &'a Block<'a>,
        end_token: TokenRef<'a>,
    },

    /// `for names in exprs do body end`
    GenericFor {
        token: TokenRef<'a>,
        vars: List<'a, TokenRef<'a>>,
        exprs: List<'a, &'a Expr<'a>>,
        body: &'a Block<'a>,
        end_token: TokenRef<'a>,
    },

    /// `repeat body until cond`
    Repeat {
        token: TokenRef<'a>,
        body: &'a Block<'a>,
        until_token: TokenRef<'a>,
        condition: &'a Expr<'a>,
    },

    /// `function a.b.c:d(...) ... end`
    Function {
        name_chain: List<'a, TokenRef<'a>>,
        is_method: bool,
        func: &'a FuncBody<'a>,
    },

    /// `local function name(...) ... end`
    LocalFunction {
        token: TokenRef<'a>,
        name: TokenRef<'a>,
        func: &'a FuncBody<'a>,
    },

    /// `local a, b [= e, e]`; an empty expression list means the
    /// initialiser was absent
    LocalVar {
        token: TokenRef<'a>,
        names: List<'a, TokenRef<'a>>,
        exprs: List<'a, &'a Expr<'a>>,
    },

    /// `return [e, e]`
    Return {
        token: TokenRef<'a>,
        exprs: List<'a, &'a Expr<'a>>,
    },

    Break { token: TokenRef<'a> },

    /// `goto label`
    Goto {
        token: TokenRef<'a>,
        label: TokenRef<'a>,
    },

    /// `::label::`; the token is the opening `::`
    Label {
        token: TokenRef<'a>,
        name: TokenRef<'a>,
    },
}

impl<'a> Expr<'a> {
    /// The lexically-first token of the expression, following the left
    /// spine of composite nodes.
    pub fn first_token(&self) -> TokenRef<'a> {
        match self {
            Expr::Number { token }
            | Expr::String { token }
            | Expr::Nil { token }
            | Expr::Boolean { token }
            | Expr::Varargs { token }
            | Expr::Variable { token }
            | Expr::Paren { token, .. }
            | Expr::Unary { token, .. }
            | Expr::Table { token, .. } => *token,
            // composite nodes inherit the first token of their left child
            Expr::Binary { lhs, .. } => lhs.first_token(),
            Expr::Field { base, .. }
            | Expr::Method { base, .. }
            | Expr::Index { base, .. }
            | Expr::Call { base, .. } => base.first_token(),
            Expr::Function { func } => func.token,
        }
    }
}

impl<'a> Stat<'a> {
    pub fn first_token(&self) -> TokenRef<'a> {
        match self {
            Stat::Call { expr } => expr.first_token(),
            Stat::Assignment { lhs, .. } => lhs[0].first_token(),
            Stat::If { token, .. }
            | Stat::Do { token, .. }
            | Stat::While { token, .. }
            | Stat::NumericFor { token, .. }
            | Stat::GenericFor { token, .. }
            | Stat::Repeat { token, .. }
            | Stat::LocalFunction { token, .. }
            | Stat::LocalVar { token, .. }
            | Stat::Return { token, .. }
            | Stat::Break { token }
            | Stat::Goto { token, .. }
            | Stat::Label { token, .. } => *token,
            Stat::Function { func, .. } => func.token,
        }
    }
}

/// AST builder for convenient construction with arena allocation
pub struct AstBuilder<'a> {
    arena: &'a Bump,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self { arena }
    }

    /// Allocate a slice in the arena
    pub fn alloc_slice<T>(&self, items: &[T]) -> List<'a, T>
    where
        T: Clone,
    {
        self.arena.alloc_slice_clone(items)
    }

    /// Allocate a single item in the arena
    pub fn alloc<T>(&self, item: T) -> &'a T {
        self.arena.alloc(item)
    }
}
