//! Hand-written recursive descent parser for Lua
//!
//! The parser walks the token vector with a single cursor and builds
//! the AST in the per-file arena. Expressions use precedence climbing
//! with the left/right priorities from [`crate::grammar`]. There is no
//! error recovery: the first mismatch aborts the file with one
//! diagnostic carrying the file name and the offending line.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::grammar::{BinaryOp, UnaryOp, UNARY_PRIORITY};
use crate::token::{Token, TokenKind};
use bumpalo::Bump;

/// Parse a token vector into its root block. The token slice must end
/// with the lexer's `Eof` sentinel.
pub fn parse<'a>(
    tokens: &'a [Token<'a>],
    file_name: &str,
    arena: &'a Bump,
) -> ParseResult<&'a Block<'a>> {
    let mut parser = Parser::new(tokens, file_name, arena);
    let root = parser.block()?;
    if !parser.peek(0).is_eof() {
        return Err(parser.unexpected("<eof>"));
    }
    Ok(root)
}

struct Parser<'a, 'f> {
    tokens: &'a [Token<'a>],
    file: &'f str,
    pos: usize,
    builder: AstBuilder<'a>,
}

impl<'a, 'f> Parser<'a, 'f> {
    fn new(tokens: &'a [Token<'a>], file: &'f str, arena: &'a Bump) -> Self {
        debug_assert!(matches!(
            tokens.last(),
            Some(Token {
                kind: TokenKind::Eof,
                ..
            })
        ));
        Self {
            tokens,
            file,
            pos: 0,
            builder: AstBuilder::new(arena),
        }
    }

    // === Token cursor ===

    /// Look ahead without consuming; saturates at the Eof sentinel.
    fn peek(&self, offset: usize) -> TokenRef<'a> {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Consume and return the current token; the cursor never moves
    /// past the Eof sentinel.
    fn get(&mut self) -> TokenRef<'a> {
        let token = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn is_block_follow(&self) -> bool {
        self.peek(0).is_block_follow()
    }

    // === Diagnostics ===

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek(0);
        let found = if token.is_eof() { "<eof>" } else { token.source };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            file: self.file.to_string(),
            line: token.line,
        }
    }

    fn invalid(&self, message: impl Into<String>) -> ParseError {
        ParseError::InvalidSyntax {
            message: message.into(),
            file: self.file.to_string(),
            line: self.peek(0).line,
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> ParseResult<TokenRef<'a>> {
        if self.peek(0).kind == kind {
            Ok(self.get())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> ParseResult<TokenRef<'a>> {
        let token = self.peek(0);
        if token.kind == TokenKind::Symbol && token.source == symbol {
            Ok(self.get())
        } else {
            Err(self.unexpected(&format!("'{symbol}'")))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<TokenRef<'a>> {
        let token = self.peek(0);
        if token.kind == TokenKind::Keyword && token.source == keyword {
            Ok(self.get())
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    // === Blocks and statements ===

    fn block(&mut self) -> ParseResult<&'a Block<'a>> {
        let mut stats: Vec<&'a Stat<'a>> = Vec::new();
        let mut is_last = false;
        while !is_last && !self.is_block_follow() {
            stats.push(self.statement(&mut is_last)?);
            // optional statement separator, dropped from the AST
            let token = self.peek(0);
            if token.kind == TokenKind::Symbol && token.source == ";" {
                self.get();
            }
        }
        Ok(self.builder.alloc(Block {
            stats: self.builder.alloc_slice(&stats),
        }))
    }

    /// Parse one statement. `return` and `break` set `is_last` because
    /// nothing may follow them inside the same block.
    fn statement(&mut self, is_last: &mut bool) -> ParseResult<&'a Stat<'a>> {
        *is_last = false;
        let stat = match self.peek(0).source {
            "::" => self.labelstat()?,
            "if" => self.ifstat()?,
            "while" => self.whilestat()?,
            "do" => self.dostat()?,
            "for" => self.forstat()?,
            "repeat" => self.repeatstat()?,
            "function" => self.funcstat()?,
            "local" => self.localdecl()?,
            "return" => {
                *is_last = true;
                self.retstat()?
            }
            "break" => {
                *is_last = true;
                Stat::Break { token: self.get() }
            }
            "goto" => self.gotostat()?,
            _ => self.exprstat()?,
        };
        Ok(self.builder.alloc(stat))
    }

    /// Parse `block` followed by the given closing keyword.
    fn blockbody(&mut self, terminator: &str) -> ParseResult<(&'a Block<'a>, TokenRef<'a>)> {
        let body = self.block()?;
        let after = self.peek(0);
        if after.kind == TokenKind::Keyword && after.source == terminator {
            self.get();
            Ok((body, after))
        } else {
            Err(self.unexpected(&format!("'{terminator}' to close block")))
        }
    }

    /// A statement that starts with a primary expression is either a
    /// call statement or the first left-hand side of an assignment.
    fn exprstat(&mut self) -> ParseResult<Stat<'a>> {
        let first = self.primaryexpr()?;
        if matches!(first, Expr::Call { .. } | Expr::Method { .. }) {
            return Ok(Stat::Call { expr: first });
        }

        let mut lhs = vec![first];
        while self.peek(0).source == "," {
            self.get();
            let next = self.primaryexpr()?;
            if matches!(next, Expr::Call { .. } | Expr::Method { .. }) {
                return Err(self.invalid("bad left-hand side in assignment"));
            }
            lhs.push(next);
        }
        self.expect_symbol("=")?;
        let rhs = self.exprlist()?;
        Ok(Stat::Assignment {
            lhs: self.builder.alloc_slice(&lhs),
            rhs: self.builder.alloc_slice(&rhs),
        })
    }

    fn ifstat(&mut self) -> ParseResult<Stat<'a>> {
        let if_token = self.get();
        let condition = self.expr()?;
        self.expect_keyword("then")?;
        let body = self.block()?;

        let mut else_clauses = Vec::new();
        loop {
            match self.peek(0).source {
                "elseif" => {
                    let token = self.get();
                    let condition = self.expr()?;
                    self.expect_keyword("then")?;
                    let body = self.block()?;
                    else_clauses.push(ElseClause::ElseIf {
                        token,
                        condition,
                        body,
                    });
                }
                "else" => {
                    let token = self.get();
                    let body = self.block()?;
                    else_clauses.push(ElseClause::Else { token, body });
                    break;
                }
                _ => break,
            }
        }

        let end_token = self.expect_keyword("end")?;
        Ok(Stat::If {
            token: if_token,
            condition,
            body,
            else_clauses: self.builder.alloc_slice(&else_clauses),
            end_token,
        })
    }

    fn dostat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let (body, end_token) = self.blockbody("end")?;
        Ok(Stat::Do {
            token,
            body,
            end_token,
        })
    }

    fn whilestat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let condition = self.expr()?;
        self.expect_keyword("do")?;
        let (body, end_token) = self.blockbody("end")?;
        Ok(Stat::While {
            token,
            condition,
            body,
            end_token,
        })
    }

    /// `=` after the variable list starts a numeric for, `in` a generic
    /// one. The numeric range takes exactly two or three expressions.
    fn forstat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let vars = self.namelist()?;

        if self.peek(0).source == "=" {
            self.get();
            let range = self.exprlist()?;
            if range.len() < 2 || range.len() > 3 {
                return Err(
                    self.invalid("numeric for loop must have 2 or 3 values for range bounds")
                );
            }
            self.expect_keyword("do")?;
            let (body, end_token) = self.blockbody("end")?;
            return Ok(Stat::NumericFor {
                token,
                vars: self.builder.alloc_slice(&vars),
                range: self.builder.alloc_slice(&range),
                body,
                end_token,
            });
        }

        if self.peek(0).source == "in" {
            self.get();
            let exprs = self.exprlist()?;
            self.expect_keyword("do")?;
            let (body, end_token) = self.blockbody("end")?;
            return Ok(Stat::GenericFor {
                token,
                vars: self.builder.alloc_slice(&vars),
                exprs: self.builder.alloc_slice(&exprs),
                body,
                end_token,
            });
        }

        Err(self.unexpected("'=' or 'in' in for statement"))
    }

    fn repeatstat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let (body, until_token) = self.blockbody("until")?;
        let condition = self.expr()?;
        Ok(Stat::Repeat {
            token,
            body,
            until_token,
            condition,
        })
    }

    /// `function Name{.Name}[:Name] funcbody`
    fn funcstat(&mut self) -> ParseResult<Stat<'a>> {
        let function_token = self.get();
        let mut name_chain = vec![self.expect_kind(TokenKind::Identifier, "identifier")?];
        let mut is_method = false;
        while self.peek(0).source == "." {
            self.get();
            name_chain.push(self.expect_kind(TokenKind::Identifier, "identifier")?);
        }
        if self.peek(0).source == ":" {
            self.get();
            name_chain.push(self.expect_kind(TokenKind::Identifier, "identifier")?);
            is_method = true;
        }
        let func = self.funcbody(function_token)?;
        Ok(Stat::Function {
            name_chain: self.builder.alloc_slice(&name_chain),
            is_method,
            func: self.builder.alloc(func),
        })
    }

    fn localdecl(&mut self) -> ParseResult<Stat<'a>> {
        let local_token = self.get();

        if self.peek(0).source == "function" {
            let function_token = self.get();
            let name = self.expect_kind(TokenKind::Identifier, "identifier")?;
            if matches!(self.peek(0).source, "." | ":") {
                return Err(self.invalid("invalid function name in local function declaration"));
            }
            let func = self.funcbody(function_token)?;
            return Ok(Stat::LocalFunction {
                token: local_token,
                name,
                func: self.builder.alloc(func),
            });
        }

        if self.peek(0).kind == TokenKind::Identifier {
            let names = self.namelist()?;
            let exprs = if self.peek(0).source == "=" {
                self.get();
                self.exprlist()?
            } else {
                Vec::new()
            };
            return Ok(Stat::LocalVar {
                token: local_token,
                names: self.builder.alloc_slice(&names),
                exprs: self.builder.alloc_slice(&exprs),
            });
        }

        Err(self.unexpected("'function' or identifier after 'local'"))
    }

    fn retstat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let exprs = if self.is_block_follow() || self.peek(0).source == ";" {
            Vec::new()
        } else {
            self.exprlist()?
        };
        Ok(Stat::Return {
            token,
            exprs: self.builder.alloc_slice(&exprs),
        })
    }

    fn gotostat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let label = self.expect_kind(TokenKind::Identifier, "label name")?;
        Ok(Stat::Goto { token, label })
    }

    fn labelstat(&mut self) -> ParseResult<Stat<'a>> {
        let token = self.get();
        let name = self.expect_kind(TokenKind::Identifier, "label name")?;
        self.expect_symbol("::")?;
        Ok(Stat::Label { token, name })
    }

    /// `( [parlist] ) block end`; the parameter list reuses `namelist`
    /// because `...` lexes as an identifier token.
    fn funcbody(&mut self, function_token: TokenRef<'a>) -> ParseResult<FuncBody<'a>> {
        self.expect_symbol("(")?;
        let params = self.namelist()?;
        self.expect_symbol(")")?;
        let (body, end_token) = self.blockbody("end")?;
        Ok(FuncBody {
            token: function_token,
            params: self.builder.alloc_slice(&params),
            body,
            end_token,
        })
    }

    // === Expressions ===

    fn expr(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.subexpr(0)
    }

    /// Precedence climbing: an optional unary operator binding at
    /// `UNARY_PRIORITY`, then a simple expression, then any binary
    /// operator whose left priority beats `limit`.
    fn subexpr(&mut self, limit: u8) -> ParseResult<&'a Expr<'a>> {
        let mut node = if let Some(op) = UnaryOp::from_token(self.peek(0)) {
            let token = self.get();
            let rhs = self.subexpr(UNARY_PRIORITY)?;
            self.builder.alloc(Expr::Unary { op, token, rhs })
        } else {
            self.simpleexpr()?
        };

        while let Some(op) = BinaryOp::from_token(self.peek(0)) {
            if op.left_priority() <= limit {
                break;
            }
            self.get();
            let rhs = self.subexpr(op.right_priority())?;
            node = self.builder.alloc(Expr::Binary { op, lhs: node, rhs });
        }

        Ok(node)
    }

    fn simpleexpr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek(0);
        match token.kind {
            TokenKind::Number => {
                let token = self.get();
                Ok(self.builder.alloc(Expr::Number { token }))
            }
            TokenKind::String => {
                let token = self.get();
                Ok(self.builder.alloc(Expr::String { token }))
            }
            _ => match token.source {
                "nil" => {
                    let token = self.get();
                    Ok(self.builder.alloc(Expr::Nil { token }))
                }
                "true" | "false" => {
                    let token = self.get();
                    Ok(self.builder.alloc(Expr::Boolean { token }))
                }
                "..." => {
                    let token = self.get();
                    Ok(self.builder.alloc(Expr::Varargs { token }))
                }
                "{" => self.tableexpr(),
                "function" => {
                    let function_token = self.get();
                    let func = self.funcbody(function_token)?;
                    Ok(self.builder.alloc(Expr::Function {
                        func: self.builder.alloc(func),
                    }))
                }
                _ => self.primaryexpr(),
            },
        }
    }

    /// A prefix expression followed by any chain of `.Name`,
    /// `:Name args`, `[expr]` and call-argument suffixes.
    fn primaryexpr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut base = self.prefixexpr()?;
        loop {
            let token = self.peek(0);
            match (token.kind, token.source) {
                (TokenKind::Symbol, ".") => {
                    self.get();
                    let name = self.expect_kind(TokenKind::Identifier, "identifier")?;
                    base = self.builder.alloc(Expr::Field { base, name });
                }
                (TokenKind::Symbol, ":") => {
                    self.get();
                    let name = self.expect_kind(TokenKind::Identifier, "identifier")?;
                    let args = self.functionargs()?;
                    base = self.builder.alloc(Expr::Method { base, name, args });
                }
                (TokenKind::Symbol, "[") => {
                    self.get();
                    let index = self.expr()?;
                    self.expect_symbol("]")?;
                    base = self.builder.alloc(Expr::Index { base, index });
                }
                (TokenKind::Symbol, "(") | (TokenKind::Symbol, "{") | (TokenKind::String, _) => {
                    let args = self.functionargs()?;
                    base = self.builder.alloc(Expr::Call { base, args });
                }
                _ => break,
            }
        }
        Ok(base)
    }

    /// `(expr)` or an identifier.
    fn prefixexpr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let token = self.peek(0);
        if token.kind == TokenKind::Symbol && token.source == "(" {
            let open = self.get();
            let expr = self.expr()?;
            self.expect_symbol(")")?;
            return Ok(self.builder.alloc(Expr::Paren { token: open, expr }));
        }
        if token.kind == TokenKind::Identifier {
            let token = self.get();
            return Ok(self.builder.alloc(Expr::Variable { token }));
        }
        Err(self.invalid("unexpected symbol in prefix expression"))
    }

    /// `(expr-list)`, a single table literal, or a single string.
    fn functionargs(&mut self) -> ParseResult<&'a CallArgs<'a>> {
        let token = self.peek(0);
        match (token.kind, token.source) {
            (TokenKind::Symbol, "(") => {
                let open = self.get();
                let mut args = Vec::new();
                while self.peek(0).source != ")" {
                    args.push(self.expr()?);
                    if self.peek(0).source == "," {
                        self.get();
                    } else {
                        break;
                    }
                }
                self.expect_symbol(")")?;
                Ok(self.builder.alloc(CallArgs::Parens {
                    token: open,
                    args: self.builder.alloc_slice(&args),
                }))
            }
            (TokenKind::Symbol, "{") => {
                let expr = self.tableexpr()?;
                Ok(self.builder.alloc(CallArgs::Table { expr }))
            }
            (TokenKind::String, _) => {
                let token = self.get();
                Ok(self.builder.alloc(CallArgs::String { token }))
            }
            _ => Err(self.invalid("function arguments expected")),
        }
    }

    /// `{ [e]=e | Name=e | e , ... }` with `,`/`;` separators and an
    /// optional trailing separator.
    fn tableexpr(&mut self) -> ParseResult<&'a Expr<'a>> {
        let open = self.expect_symbol("{")?;
        let mut entries = Vec::new();
        while self.peek(0).source != "}" {
            if self.peek(0).source == "[" {
                let bracket = self.get();
                let index = self.expr()?;
                self.expect_symbol("]")?;
                self.expect_symbol("=")?;
                let value = self.expr()?;
                entries.push(TableEntry::Index {
                    bracket,
                    index,
                    value,
                });
            } else if self.peek(0).kind == TokenKind::Identifier && self.peek(1).source == "=" {
                let name = self.get();
                self.get(); // '='
                let value = self.expr()?;
                entries.push(TableEntry::Field { name, value });
            } else {
                let value = self.expr()?;
                entries.push(TableEntry::Value { value });
            }

            let sep = self.peek(0);
            if sep.kind == TokenKind::Symbol && matches!(sep.source, "," | ";") {
                self.get();
            } else {
                break;
            }
        }
        let end_token = self.expect_symbol("}")?;
        Ok(self.builder.alloc(Expr::Table {
            token: open,
            entries: self.builder.alloc_slice(&entries),
            end_token,
        }))
    }

    // === Lists ===

    fn exprlist(&mut self) -> ParseResult<Vec<&'a Expr<'a>>> {
        let mut exprs = vec![self.expr()?];
        while self.peek(0).source == "," {
            self.get();
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    /// Comma-separated identifier list; `...` also lexes as an
    /// identifier, which lets parameter lists end in varargs.
    fn namelist(&mut self) -> ParseResult<Vec<TokenRef<'a>>> {
        let mut names = Vec::new();
        if self.peek(0).kind == TokenKind::Identifier {
            names.push(self.get());
        }
        while self.peek(0).source == "," {
            self.get();
            names.push(self.expect_kind(TokenKind::Identifier, "identifier")?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::Mode;

    fn with_ast(source: &str, check: impl FnOnce(&Block)) {
        let out = lex(source, "test.lua", Mode::Compress).expect("lex");
        let arena = Bump::new();
        let root = parse(&out.tokens, "test.lua", &arena).expect("parse");
        check(root);
    }

    fn parse_err(source: &str) -> ParseError {
        let out = lex(source, "test.lua", Mode::Compress).expect("lex");
        let arena = Bump::new();
        parse(&out.tokens, "test.lua", &arena).expect_err("should fail")
    }

    fn first_assignment_rhs<'b>(block: &'b Block<'b>) -> &'b Expr<'b> {
        match block.stats[0] {
            Stat::Assignment { rhs, .. } => rhs[0],
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        with_ast("x = a + b * c", |root| {
            match first_assignment_rhs(root) {
                Expr::Binary {
                    op: BinaryOp::Add,
                    rhs,
                    ..
                } => {
                    assert!(matches!(
                        rhs,
                        Expr::Binary {
                            op: BinaryOp::Mul,
                            ..
                        }
                    ));
                }
                other => panic!("expected Add at the top, got {other:?}"),
            };
        });
    }

    #[test]
    fn power_nests_to_the_right() {
        with_ast("x = a ^ b ^ c", |root| {
            match first_assignment_rhs(root) {
                Expr::Binary {
                    op: BinaryOp::Pow,
                    lhs,
                    rhs,
                } => {
                    assert!(matches!(lhs, Expr::Variable { .. }));
                    assert!(matches!(
                        rhs,
                        Expr::Binary {
                            op: BinaryOp::Pow,
                            ..
                        }
                    ));
                }
                other => panic!("expected Pow at the top, got {other:?}"),
            };
        });
    }

    #[test]
    fn concat_nests_to_the_right() {
        with_ast("x = a .. b .. c", |root| {
            match first_assignment_rhs(root) {
                Expr::Binary {
                    op: BinaryOp::Concat,
                    rhs,
                    ..
                } => {
                    assert!(matches!(
                        rhs,
                        Expr::Binary {
                            op: BinaryOp::Concat,
                            ..
                        }
                    ));
                }
                other => panic!("expected Concat at the top, got {other:?}"),
            };
        });
    }

    #[test]
    fn and_binds_tighter_than_or() {
        with_ast("x = a or b and c", |root| {
            match first_assignment_rhs(root) {
                Expr::Binary {
                    op: BinaryOp::Or,
                    rhs,
                    ..
                } => {
                    assert!(matches!(
                        rhs,
                        Expr::Binary {
                            op: BinaryOp::And,
                            ..
                        }
                    ));
                }
                other => panic!("expected Or at the top, got {other:?}"),
            };
        });
    }

    #[test]
    fn unary_binds_below_power() {
        // -a^b parses as -(a^b)
        with_ast("x = -a ^ b", |root| {
            match first_assignment_rhs(root) {
                Expr::Unary {
                    op: UnaryOp::Negate,
                    rhs,
                    ..
                } => {
                    assert!(matches!(
                        rhs,
                        Expr::Binary {
                            op: BinaryOp::Pow,
                            ..
                        }
                    ));
                }
                other => panic!("expected Negate at the top, got {other:?}"),
            };
        });
    }

    #[test]
    fn call_statement_and_method_statement() {
        with_ast("f(1)\nt:m 'x'\ng{1, 2}", |root| {
            assert_eq!(root.stats.len(), 3);
            assert!(matches!(
                root.stats[0],
                Stat::Call {
                    expr: Expr::Call { .. }
                }
            ));
            assert!(matches!(
                root.stats[1],
                Stat::Call {
                    expr: Expr::Method { .. }
                }
            ));
            assert!(matches!(
                root.stats[2],
                Stat::Call {
                    expr: Expr::Call {
                        args: CallArgs::Table { .. },
                        ..
                    }
                }
            ));
        });
    }

    #[test]
    fn multi_assignment_collects_both_sides() {
        with_ast("a, b.c, d[1] = 1, 2, 3", |root| {
            match root.stats[0] {
                Stat::Assignment { lhs, rhs } => {
                    assert_eq!(lhs.len(), 3);
                    assert_eq!(rhs.len(), 3);
                    assert!(matches!(lhs[1], Expr::Field { .. }));
                    assert!(matches!(lhs[2], Expr::Index { .. }));
                }
                other => panic!("expected assignment, got {other:?}"),
            }
        });
    }

    #[test]
    fn bare_variable_is_not_a_statement() {
        let err = parse_err("x");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn call_on_assignment_lhs_is_rejected() {
        let err = parse_err("a, f() = 1, 2");
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn local_function_name_must_be_a_single_identifier() {
        assert!(matches!(
            parse_err("local function f.g() end"),
            ParseError::InvalidSyntax { .. }
        ));
        with_ast("local function f() end", |root| {
            assert!(matches!(root.stats[0], Stat::LocalFunction { .. }));
        });
    }

    #[test]
    fn numeric_for_needs_two_or_three_range_exprs() {
        assert!(matches!(
            parse_err("for i = 1 do end"),
            ParseError::InvalidSyntax { .. }
        ));
        assert!(matches!(
            parse_err("for i = 1, 2, 3, 4 do end"),
            ParseError::InvalidSyntax { .. }
        ));
        with_ast("for i = 1, 10 do end", |root| {
            match root.stats[0] {
                Stat::NumericFor { range, .. } => assert_eq!(range.len(), 2),
                other => panic!("expected numeric for, got {other:?}"),
            }
        });
        with_ast("for i = 1, 10, 2 do end", |root| {
            match root.stats[0] {
                Stat::NumericFor { range, .. } => assert_eq!(range.len(), 3),
                other => panic!("expected numeric for, got {other:?}"),
            }
        });
    }

    #[test]
    fn generic_for_and_method_name_chain() {
        with_ast("for k, v in pairs(t) do end\nfunction a.b:c(self) end", |root| {
            match root.stats[0] {
                Stat::GenericFor { vars, exprs, .. } => {
                    assert_eq!(vars.len(), 2);
                    assert_eq!(exprs.len(), 1);
                }
                other => panic!("expected generic for, got {other:?}"),
            }
            match root.stats[1] {
                Stat::Function {
                    name_chain,
                    is_method,
                    ..
                } => {
                    let names: Vec<&str> = name_chain.iter().map(|t| t.source).collect();
                    assert_eq!(names, vec!["a", "b", "c"]);
                    assert!(*is_method);
                }
                other => panic!("expected function stat, got {other:?}"),
            }
        });
    }

    #[test]
    fn table_constructor_entry_kinds() {
        with_ast("t = {[1] = 'a', b = 2, 3; 4,}", |root| {
            match first_assignment_rhs(root) {
                Expr::Table { entries, .. } => {
                    assert_eq!(entries.len(), 4);
                    assert!(matches!(entries[0], TableEntry::Index { .. }));
                    assert!(matches!(entries[1], TableEntry::Field { .. }));
                    assert!(matches!(entries[2], TableEntry::Value { .. }));
                    assert!(matches!(entries[3], TableEntry::Value { .. }));
                }
                other => panic!("expected table, got {other:?}"),
            }
        });
    }

    #[test]
    fn varargs_closes_a_parameter_list() {
        with_ast("local f = function(a, b, ...) return ... end", |root| {
            match root.stats[0] {
                Stat::LocalVar { exprs, .. } => match exprs[0] {
                    Expr::Function { func } => {
                        let params: Vec<&str> = func.params.iter().map(|t| t.source).collect();
                        assert_eq!(params, vec!["a", "b", "..."]);
                    }
                    other => panic!("expected function literal, got {other:?}"),
                },
                other => panic!("expected local declaration, got {other:?}"),
            }
        });
    }

    #[test]
    fn return_must_close_the_block() {
        assert!(matches!(
            parse_err("return 1\nf()"),
            ParseError::UnexpectedToken { .. }
        ));
        with_ast("return 1, 2", |root| {
            match root.stats[0] {
                Stat::Return { exprs, .. } => assert_eq!(exprs.len(), 2),
                other => panic!("expected return, got {other:?}"),
            }
        });
    }

    #[test]
    fn stray_block_closer_is_an_error() {
        let err = parse_err("f()\nend");
        assert_eq!(err.line(), 2);
        match err {
            ParseError::UnexpectedToken {
                expected,
                found,
                line,
                ..
            } => {
                assert_eq!(expected, "<eof>");
                assert_eq!(found, "end");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn first_token_follows_the_left_spine() {
        with_ast("a.b[1] = x + y\nreturn f(2)", |root| {
            let assign = root.stats[0].first_token();
            assert_eq!(assign.source, "a");
            assert_eq!(assign.line, 1);
            let ret = root.stats[1].first_token();
            assert_eq!(ret.source, "return");
            assert_eq!(ret.line, 2);
            match root.stats[0] {
                Stat::Assignment { rhs, .. } => assert_eq!(rhs[0].first_token().source, "x"),
                other => panic!("expected assignment, got {other:?}"),
            }
        });
    }

    #[test]
    fn labels_and_goto() {
        with_ast("::top::\ngoto top", |root| {
            assert!(matches!(root.stats[0], Stat::Label { .. }));
            assert!(matches!(root.stats[1], Stat::Goto { .. }));
        });
    }
}
