//! Three-mode AST printer
//!
//! One traversal serves all three output modes. `Compress` writes the
//! minimum legal token stream and never consults the comment sidecar;
//! `Auto` and `Manual` indent with tabs and re-attach comments by line
//! number: records from earlier lines are replayed on their own lines
//! before the next token, and a record sharing the current line is
//! appended at the end of it. `Manual` additionally replays the blank
//! lines the lexer recorded, while `Auto` synthesises blank lines from
//! statement grouping.
//!
//! Output is staged in a 64 KiB buffer flushed on overflow and once at
//! the end of the document.

use crate::ast::{Block, CallArgs, ElseClause, Expr, FuncBody, Stat, TableEntry, TokenRef};
use crate::grammar::UnaryOp;
use crate::token::{CommentKind, CommentRecord, Token};
use crate::Mode;
use std::io::{self, Write};

const BUFFER_SIZE: usize = 64 * 1024;
const TABS: &[u8; 32] = b"\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t";

/// Statement classification driving Auto-mode blank line insertion.
/// A blank line separates two consecutive statements when either is a
/// `Block` or their groups differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatGroup {
    None,
    Block,
    LocalDecl,
    Label,
    Assign,
    Break,
    Return,
    Call,
    Goto,
}

/// Print a parsed chunk to the sink. The printer cannot fail on a
/// well-formed AST; only sink errors propagate.
pub fn print_chunk<W: Write>(
    root: &Block<'_>,
    comments: &[CommentRecord<'_>],
    mode: Mode,
    out: W,
) -> io::Result<()> {
    Printer::new(out, comments, mode).print(root)
}

struct Printer<'a, W: Write> {
    out: W,
    buffer: Vec<u8>,
    mode: Mode,
    comments: &'a [CommentRecord<'a>],
    comment_index: usize,
    line: u32,
    indent: usize,
    line_start: bool,
    last_group: StatGroup,
}

impl<'a, W: Write> Printer<'a, W> {
    fn new(out: W, comments: &'a [CommentRecord<'a>], mode: Mode) -> Self {
        Self {
            out,
            buffer: Vec::with_capacity(BUFFER_SIZE),
            mode,
            comments,
            comment_index: 0,
            line: 1,
            indent: 0,
            line_start: true,
            last_group: StatGroup::None,
        }
    }

    fn print(mut self, root: &Block<'_>) -> io::Result<()> {
        self.print_block(root)?;
        if self.mode != Mode::Compress {
            while let Some(comment) = self.comments.get(self.comment_index).copied() {
                match comment.kind {
                    CommentKind::ShortComment | CommentKind::LongComment => {
                        self.append(comment.source.as_bytes())?;
                    }
                    CommentKind::BlankLine => {}
                }
                self.append(b"\n")?;
                self.comment_index += 1;
            }
        }
        self.flush_buffer()?;
        self.out.flush()
    }

    // === Output buffer ===

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        if self.buffer.len() + data.len() > BUFFER_SIZE {
            self.flush_buffer()?;
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        self.out.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(())
    }

    fn write_indent(&mut self) -> io::Result<()> {
        let mut n = self.indent;
        while n > 0 {
            let take = n.min(TABS.len());
            self.append(&TABS[..take])?;
            n -= take;
        }
        Ok(())
    }

    fn space(&mut self) -> io::Result<()> {
        self.append(b" ")
    }

    // === Token and line machinery ===

    /// Emit one token. In the formatting modes this is also where
    /// comments from earlier source lines are replayed: a token opening
    /// a fresh output line first drains every sidecar record with a
    /// smaller line number.
    fn print_token(&mut self, token: &Token<'_>) -> io::Result<()> {
        if self.mode == Mode::Compress {
            return self.append(token.source.as_bytes());
        }

        self.line = token.line;
        if self.line_start {
            while let Some(comment) = self.comments.get(self.comment_index).copied() {
                if comment.line >= self.line {
                    break;
                }
                match comment.kind {
                    CommentKind::ShortComment | CommentKind::LongComment => {
                        self.write_indent()?;
                        self.append(comment.source.as_bytes())?;
                    }
                    CommentKind::BlankLine => {}
                }
                self.append(b"\n")?;
                self.comment_index += 1;
            }
            self.write_indent()?;
            self.line_start = false;
        }
        self.append(token.source.as_bytes())
    }

    /// Terminate the current output line. A comment recorded on the
    /// same source line rides along before the newline, which also
    /// covers comments trailing a block-closing keyword.
    fn breakline(&mut self) -> io::Result<()> {
        if self.mode == Mode::Compress {
            return self.append(b"\n");
        }

        if let Some(comment) = self.comments.get(self.comment_index).copied() {
            if comment.line == self.line && comment.kind != CommentKind::BlankLine {
                self.space()?;
                self.append(comment.source.as_bytes())?;
                self.comment_index += 1;
            }
        }
        self.append(b"\n")?;
        self.line_start = true;
        Ok(())
    }

    /// Open a block body: break the line, indent one level and reset
    /// the statement group so no blank line is inserted right away.
    fn enter_group(&mut self) -> io::Result<()> {
        self.breakline()?;
        if self.mode != Mode::Compress {
            self.indent += 1;
            self.last_group = StatGroup::None;
        }
        Ok(())
    }

    fn exit_group(&mut self) {
        if self.mode != Mode::Compress {
            self.indent -= 1;
        }
    }

    // === Separators ===

    fn sep_comma(&mut self) -> io::Result<()> {
        if self.mode == Mode::Compress {
            self.append(b",")
        } else {
            self.append(b", ")
        }
    }

    fn sep_assign(&mut self) -> io::Result<()> {
        if self.mode == Mode::Compress {
            self.append(b"=")
        } else {
            self.append(b" = ")
        }
    }

    // === Statements ===

    fn print_block(&mut self, block: &Block<'_>) -> io::Result<()> {
        for stat in block.stats {
            self.print_stat(stat)?;
        }
        Ok(())
    }

    fn print_stat(&mut self, stat: &Stat<'_>) -> io::Result<()> {
        if self.mode == Mode::Auto {
            self.apply_group_rules(stat)?;
        }

        match stat {
            Stat::Call { expr } => self.print_expr(expr)?,
            Stat::Assignment { lhs, rhs } => {
                self.print_expr_list(lhs)?;
                self.sep_assign()?;
                self.print_expr_list(rhs)?;
            }
            Stat::If {
                token,
                condition,
                body,
                else_clauses,
                end_token,
            } => {
                self.print_token(token)?;
                self.space()?;
                self.print_expr(condition)?;
                self.append(b" then")?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                for clause in *else_clauses {
                    match clause {
                        ElseClause::ElseIf {
                            token,
                            condition,
                            body,
                        } => {
                            self.print_token(token)?;
                            self.space()?;
                            self.print_expr(condition)?;
                            self.append(b" then")?;
                            self.enter_group()?;
                            self.print_block(body)?;
                            self.exit_group();
                        }
                        ElseClause::Else { token, body } => {
                            self.print_token(token)?;
                            self.enter_group()?;
                            self.print_block(body)?;
                            self.exit_group();
                        }
                    }
                }
                self.print_token(end_token)?;
            }
            Stat::Do {
                token,
                body,
                end_token,
            } => {
                self.print_token(token)?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                self.print_token(end_token)?;
            }
            Stat::While {
                token,
                condition,
                body,
                end_token,
            } => {
                self.print_token(token)?;
                self.space()?;
                self.print_expr(condition)?;
                self.append(b" do")?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                self.print_token(end_token)?;
            }
            Stat::NumericFor {
                token,
                vars,
                range,
                body,
                end_token,
            } => {
                self.print_token(token)?;
                self.space()?;
                self.print_name_list(vars)?;
                self.sep_assign()?;
                self.print_expr_list(range)?;
                self.append(b" do")?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                self.print_token(end_token)?;
            }
            Stat::GenericFor {
                token,
                vars,
                exprs,
                body,
                end_token,
            } => {
                self.print_token(token)?;
                self.space()?;
                self.print_name_list(vars)?;
                self.append(b" in ")?;
                self.print_expr_list(exprs)?;
                self.append(b" do")?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                self.print_token(end_token)?;
            }
            Stat::Repeat {
                token,
                body,
                until_token,
                condition,
            } => {
                self.print_token(token)?;
                self.enter_group()?;
                self.print_block(body)?;
                self.exit_group();
                self.print_token(until_token)?;
                self.space()?;
                self.print_expr(condition)?;
            }
            Stat::Function {
                name_chain,
                is_method,
                func,
            } => {
                self.print_token(func.token)?;
                self.space()?;
                for (i, name) in name_chain.iter().enumerate() {
                    if i > 0 {
                        if *is_method && i == name_chain.len() - 1 {
                            self.append(b":")?;
                        } else {
                            self.append(b".")?;
                        }
                    }
                    self.print_token(name)?;
                }
                self.print_func_rest(func)?;
            }
            Stat::LocalFunction { token, name, func } => {
                self.print_token(token)?;
                self.space()?;
                self.print_token(func.token)?;
                self.space()?;
                self.print_token(name)?;
                self.print_func_rest(func)?;
            }
            Stat::LocalVar {
                token,
                names,
                exprs,
            } => {
                self.print_token(token)?;
                self.space()?;
                self.print_name_list(names)?;
                if !exprs.is_empty() {
                    self.sep_assign()?;
                    self.print_expr_list(exprs)?;
                }
            }
            Stat::Return { token, exprs } => {
                self.print_token(token)?;
                if !exprs.is_empty() {
                    self.space()?;
                    self.print_expr_list(exprs)?;
                }
            }
            Stat::Break { token } => self.print_token(token)?,
            Stat::Goto { token, label } => {
                self.print_token(token)?;
                self.space()?;
                self.print_token(label)?;
            }
            Stat::Label { token, name } => {
                self.print_token(token)?;
                self.print_token(name)?;
                self.append(b"::")?;
            }
        }

        self.breakline()?;
        if self.mode == Mode::Auto {
            self.last_group = Self::stat_group(stat);
        }
        Ok(())
    }

    fn apply_group_rules(&mut self, stat: &Stat<'_>) -> io::Result<()> {
        // a fresh block body never opens with a blank line
        if self.last_group == StatGroup::None {
            return Ok(());
        }
        let group = Self::stat_group(stat);
        if group == StatGroup::Block || group != self.last_group {
            self.append(b"\n")?;
        }
        Ok(())
    }

    fn stat_group(stat: &Stat<'_>) -> StatGroup {
        match stat {
            Stat::If { .. }
            | Stat::Do { .. }
            | Stat::While { .. }
            | Stat::NumericFor { .. }
            | Stat::GenericFor { .. }
            | Stat::Repeat { .. }
            | Stat::Function { .. }
            | Stat::LocalFunction { .. } => StatGroup::Block,
            Stat::LocalVar { .. } => StatGroup::LocalDecl,
            Stat::Label { .. } => StatGroup::Label,
            Stat::Assignment { .. } => StatGroup::Assign,
            Stat::Break { .. } => StatGroup::Break,
            Stat::Return { .. } => StatGroup::Return,
            Stat::Call { .. } => StatGroup::Call,
            Stat::Goto { .. } => StatGroup::Goto,
        }
    }

    // === Expressions ===

    fn print_expr(&mut self, expr: &Expr<'_>) -> io::Result<()> {
        match expr {
            Expr::Number { token }
            | Expr::String { token }
            | Expr::Nil { token }
            | Expr::Boolean { token }
            | Expr::Varargs { token }
            | Expr::Variable { token } => self.print_token(token),
            Expr::Unary { op, token, rhs } => {
                self.print_token(token)?;
                if *op == UnaryOp::Not {
                    self.space()?;
                }
                self.print_expr(rhs)
            }
            Expr::Binary { op, lhs, rhs } => {
                self.print_expr(lhs)?;
                if self.mode == Mode::Compress && !op.is_word() {
                    self.append(op.as_str().as_bytes())?;
                } else {
                    self.space()?;
                    self.append(op.as_str().as_bytes())?;
                    self.space()?;
                }
                self.print_expr(rhs)
            }
            Expr::Paren { token, expr } => {
                self.print_token(token)?;
                self.print_expr(expr)?;
                self.append(b")")
            }
            Expr::Field { base, name } => {
                self.print_expr(base)?;
                self.append(b".")?;
                self.print_token(name)
            }
            Expr::Index { base, index } => {
                self.print_expr(base)?;
                self.append(b"[")?;
                self.print_expr(index)?;
                self.append(b"]")
            }
            Expr::Method { base, name, args } => {
                self.print_expr(base)?;
                self.append(b":")?;
                self.print_token(name)?;
                self.print_call_args(args)
            }
            Expr::Call { base, args } => {
                self.print_expr(base)?;
                self.print_call_args(args)
            }
            Expr::Function { func } => {
                self.print_token(func.token)?;
                self.print_func_rest(func)
            }
            Expr::Table {
                token,
                entries,
                end_token,
            } => self.print_table(token, entries, end_token),
        }
    }

    fn print_call_args(&mut self, args: &CallArgs<'_>) -> io::Result<()> {
        match args {
            CallArgs::Parens { args, .. } => {
                self.append(b"(")?;
                self.print_expr_list(args)?;
                self.append(b")")
            }
            CallArgs::Table { expr } => self.print_expr(expr),
            CallArgs::String { token } => self.print_token(token),
        }
    }

    /// Parameter list, body and closing `end` shared by every function
    /// form; the caller has already printed the name.
    fn print_func_rest(&mut self, func: &FuncBody<'_>) -> io::Result<()> {
        self.append(b"(")?;
        self.print_name_list(func.params)?;
        self.append(b")")?;
        self.enter_group()?;
        self.print_block(func.body)?;
        self.exit_group();
        self.print_token(func.end_token)
    }

    /// Table constructors are the one place output shape depends on the
    /// content: up to ten entries that are all bare values stay on one
    /// line, everything else goes one entry per indented line with a
    /// trailing comma.
    fn print_table(
        &mut self,
        open: &Token<'_>,
        entries: &[TableEntry<'_>],
        close: &Token<'_>,
    ) -> io::Result<()> {
        self.print_token(open)?;

        if !entries.is_empty() {
            if self.mode == Mode::Compress {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.append(b",")?;
                    }
                    match entry {
                        TableEntry::Field { name, value } => {
                            self.print_token(name)?;
                            self.append(b"=")?;
                            self.print_expr(value)?;
                        }
                        TableEntry::Index { index, value, .. } => {
                            self.append(b"[")?;
                            self.print_expr(index)?;
                            self.append(b"]=")?;
                            self.print_expr(value)?;
                        }
                        TableEntry::Value { value } => self.print_expr(value)?,
                    }
                }
            } else {
                let one_line = entries.len() <= 10
                    && entries.iter().all(|e| matches!(e, TableEntry::Value { .. }));
                if one_line {
                    for (i, entry) in entries.iter().enumerate() {
                        if i > 0 {
                            self.append(b", ")?;
                        }
                        if let TableEntry::Value { value } = entry {
                            self.print_expr(value)?;
                        }
                    }
                } else {
                    self.breakline()?;
                    self.indent += 1;
                    for entry in entries {
                        match entry {
                            TableEntry::Field { name, value } => {
                                self.print_token(name)?;
                                self.append(b" = ")?;
                                self.print_expr(value)?;
                            }
                            TableEntry::Index {
                                bracket,
                                index,
                                value,
                            } => {
                                self.print_token(bracket)?;
                                self.print_expr(index)?;
                                self.append(b"] = ")?;
                                self.print_expr(value)?;
                            }
                            TableEntry::Value { value } => self.print_expr(value)?,
                        }
                        self.append(b",")?;
                        self.breakline()?;
                    }
                    self.indent -= 1;
                }
            }
        }

        self.print_token(close)
    }

    // === Lists ===

    fn print_expr_list(&mut self, list: &[&Expr<'_>]) -> io::Result<()> {
        for (i, expr) in list.iter().enumerate() {
            if i > 0 {
                self.sep_comma()?;
            }
            self.print_expr(expr)?;
        }
        Ok(())
    }

    fn print_name_list(&mut self, list: &[TokenRef<'_>]) -> io::Result<()> {
        for (i, name) in list.iter().enumerate() {
            if i > 0 {
                self.sep_comma()?;
            }
            self.print_token(name)?;
        }
        Ok(())
    }
}
