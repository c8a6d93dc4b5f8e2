// Core modules defining the source language
pub mod ast;
pub mod error;
pub mod grammar;
pub mod token;

// The three-stage pipeline: bytes -> tokens -> AST -> bytes
pub mod lexer;
pub mod parser;
pub mod printer;

// Driver: file processing, task manifests, incremental cache
pub mod driver;
pub mod task;

use crate::ast::Block;
use crate::lexer::LexOutput;
use crate::token::CommentRecord;
use bumpalo::Bump;
use mimalloc::MiMalloc;
use ouroboros::self_referencing;
use std::io::{self, Write};

// Re-export the most important types for easy access
pub use error::{Error, LexError, ParseError, Result};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Output mode of the pipeline. The mode steers both the lexer (what
/// ends up in the comment sidecar) and the printer (what the output
/// looks like), so one value configures a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Minified output; comments and blank lines are discarded.
    Compress,
    /// Pretty-printed; blank lines are synthesised from statement
    /// grouping.
    Auto,
    /// Pretty-printed; user-authored blank lines are preserved.
    Manual,
}

/// One fully processed source file, created using `ouroboros` to safely
/// manage the self-referential relationship between the source string,
/// the token and comment vectors borrowing it, the arena allocator, and
/// the AST borrowing both.
///
/// Dropping the `Chunk` releases the source buffer, the token vectors
/// and every AST node in one sweep; nothing survives a file boundary.
#[self_referencing]
pub struct Chunk {
    /// The source text, which owns the slices referenced by tokens and
    /// comment records.
    source: String,
    /// The Bump allocator, which owns the AST nodes and sub-sequences.
    arena: Bump,

    /// Tokens and comment sidecar cut from `source`.
    #[borrows(source)]
    #[covariant]
    lexed: LexOutput<'this>,

    /// The root block of the AST, allocated in `arena` and referencing
    /// tokens in `lexed`.
    #[borrows(arena, lexed)]
    #[covariant]
    root: &'this Block<'this>,
}

impl Chunk {
    /// Access the root block of the parsed AST.
    pub fn root(&self) -> &Block<'_> {
        self.borrow_root()
    }

    /// The comment sidecar recorded while lexing.
    pub fn comments(&self) -> &[CommentRecord<'_>] {
        &self.borrow_lexed().comments
    }

    /// Print the chunk to a sink in the given mode. The mode should be
    /// the one the chunk was lexed with, since only that mode's comment
    /// records are available.
    pub fn write<W: Write>(&self, mode: Mode, out: W) -> io::Result<()> {
        printer::print_chunk(self.borrow_root(), &self.borrow_lexed().comments, mode, out)
    }

    /// Print the chunk into a fresh byte buffer.
    pub fn render(&self, mode: Mode) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(mode, &mut out)?;
        Ok(out)
    }
}

/// Lex and parse one source buffer into an owned [`Chunk`].
///
/// On failure the first lex or parse error is returned, already carrying
/// `file_name` and the offending line.
pub fn parse_chunk(source: String, file_name: &str, mode: Mode) -> Result<Chunk> {
    Chunk::try_new(
        source,
        Bump::new(),
        |source| lexer::lex(source, file_name, mode).map_err(Error::from),
        |arena, lexed| parser::parse(&lexed.tokens, file_name, arena).map_err(Error::from),
    )
}

/// Lex, parse and re-print a whole source buffer in one call.
pub fn rewrite(source: String, file_name: &str, mode: Mode) -> Result<Vec<u8>> {
    let chunk = parse_chunk(source, file_name, mode)?;
    chunk
        .render(mode)
        .map_err(|source| Error::io(file_name, source))
}
