//! Error types for the lunafmt pipeline
//!
//! Lexing and parsing errors abort the current file only and carry the
//! file name plus the 1-based line of the offending input, so a single
//! `file:line:` log line can be produced for each failure. I/O and
//! configuration errors belong to the driver layer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Lexical analysis errors. The first one encountered aborts the file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("{file}:{line}: bad symbol {byte:?} in source")]
    BadSymbol { byte: char, file: String, line: u32 },

    #[error("{file}:{line}: string literal not closed")]
    UnterminatedString { file: String, line: u32 },

    #[error("{file}:{line}: string literal killed by newline")]
    NewlineInString { file: String, line: u32 },

    #[error("{file}:{line}: long bracket not closed")]
    UnterminatedLongBracket { file: String, line: u32 },

    #[error("{file}:{line}: exponent part incomplete in number literal")]
    IncompleteExponent { file: String, line: u32 },
}

impl LexError {
    pub fn line(&self) -> u32 {
        match self {
            LexError::BadSymbol { line, .. }
            | LexError::UnterminatedString { line, .. }
            | LexError::NewlineInString { line, .. }
            | LexError::UnterminatedLongBracket { line, .. }
            | LexError::IncompleteExponent { line, .. } => *line,
        }
    }
}

/// Parse errors. No recovery is attempted; the first mismatch wins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{file}:{line}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        file: String,
        line: u32,
    },

    #[error("{file}:{line}: {message}")]
    InvalidSyntax {
        message: String,
        file: String,
        line: u32,
    },
}

impl ParseError {
    pub fn line(&self) -> u32 {
        match self {
            ParseError::UnexpectedToken { line, .. } | ParseError::InvalidSyntax { line, .. } => {
                *line
            }
        }
    }
}

/// Unified error type for the whole tool.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type LexResult<T> = std::result::Result<T, LexError>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type Result<T> = std::result::Result<T, Error>;
