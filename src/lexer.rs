//! Zero-copy lexer for Lua source code
//!
//! The lexer walks the raw byte buffer and cuts tokens as slices of it,
//! so no token text is ever copied. Comments and blank lines go into a
//! separate sidecar stream; in `Compress` mode they are discarded
//! outright, and only `Manual` mode records blank lines.

use crate::error::{LexError, LexResult};
use crate::token::{
    is_equal_symbol_byte, is_identifier_byte, is_identifier_start_byte, is_keyword,
    is_symbol_byte, CommentKind, CommentRecord, Token, TokenKind,
};
use crate::Mode;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sentinel byte returned by `peek` past the end of input.
const EOF_BYTE: u8 = 0;

/// Everything the lexer produces for one file: the token sequence
/// (terminated by an `Eof` sentinel) and the ordered comment sidecar.
#[derive(Debug)]
pub struct LexOutput<'src> {
    pub tokens: Vec<Token<'src>>,
    pub comments: Vec<CommentRecord<'src>>,
}

/// Tokenize a whole source buffer.
pub fn lex<'src>(source: &'src str, file_name: &str, mode: Mode) -> LexResult<LexOutput<'src>> {
    Lexer::new(source, file_name, mode).run()
}

struct Lexer<'src, 'f> {
    text: &'src str,
    bytes: &'src [u8],
    file: &'f str,
    mode: Mode,
    pos: usize,
    line: u32,
    tokens: Vec<Token<'src>>,
    comments: Vec<CommentRecord<'src>>,
}

impl<'src, 'f> Lexer<'src, 'f> {
    fn new(source: &'src str, file_name: &'f str, mode: Mode) -> Self {
        Self {
            text: source,
            bytes: source.as_bytes(),
            file: file_name,
            mode,
            pos: 0,
            line: 1,
            tokens: Vec::with_capacity(source.len() / 4),
            comments: Vec::new(),
        }
    }

    fn run(mut self) -> LexResult<LexOutput<'src>> {
        if self.bytes.starts_with(BOM) {
            self.pos = BOM.len();
        }
        self.tokenize()?;
        let end = self.text.len();
        self.tokens
            .push(Token::new(&self.text[end..], self.line, TokenKind::Eof));
        Ok(LexOutput {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    fn peek(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(EOF_BYTE)
    }

    fn step(&mut self) {
        self.pos += 1;
    }

    fn get(&mut self) -> u8 {
        let b = self.bytes[self.pos];
        self.pos += 1;
        b
    }

    fn finished(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn push_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens
            .push(Token::new(&self.text[start..self.pos], self.line, kind));
    }

    fn push_comment(&mut self, kind: CommentKind, start: usize) {
        self.comments.push(CommentRecord {
            source: &self.text[start..self.pos],
            line: self.line,
            kind,
        });
    }

    /// Advance to the next `\n` without consuming it.
    fn step_till_newline(&mut self) {
        while !self.finished() && self.peek(0) != b'\n' {
            self.step();
        }
    }

    fn tokenize(&mut self) -> LexResult<()> {
        loop {
            self.skip_whitespace();
            if self.finished() {
                return Ok(());
            }

            let start = self.pos;

            // Comments go to the sidecar (or nowhere, in Compress mode)
            if self.peek(0) == b'-' && self.peek(1) == b'-' {
                self.step();
                self.step();
                if self.peek(0) == b'[' {
                    self.step();
                    if let Some(level) = self.long_bracket_level() {
                        self.read_long_bracket(level)?;
                        if self.mode != Mode::Compress {
                            self.push_comment(CommentKind::LongComment, start);
                        }
                        continue;
                    }
                }
                self.step_till_newline();
                if self.mode != Mode::Compress {
                    self.push_comment(CommentKind::ShortComment, start);
                }
                continue;
            }

            let c1 = self.get();
            match c1 {
                b'\'' | b'"' => self.read_string(c1, start)?,
                c if is_identifier_start_byte(c) => {
                    while is_identifier_byte(self.peek(0)) {
                        self.step();
                    }
                    let kind = if is_keyword(&self.text[start..self.pos]) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Identifier
                    };
                    self.push_token(kind, start);
                }
                // Variadic symbol "...", treated as a special identifier
                b'.' if self.peek(0) == b'.' && self.peek(1) == b'.' => {
                    self.step();
                    self.step();
                    self.push_token(TokenKind::Identifier, start);
                }
                c if c.is_ascii_digit() => self.read_number(c, start)?,
                b'.' if self.peek(0).is_ascii_digit() => {
                    self.consume_digits();
                    self.read_exponent()?;
                    self.push_token(TokenKind::Number, start);
                }
                b'[' => {
                    if let Some(level) = self.long_bracket_level() {
                        self.read_long_bracket(level)?;
                        self.push_token(TokenKind::String, start);
                    } else {
                        self.push_token(TokenKind::Symbol, start);
                    }
                }
                // ".." or "."
                b'.' => {
                    if self.peek(0) == b'.' {
                        self.step();
                    }
                    self.push_token(TokenKind::Symbol, start);
                }
                // ==, ~=, <=, >= or the single-character form
                c if is_equal_symbol_byte(c) => {
                    if self.peek(0) == b'=' {
                        self.step();
                    }
                    self.push_token(TokenKind::Symbol, start);
                }
                // label delimiter "::"
                b':' if self.peek(0) == b':' => {
                    self.step();
                    self.push_token(TokenKind::Symbol, start);
                }
                c if is_symbol_byte(c) => self.push_token(TokenKind::Symbol, start),
                c => {
                    return Err(LexError::BadSymbol {
                        byte: c as char,
                        file: self.file.to_string(),
                        line: self.line,
                    })
                }
            }
        }
    }

    /// Skip {space, tab, CR, LF}, counting lines. In manual mode a run
    /// holding two or more newlines leaves one `BlankLine` record at the
    /// line just before the run ends.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek(0) {
                b' ' | b'\t' | b'\r' => self.step(),
                b'\n' => {
                    self.step();
                    self.line += 1;
                    if self.mode == Mode::Manual {
                        let mut blank_detected = false;
                        loop {
                            match self.peek(0) {
                                b'\n' => {
                                    blank_detected = true;
                                    self.line += 1;
                                }
                                b' ' | b'\t' | b'\r' => {}
                                _ => break,
                            }
                            self.step();
                        }
                        if blank_detected {
                            self.comments.push(CommentRecord {
                                source: "",
                                line: self.line - 1,
                                kind: CommentKind::BlankLine,
                            });
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Read a quoted string literal; the opening quote is consumed. A
    /// backslash protects exactly one following byte, which is the only
    /// way a newline may appear inside the literal.
    fn read_string(&mut self, quote: u8, start: usize) -> LexResult<()> {
        loop {
            if self.finished() {
                return Err(LexError::UnterminatedString {
                    file: self.file.to_string(),
                    line: self.line,
                });
            }
            match self.get() {
                b'\n' => {
                    return Err(LexError::NewlineInString {
                        file: self.file.to_string(),
                        line: self.line,
                    })
                }
                b'\\' => {
                    if self.finished() {
                        return Err(LexError::UnterminatedString {
                            file: self.file.to_string(),
                            line: self.line,
                        });
                    }
                    if self.get() == b'\n' {
                        self.line += 1;
                    }
                }
                c if c == quote => break,
                _ => {}
            }
        }
        self.push_token(TokenKind::String, start);
        Ok(())
    }

    /// Read a number literal; the first digit is already consumed.
    fn read_number(&mut self, first: u8, start: usize) -> LexResult<()> {
        if first == b'0' && self.peek(0) == b'x' {
            self.step();
            while self.peek(0).is_ascii_hexdigit() {
                self.step();
            }
        } else {
            self.consume_digits();
            if self.peek(0) == b'.' {
                self.step();
                self.consume_digits();
            }
            self.read_exponent()?;
        }
        self.push_token(TokenKind::Number, start);
        Ok(())
    }

    /// Read an optional `[eE][+-]?digits` suffix. Digits are mandatory
    /// once the `e` has been seen.
    fn read_exponent(&mut self) -> LexResult<()> {
        if matches!(self.peek(0), b'e' | b'E') {
            self.step();
            if matches!(self.peek(0), b'+' | b'-') {
                self.step();
            }
            if !self.peek(0).is_ascii_digit() {
                return Err(LexError::IncompleteExponent {
                    file: self.file.to_string(),
                    line: self.line,
                });
            }
            self.consume_digits();
        }
        Ok(())
    }

    fn consume_digits(&mut self) {
        while self.peek(0).is_ascii_digit() {
            self.step();
        }
    }

    /// Called with one `[` already consumed. If the input continues with
    /// `=*[`, consumes the rest of the opening delimiter and returns the
    /// `=` count; otherwise consumes nothing and returns None.
    fn long_bracket_level(&mut self) -> Option<usize> {
        let init = self.pos;
        while self.peek(0) == b'=' {
            self.step();
        }
        if self.peek(0) == b'[' {
            self.step();
            Some(self.pos - init - 1)
        } else {
            self.pos = init;
            None
        }
    }

    /// Consume long-bracket content up to and including the closing
    /// `]=*]` with exactly `level` equals.
    fn read_long_bracket(&mut self, level: usize) -> LexResult<()> {
        loop {
            if self.finished() {
                return Err(LexError::UnterminatedLongBracket {
                    file: self.file.to_string(),
                    line: self.line,
                });
            }
            match self.get() {
                b'\n' => self.line += 1,
                b']' => {
                    let mut equals = 0;
                    while self.peek(equals) == b'=' {
                        equals += 1;
                    }
                    if equals == level && self.peek(equals) == b']' {
                        self.pos += equals + 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(source: &str, mode: Mode) -> LexOutput<'_> {
        lex(source, "test.lua", mode).expect("lex should succeed")
    }

    fn token_sources<'a>(out: &'a LexOutput<'a>) -> Vec<&'a str> {
        out.tokens
            .iter()
            .filter(|t| !t.is_eof())
            .map(|t| t.source)
            .collect()
    }

    #[test]
    fn tokenizes_simple_statement() {
        let out = lex_ok("local x = 1\n", Mode::Auto);
        assert_eq!(token_sources(&out), vec!["local", "x", "=", "1"]);
        assert_eq!(out.tokens[0].kind, TokenKind::Keyword);
        assert_eq!(out.tokens[1].kind, TokenKind::Identifier);
        assert_eq!(out.tokens[3].kind, TokenKind::Number);
        assert!(out.tokens.last().unwrap().is_eof());
    }

    #[test]
    fn strips_utf8_bom() {
        let out = lex_ok("\u{FEFF}local x = 1", Mode::Auto);
        assert_eq!(out.tokens[0].source, "local");
    }

    #[test]
    fn two_character_symbols() {
        let out = lex_ok("a <= b ~= c .. d :: e == f >= g", Mode::Compress);
        let syms: Vec<&str> = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Symbol)
            .map(|t| t.source)
            .collect();
        assert_eq!(syms, vec!["<=", "~=", "..", "::", "==", ">="]);
    }

    #[test]
    fn varargs_is_one_identifier_token() {
        let out = lex_ok("f(...)", Mode::Compress);
        assert_eq!(out.tokens[2].source, "...");
        assert_eq!(out.tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn numbers() {
        let out = lex_ok("1 0xFF 3.14 1e5 2.5E-3 .5", Mode::Compress);
        let nums: Vec<&str> = token_sources(&out);
        assert_eq!(nums, vec!["1", "0xFF", "3.14", "1e5", "2.5E-3", ".5"]);
        assert!(out
            .tokens
            .iter()
            .filter(|t| !t.is_eof())
            .all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn incomplete_exponent_is_fatal() {
        let err = lex("x = 1e+", "f.lua", Mode::Auto).unwrap_err();
        assert!(matches!(err, LexError::IncompleteExponent { .. }));
    }

    #[test]
    fn string_escapes_protect_quotes_and_newlines() {
        let out = lex_ok("'a\\'b' \"c\\\nd\"", Mode::Compress);
        assert_eq!(out.tokens[0].source, "'a\\'b'");
        assert_eq!(out.tokens[1].source, "\"c\\\nd\"");
        // the escaped newline still counts toward line numbers
        assert_eq!(out.tokens[1].line, 2);
    }

    #[test]
    fn raw_newline_kills_string() {
        let err = lex("'abc\ndef'", "f.lua", Mode::Auto).unwrap_err();
        assert!(matches!(err, LexError::NewlineInString { .. }));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = lex("'abc", "f.lua", Mode::Auto).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn long_string_levels_must_match() {
        let out = lex_ok("[==[ a ]] b ]=] c ]==]", Mode::Compress);
        assert_eq!(out.tokens[0].source, "[==[ a ]] b ]=] c ]==]");
        assert_eq!(out.tokens[0].kind, TokenKind::String);

        let err = lex("[==[ never closed ]=]", "f.lua", Mode::Auto).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedLongBracket { .. }));
    }

    #[test]
    fn comments_are_dropped_in_compress_mode() {
        let out = lex_ok("-- hi\nlocal x = 1 --[[ bye ]]\n", Mode::Compress);
        assert!(out.comments.is_empty());
        assert_eq!(token_sources(&out), vec!["local", "x", "=", "1"]);
    }

    #[test]
    fn comments_are_recorded_in_format_modes() {
        let out = lex_ok("-- hi\nlocal x = 1 --[[ bye ]]\n", Mode::Auto);
        assert_eq!(out.comments.len(), 2);
        assert_eq!(out.comments[0].source, "-- hi");
        assert_eq!(out.comments[0].kind, CommentKind::ShortComment);
        assert_eq!(out.comments[0].line, 1);
        assert_eq!(out.comments[1].source, "--[[ bye ]]");
        assert_eq!(out.comments[1].kind, CommentKind::LongComment);
    }

    #[test]
    fn blank_lines_recorded_only_in_manual_mode() {
        let source = "local a = 1\n\n\nlocal b = 2\n";
        let auto = lex_ok(source, Mode::Auto);
        assert!(auto.comments.is_empty());

        let manual = lex_ok(source, Mode::Manual);
        assert_eq!(manual.comments.len(), 1);
        assert_eq!(manual.comments[0].kind, CommentKind::BlankLine);
        // one record per run, at the line just before the run ends
        assert_eq!(manual.comments[0].line, 3);
    }

    #[test]
    fn bad_byte_reports_file_and_line() {
        let err = lex("local x\n$", "bad.lua", Mode::Auto).unwrap_err();
        assert_eq!(err.line(), 2);
        match err {
            LexError::BadSymbol { byte, file, line } => {
                assert_eq!(byte, '$');
                assert_eq!(file, "bad.lua");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn slices_plus_whitespace_cover_the_input() {
        let source = "\u{FEFF}local x = 1 -- hi\nif x then\n\tf('a b')\nend\n";
        let out = lex_ok(source, Mode::Auto);
        let base = source.as_ptr() as usize;
        let mut covered = vec![false; source.len()];
        let slices = out
            .tokens
            .iter()
            .map(|t| t.source)
            .chain(out.comments.iter().map(|c| c.source))
            .filter(|s| !s.is_empty());
        for slice in slices {
            let start = slice.as_ptr() as usize - base;
            for seen in &mut covered[start..start + slice.len()] {
                assert!(!*seen, "token and comment slices must not overlap");
                *seen = true;
            }
        }
        // everything not covered by a slice is whitespace or the BOM
        for (i, b) in source.bytes().enumerate() {
            if !covered[i] {
                assert!(
                    matches!(b, b' ' | b'\t' | b'\r' | b'\n') || i < 3,
                    "byte {i} ({b:#04x}) neither tokenized nor whitespace"
                );
            }
        }
    }
}
