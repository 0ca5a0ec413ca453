//! # Lexer - Tokenizing MMD Source
//!
//! MMD is line oriented: the first characters of a line decide what the line
//! is. The lexer therefore walks the input with a [`Cursor`] and only uses
//! [Logos] to classify the head of each body line.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token:
//!
//! ```
//! use mindmap_syntax::lexer::lex;
//!
//! let input = "Banner\n---\n\n# Root\n> fillColor=`#ff0000`\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Modes
//!
//! The lexer starts in header mode where every line is a token of its own
//! until a line of dashes. After that it switches to body mode. Topic titles
//! and fenced code bodies need one token of lookbehind, which is kept in
//! [`Mode`] rather than in the token stream.

use logos::Logos;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Markers recognised at the start of a body line.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum LineHead {
    #[regex(r"#+[ \t]?")]
    TopicLevel,

    #[token("> ")]
    Attribute,

    #[token("- ")]
    PayloadType,

    #[token("<pre>")]
    PreOpen,

    #[token("```")]
    Fence,
}

const PRE_CLOSE: &str = "</pre>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Header,
    Body,
    /// Just emitted a [`TokenKind::TopicLevel`].
    TopicTitle,
    /// Just emitted a [`TokenKind::CodeSnippetStart`].
    SnippetBody,
    /// Just emitted a [`TokenKind::CodeSnippetBody`] that has a closing fence.
    SnippetEnd,
}

/// Streaming MMD tokenizer.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    mode: Mode,
    /// Backtick count of the open code fence.
    fence: usize,
}

impl<'a> Lexer<'a> {
    /// Lexer for a complete document, starting in header mode.
    pub fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
            mode: Mode::Header,
            fence: 0,
        }
    }

    /// Lexer for a headerless fragment, starting directly in body mode.
    pub fn body(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
            mode: Mode::Body,
            fence: 0,
        }
    }

    fn lex_header_line(&mut self) -> TokenKind {
        let start = self.cursor.pos();
        let attribute = self.cursor.starts_with("> ");
        self.cursor.eat_line();
        let line = &self.cursor.s[start..self.cursor.pos()];

        if is_run_of(line, '-') {
            self.mode = Mode::Body;
            TokenKind::HeaderDelimiter
        } else if attribute {
            TokenKind::Attribute
        } else {
            TokenKind::HeaderLine
        }
    }

    fn lex_body(&mut self) -> TokenKind {
        if self.cursor.peek().is_some_and(is_blank) {
            self.cursor.eat_while(is_blank);
            return TokenKind::Whitespace;
        }

        let mut heads = LineHead::lexer(self.cursor.rest());
        let head = heads.next().and_then(Result::ok);
        let head_len = heads.span().end;

        match head {
            Some(LineHead::TopicLevel) => {
                self.cursor.bump_n(head_len);
                self.mode = Mode::TopicTitle;
                TokenKind::TopicLevel
            }
            Some(LineHead::Attribute) => {
                self.cursor.eat_line();
                TokenKind::Attribute
            }
            Some(LineHead::PayloadType) => {
                self.cursor.eat_line();
                TokenKind::PayloadType
            }
            Some(LineHead::PreOpen) => {
                match self.cursor.rest().find(PRE_CLOSE) {
                    Some(offset) => self.cursor.bump_n(offset + PRE_CLOSE.len()),
                    None => self.cursor.eat_all(),
                }
                TokenKind::PayloadText
            }
            Some(LineHead::Fence) => {
                let start = self.cursor.pos();
                self.cursor.eat_line();
                let line = &self.cursor.s[start..self.cursor.pos()];
                if is_run_of(line, '`') {
                    TokenKind::CodeSnippetEnd
                } else {
                    self.fence = line.bytes().take_while(|b| *b == b'`').count();
                    self.mode = Mode::SnippetBody;
                    TokenKind::CodeSnippetStart
                }
            }
            None => {
                self.cursor.eat_line();
                TokenKind::UnknownLine
            }
        }
    }

    fn lex_snippet_body(&mut self) -> TokenKind {
        match closing_fence_offset(self.cursor.rest(), self.fence) {
            Some(0) => {
                self.cursor.eat_line();
                self.mode = Mode::Body;
                TokenKind::CodeSnippetEnd
            }
            Some(offset) => {
                self.cursor.bump_n(offset);
                self.mode = Mode::SnippetEnd;
                TokenKind::CodeSnippetBody
            }
            None => {
                self.cursor.eat_all();
                self.mode = Mode::Body;
                TokenKind::CodeSnippetBody
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.cursor.eof() {
            return None;
        }
        let start = self.cursor.pos();

        let kind = match self.mode {
            Mode::Header => self.lex_header_line(),
            Mode::Body => self.lex_body(),
            Mode::TopicTitle => {
                self.cursor.eat_line();
                self.mode = Mode::Body;
                TokenKind::TopicTitle
            }
            Mode::SnippetBody => self.lex_snippet_body(),
            Mode::SnippetEnd => {
                self.cursor.eat_line();
                self.mode = Mode::Body;
                TokenKind::CodeSnippetEnd
            }
        };

        let end = self.cursor.pos();
        if end == start {
            // No progress means nothing more can be lexed.
            return None;
        }
        Some(Token {
            kind,
            text: &self.cursor.s[start..end],
            span: start..end,
        })
    }
}

/// Lex a complete MMD document into tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

fn is_blank(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// True when the line, minus its terminator, is one or more `marker` chars.
fn is_run_of(line: &str, marker: char) -> bool {
    let body = line.trim_end_matches(['\n', '\r']);
    !body.is_empty() && body.chars().all(|c| c == marker)
}

/// Byte offset of the next line that is a fence of exactly `width`
/// backticks.
fn closing_fence_offset(text: &str, width: usize) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if is_run_of(line, '`') && line.trim_end_matches(['\n', '\r']).len() == width {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
