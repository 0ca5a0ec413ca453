use std::ops::Range;

/// Kinds of tokens in an MMD document.
///
/// The header kinds only appear before the first [`TokenKind::HeaderDelimiter`];
/// everything after it is lexed in body mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Free text line in the document header (the banner, usually).
    HeaderLine,
    /// `> key=`value`,...` line, in the header or under a topic.
    Attribute,
    /// Line of dashes closing the header.
    HeaderDelimiter,
    /// Run of `#` plus at most one following space or tab.
    TopicLevel,
    /// Remainder of a heading line, newline included.
    TopicTitle,
    /// `- NAME` line announcing the next payload block.
    PayloadType,
    /// `<pre>...</pre>` block, possibly spanning several lines.
    PayloadText,
    /// Opening fence with its language tag.
    CodeSnippetStart,
    CodeSnippetBody,
    CodeSnippetEnd,
    /// Whitespace and control characters between body lines.
    Whitespace,
    /// A body line that matches nothing else.
    UnknownLine,
}

/// A lexed token with its kind, text slice, and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Token<'_> {
    /// The token text without its trailing line terminator.
    pub fn line_text(&self) -> &str {
        self.text.trim_end_matches(['\n', '\r'])
    }
}
