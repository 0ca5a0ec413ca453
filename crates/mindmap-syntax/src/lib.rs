//! # mindmap-syntax
//!
//! Tokenizer for MMD, the markdown-flavoured outline format mind maps are
//! stored in. A document is a free-form header closed by a line of dashes,
//! followed by headings whose `#` count gives the nesting depth:
//!
//! ~~~text
//! Mind Map generated by NB MindMap plugin
//! > __version__=`1.1`
//! ---
//!
//! # Root
//! > fillColor=`#ff0000`
//! - NOTE
//! <pre>remember this</pre>
//!
//! ## Child
//! ```Shell
//! exit
//! ```
//! ~~~
//!
//! The lexer is lossless, so tools can report exact byte spans. Building a
//! tree from the tokens is left to `mindmap-model`.
//!
//! ## Quick Start
//!
//! ```
//! use mindmap_syntax::{lex, TokenKind};
//!
//! let tokens = lex("---\n# Root\n");
//! assert_eq!(tokens[1].kind, TokenKind::TopicLevel);
//! assert_eq!(tokens[2].line_text(), "Root");
//! ```

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{Lexer, lex};
pub use token::{Token, TokenKind};
