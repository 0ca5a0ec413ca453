//! Token stream to [`MindMap`].
//!
//! The header is read first: attribute lines there become document
//! attributes and everything else is skipped until the dashed delimiter.
//! The body is then folded into a tree by heading level. A heading more
//! than one level below the current topic is treated as its direct child,
//! and a level-one heading after the first starts a fresh tree that
//! replaces the previous one.

use mindmap_syntax::{Lexer, Token, TokenKind};

use crate::codec::attribute_line::parse_attributes;
use crate::codec::escape::unescape_markdown;
use crate::error::{FormatError, ModelError};
use crate::map::{MindMap, NodeId, Topic};
use crate::payload::{Discriminant, Payload};

const PRE_OPEN: &str = "<pre>";
const PRE_CLOSE: &str = "</pre>";

/// Parser behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop malformed payload blocks with a warning instead of failing.
    pub ignore_errors: bool,
}

/// Parses MMD text into a new map.
pub fn parse(text: &str, options: &ParseOptions) -> Result<MindMap, FormatError> {
    let mut tokens = Lexer::new(text);
    let mut map = MindMap::blank();
    read_header(&mut tokens, &mut map)?;

    let mut builder = TreeBuilder::new(map, options);
    for token in tokens {
        builder.feed(&token)?;
    }
    Ok(builder.map)
}

fn read_header(tokens: &mut Lexer<'_>, map: &mut MindMap) -> Result<(), FormatError> {
    for token in tokens.by_ref() {
        match token.kind {
            TokenKind::HeaderDelimiter => return Ok(()),
            TokenKind::Attribute => {
                for (name, value) in parse_attributes(token.text) {
                    map.set_global_attribute(&name, Some(&value))?;
                }
            }
            _ => {}
        }
    }
    Err(FormatError::HeaderNotFound)
}

struct TreeBuilder<'o> {
    map: MindMap,
    options: &'o ParseOptions,
    current: Option<NodeId>,
    /// Heading level of `current`, 0 before the first topic.
    depth: usize,
    /// Level announced by the last `TopicLevel` token.
    level: usize,
    pending: Option<Discriminant>,
    snippet: Option<(String, String)>,
}

impl<'o> TreeBuilder<'o> {
    fn new(map: MindMap, options: &'o ParseOptions) -> Self {
        Self {
            map,
            options,
            current: None,
            depth: 0,
            level: 0,
            pending: None,
            snippet: None,
        }
    }

    fn feed(&mut self, token: &Token<'_>) -> Result<(), FormatError> {
        match token.kind {
            TokenKind::TopicLevel => {
                self.level = token.text.bytes().take_while(|b| *b == b'#').count();
            }
            TokenKind::TopicTitle => {
                self.pending = None;
                self.add_topic(unescape_markdown(token.line_text()))?;
            }
            TokenKind::Attribute => {
                self.pending = None;
                if let Some(current) = self.current {
                    for (name, value) in parse_attributes(token.text) {
                        self.map.set_attribute(current, &name, Some(&value))?;
                    }
                }
            }
            TokenKind::PayloadType => {
                let name = token.line_text().trim_start_matches('-').trim();
                self.pending = Discriminant::from_name(name);
                if self.pending.is_none() {
                    log::debug!("Ignoring payload of unknown type {name:?}");
                }
            }
            TokenKind::PayloadText => self.add_payload(token)?,
            TokenKind::CodeSnippetStart => {
                let language = token.line_text().trim_start_matches('`').trim();
                self.snippet = Some((language.to_string(), String::new()));
            }
            TokenKind::CodeSnippetBody => {
                if let Some((_, body)) = &mut self.snippet {
                    body.push_str(token.text);
                }
            }
            TokenKind::CodeSnippetEnd => {
                if let Some((language, body)) = self.snippet.take()
                    && let Some(current) = self.current
                {
                    match self.map.set_code_snippet(current, &language, Some(&body)) {
                        Err(ModelError::InvalidSnippetLanguage(_)) => {
                            log::debug!("Skipping code snippet with language {language:?}");
                        }
                        result => {
                            result?;
                        }
                    }
                }
            }
            TokenKind::UnknownLine => {
                self.pending = None;
                log::debug!("Skipping unknown line at byte {}", token.span.start);
            }
            TokenKind::Whitespace | TokenKind::HeaderLine | TokenKind::HeaderDelimiter => {}
        }
        Ok(())
    }

    fn add_topic(&mut self, text: String) -> Result<(), FormatError> {
        let level = self.level.clamp(1, self.depth + 1);
        let mut anchor = self.current;
        for _ in 0..(self.depth + 1 - level) {
            anchor = anchor.and_then(|id| self.map.topic(id).and_then(Topic::parent));
        }

        match anchor {
            Some(parent) => {
                self.current = Some(self.map.make_child(parent, text, None)?);
                self.depth = level;
            }
            None => self.start_tree(text)?,
        }
        Ok(())
    }

    fn start_tree(&mut self, text: String) -> Result<(), FormatError> {
        let topic = self.map.create_topic(text);
        let previous = self.map.root();
        self.map.set_root(Some(topic), false)?;
        if let Some(previous) = previous {
            log::warn!("Discarding topic tree {previous}, the document has more than one top level topic");
            self.map.delete(previous)?;
        }
        self.current = Some(topic);
        self.depth = 1;
        Ok(())
    }

    fn add_payload(&mut self, token: &Token<'_>) -> Result<(), FormatError> {
        let (Some(discriminant), Some(current)) = (self.pending.take(), self.current) else {
            return Ok(());
        };
        let offset = token.span.start;

        let Some(stored) = token
            .text
            .strip_prefix(PRE_OPEN)
            .and_then(|text| text.strip_suffix(PRE_CLOSE))
        else {
            return self.recover(FormatError::UnterminatedPayload {
                discriminant,
                offset,
            });
        };

        let loaded = Payload::parse_loaded(discriminant, stored, self.map.check(current)?.attributes());
        match loaded {
            Ok(payload) => {
                self.map.set_payload(current, payload)?;
                Ok(())
            }
            Err(source) => self.recover(FormatError::InvalidPayload {
                discriminant,
                offset,
                source,
            }),
        }
    }

    fn recover(&self, error: FormatError) -> Result<(), FormatError> {
        if self.options.ignore_errors {
            log::warn!("Dropping payload: {error}");
            Ok(())
        } else {
            Err(error)
        }
    }
}
