use crate::map::NodeId;
use crate::payload::Discriminant;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    #[error("Illegal character {character:?} at index {index} in URI: {input}")]
    IllegalCharacter {
        input: String,
        index: usize,
        character: char,
    },
    #[error("Malformed escape pair at index {index} in URI: {input}")]
    MalformedEscape { input: String, index: usize },
    #[error("Illegal scheme name in URI: {input}")]
    IllegalScheme { input: String },
}

/// Fatal problems found while parsing MMD text. No partial map is returned.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("End of header not found")]
    HeaderNotFound,
    #[error("Unterminated {discriminant} payload block at byte {offset}")]
    UnterminatedPayload {
        discriminant: Discriminant,
        offset: usize,
    },
    #[error("Invalid {discriminant} payload at byte {offset}: {source}")]
    InvalidPayload {
        discriminant: Discriminant,
        offset: usize,
        #[source]
        source: UriError,
    },
    #[error("Failed to build topic tree: {0}")]
    Model(#[from] ModelError),
}

/// Tree edits that would break the map's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Topic {0} belongs to another mind map")]
    ForeignTopic(NodeId),
    #[error("Topic {0} is not in this mind map")]
    UnknownTopic(NodeId),
    #[error("Cannot move topic {moved} into its own subtree at {target}")]
    MoveIntoSubtree { moved: NodeId, target: NodeId },
    #[error("Cannot {operation} the root topic")]
    RootOperation { operation: &'static str },
    #[error("Topic {0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("Attribute name {0:?} cannot be written to an attribute line")]
    InvalidAttributeName(String),
    #[error("Value of attribute {0:?} contains a line break")]
    MultilineAttribute(String),
    #[error("Code snippet language {0:?} cannot be written to a fence line")]
    InvalidSnippetLanguage(String),
}
