//! Well-known attribute names.

/// Document attribute carrying the format version.
pub const VERSION: &str = "__version__";
/// Version written by this crate.
pub const FORMAT_VERSION: &str = "1.1";

/// UID a [`Payload::TopicRef`](crate::Payload::TopicRef) points at.
pub const TOPIC_LINK_UID: &str = "topicLinkUID";
pub const FILL_COLOR: &str = "fillColor";
pub const BORDER_COLOR: &str = "borderColor";
pub const TEXT_COLOR: &str = "textColor";
pub const COLLAPSED: &str = "collapsed";
pub const LEFT_SIDE: &str = "leftSide";

pub const NOTE_ENCRYPTED: &str = "extras.note.encrypted";
pub const NOTE_ENCRYPTED_HINT: &str = "extras.note.encrypted.hint";
