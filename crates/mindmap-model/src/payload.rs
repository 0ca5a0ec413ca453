use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attributes::{NOTE_ENCRYPTED, NOTE_ENCRYPTED_HINT};
use crate::error::UriError;
use crate::path_ref::{PathRef, normalize};

/// Tag of a [`Payload`] variant. A topic holds at most one payload per tag,
/// and payloads are written in tag order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Discriminant {
    File,
    Link,
    Note,
    Topic,
}

impl Discriminant {
    pub const ALL: [Discriminant; 4] = [Self::File, Self::Link, Self::Note, Self::Topic];

    /// Name used in `- NAME` payload lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Link => "LINK",
            Self::Note => "NOTE",
            Self::Topic => "TOPIC",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed attachment on a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Reference to a file, usually relative to the project base folder.
    File(PathRef),
    /// Arbitrary external URI.
    Link(PathRef),
    /// Free text. When `encrypted`, `text` holds the ciphertext.
    Note {
        text: String,
        encrypted: bool,
        hint: Option<String>,
    },
    /// Link to another topic by its `topicLinkUID`.
    TopicRef(String),
}

/// Borrowed view of what a [`Payload`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadValue<'a> {
    Path(&'a PathRef),
    Text(&'a str),
}

impl Payload {
    pub fn note(text: impl Into<String>) -> Self {
        Self::Note {
            text: text.into(),
            encrypted: false,
            hint: None,
        }
    }

    pub fn encrypted_note(ciphertext: impl Into<String>, hint: Option<String>) -> Self {
        Self::Note {
            text: ciphertext.into(),
            encrypted: true,
            hint,
        }
    }

    pub fn discriminant(&self) -> Discriminant {
        match self {
            Self::File(_) => Discriminant::File,
            Self::Link(_) => Discriminant::Link,
            Self::Note { .. } => Discriminant::Note,
            Self::TopicRef(_) => Discriminant::Topic,
        }
    }

    pub fn value(&self) -> PayloadValue<'_> {
        match self {
            Self::File(path) | Self::Link(path) => PayloadValue::Path(path),
            Self::Note { text, .. } | Self::TopicRef(text) => PayloadValue::Text(text),
        }
    }

    /// Decodes payload text as stored in a `<pre>` block.
    ///
    /// The text is HTML-unescaped first. File and link URIs are trimmed and
    /// validated; note encryption state comes from the owning topic's
    /// attributes.
    pub fn parse_loaded(
        discriminant: Discriminant,
        stored: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<Self, UriError> {
        let text = html_escape::decode_html_entities(stored);
        Ok(match discriminant {
            Discriminant::File => Self::File(PathRef::parse(text.trim())?),
            Discriminant::Link => Self::Link(PathRef::parse(text.trim())?),
            Discriminant::Note => Self::Note {
                text: text.into_owned(),
                encrypted: attributes
                    .get(NOTE_ENCRYPTED)
                    .is_some_and(|v| v.eq_ignore_ascii_case("true")),
                hint: attributes.get(NOTE_ENCRYPTED_HINT).cloned(),
            },
            Discriminant::Topic => Self::TopicRef(text.trim().to_string()),
        })
    }

    /// Human readable form.
    pub fn display_string(&self) -> String {
        match self {
            Self::File(path) => path.to_file(None).display().to_string(),
            Self::Link(uri) => uri.to_display_string(false, false),
            Self::Note { text, .. } => text.clone(),
            Self::TopicRef(uid) => uid.clone(),
        }
    }

    /// Text stored in the document, before the codec's HTML escaping.
    pub fn save_string(&self) -> String {
        match self {
            Self::File(path) | Self::Link(path) => path.to_display_string(false, true),
            Self::Note { text, .. } => text.clone(),
            Self::TopicRef(uid) => uid.clone(),
        }
    }

    /// Searches the payload content. Topic links are never searchable, and
    /// encrypted notes are matched against their ciphertext.
    pub fn matches_pattern(&self, base: Option<&Path>, pattern: &Regex) -> bool {
        match self {
            Self::File(path) => {
                pattern.is_match(&normalize(&path.to_file(base)).to_string_lossy())
            }
            Self::Link(uri) => pattern.is_match(&uri.to_string()),
            Self::Note { text, .. } => pattern.is_match(text),
            Self::TopicRef(_) => false,
        }
    }

    /// Only notes can be encrypted.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Note { encrypted: true, .. })
    }

    /// Password hint of an encrypted note.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Note { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// True for file links pointing at another mind map.
    pub fn is_mind_map_file(&self) -> bool {
        matches!(self, Self::File(path) if path.extension().eq_ignore_ascii_case("mmd"))
    }

    /// Extra topic attributes to write alongside this payload.
    pub fn attributes_for_write(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Note {
                encrypted: true,
                hint,
                ..
            } => {
                let mut attributes = vec![(NOTE_ENCRYPTED, "true".to_string())];
                if let Some(hint) = hint {
                    attributes.push((NOTE_ENCRYPTED_HINT, hint.clone()));
                }
                attributes
            }
            _ => Vec::new(),
        }
    }

    /// Called when the payload is set on a topic.
    pub(crate) fn on_attach(&self, attributes: &mut BTreeMap<String, String>) {
        if let Self::Note { .. } = self {
            attributes.remove(NOTE_ENCRYPTED);
            attributes.remove(NOTE_ENCRYPTED_HINT);
            for (key, value) in self.attributes_for_write() {
                attributes.insert(key.to_string(), value);
            }
        }
    }

    /// Called when the payload is removed from a topic.
    pub(crate) fn on_detach(&self, attributes: &mut BTreeMap<String, String>) {
        if let Self::Note { .. } = self {
            attributes.remove(NOTE_ENCRYPTED);
            attributes.remove(NOTE_ENCRYPTED_HINT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case("FILE", Some(Discriminant::File))]
    #[case("TOPIC", Some(Discriminant::Topic))]
    #[case("note", None)]
    #[case("IMAGE", None)]
    fn discriminant_names(#[case] name: &str, #[case] expected: Option<Discriminant>) {
        assert_eq!(Discriminant::from_name(name), expected);
    }

    #[test]
    fn discriminants_sort_by_name() {
        let mut names: Vec<_> = Discriminant::ALL.iter().rev().map(|d| d.name()).collect();
        names.sort();
        let ordered: Vec<_> = Discriminant::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(names, ordered);
    }

    #[test]
    fn parse_loaded_unescapes_and_trims_links() {
        let payload = Payload::parse_loaded(
            Discriminant::Link,
            "  http://example.com/?a=1&amp;b=2 \n",
            &BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(payload.save_string(), "http://example.com/?a=1&b=2");
        assert_eq!(payload.discriminant(), Discriminant::Link);
        let PayloadValue::Path(uri) = payload.value() else {
            panic!("link should wrap a URI");
        };
        assert!(!uri.is_file());
    }

    fn file(text: &str) -> Payload {
        Payload::File(PathRef::parse(text).unwrap())
    }

    #[rstest]
    #[case(file("docs/read%20me.md?line=3"), "docs/read me.md")]
    #[case(file("file:///srv/maps/a%20b.mmd"), "/srv/maps/a b.mmd")]
    #[case(Payload::Link(PathRef::parse("https://example.org/p?q=1").unwrap()), "https://example.org/p?q=1")]
    #[case(Payload::note("a < b\nsecond"), "a < b\nsecond")]
    #[case(Payload::encrypted_note("U2FsdGVk", Some("pet".to_string())), "U2FsdGVk")]
    #[case(Payload::TopicRef("18A2F3C4D5E6A".to_string()), "18A2F3C4D5E6A")]
    fn display_string_per_variant(#[case] payload: Payload, #[case] expected: &str) {
        assert_eq!(payload.display_string(), expected);
    }

    #[test]
    fn display_string_of_relative_file_ignores_base_folder() {
        let payload = file("docs/a.txt");
        let Payload::File(path) = &payload else {
            unreachable!();
        };

        assert_eq!(
            payload.display_string(),
            path.to_file(None).display().to_string()
        );
        assert_ne!(
            payload.display_string(),
            path.to_file(Some(Path::new("/proj"))).display().to_string()
        );
        assert_eq!(path.to_file(Some(Path::new("/proj"))), Path::new("/proj/docs/a.txt"));
    }

    #[test]
    fn value_exposes_wrapped_text() {
        assert_eq!(Payload::note("hi").value(), PayloadValue::Text("hi"));
        assert_eq!(
            Payload::TopicRef("18AB".to_string()).value(),
            PayloadValue::Text("18AB")
        );
    }

    #[test]
    fn parse_loaded_keeps_note_whitespace() {
        let payload =
            Payload::parse_loaded(Discriminant::Note, " &lt;b&gt;\n text ", &BTreeMap::new())
                .unwrap();
        assert_eq!(payload, Payload::note(" <b>\n text "));
    }

    #[test]
    fn parse_loaded_reads_note_encryption_from_attributes() {
        let attributes = attrs(&[(NOTE_ENCRYPTED, "true"), (NOTE_ENCRYPTED_HINT, "pet name")]);
        let payload = Payload::parse_loaded(Discriminant::Note, "CIPHER", &attributes).unwrap();
        assert_eq!(
            payload,
            Payload::encrypted_note("CIPHER", Some("pet name".to_string()))
        );
        assert!(payload.is_encrypted());
        assert_eq!(payload.hint(), Some("pet name"));
        assert!(!Payload::note("plain").is_encrypted());
    }

    #[test]
    fn parse_loaded_rejects_bad_file_uri() {
        let result = Payload::parse_loaded(Discriminant::File, "a{b}.txt", &BTreeMap::new());
        assert!(matches!(result, Err(UriError::IllegalCharacter { .. })));
    }

    #[test]
    fn file_matches_against_resolved_path() {
        let payload = Payload::File(PathRef::parse("docs/../notes/todo.txt").unwrap());
        let base = Path::new("/proj");

        assert!(payload.matches_pattern(Some(base), &Regex::new("^/proj/notes/todo").unwrap()));
        assert!(!payload.matches_pattern(Some(base), &Regex::new("docs").unwrap()));
    }

    #[test]
    fn topic_ref_never_matches() {
        let payload = Payload::TopicRef("ABC".to_string());
        assert!(!payload.matches_pattern(None, &Regex::new(".*").unwrap()));
    }

    #[test]
    fn encrypted_note_matches_ciphertext_only() {
        let payload = Payload::encrypted_note("U2FsdGVk", None);
        assert!(payload.matches_pattern(None, &Regex::new("dGVk").unwrap()));
        assert!(!payload.matches_pattern(None, &Regex::new("secret").unwrap()));
    }

    #[rstest]
    #[case("maps/child.mmd", true)]
    #[case("maps/child.MMD", true)]
    #[case("maps/child.md", false)]
    fn mind_map_file_flag(#[case] path: &str, #[case] expected: bool) {
        let payload = Payload::File(PathRef::parse(path).unwrap());
        assert_eq!(payload.is_mind_map_file(), expected);
    }

    #[test]
    fn note_attach_and_detach_manage_encryption_attributes() {
        let mut attributes = attrs(&[("fillColor", "#fff")]);

        Payload::encrypted_note("X", Some("hint".to_string())).on_attach(&mut attributes);
        assert_eq!(
            attributes,
            attrs(&[
                ("fillColor", "#fff"),
                (NOTE_ENCRYPTED, "true"),
                (NOTE_ENCRYPTED_HINT, "hint"),
            ])
        );

        Payload::note("plain").on_attach(&mut attributes);
        assert_eq!(attributes, attrs(&[("fillColor", "#fff")]));

        Payload::encrypted_note("X", None).on_attach(&mut attributes);
        Payload::encrypted_note("X", None).on_detach(&mut attributes);
        assert_eq!(attributes, attrs(&[("fillColor", "#fff")]));
    }
}
