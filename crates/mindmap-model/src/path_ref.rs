//! URI references used by file and link payloads.
//!
//! A [`PathRef`] keeps the URI text exactly as written (no resolution, no
//! re-encoding) so that saving a map reproduces what was loaded. File
//! references additionally move their query string into an ordered
//! parameter map.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use relative_path::RelativePath;

use crate::error::UriError;

/// Characters never allowed unescaped anywhere in a URI.
const ILLEGAL: &str = "\"<>\\^`{|}";
/// Characters percent-encoded when a file path becomes a URI path segment.
const SEGMENT_ESCAPED: &str = ":/?#[]@!$^'()*+,;= %\"<>\\`{|}";
/// Characters percent-encoded in a replacement file name.
const NAME_ESCAPED: &str = "% :<>?";

/// RFC 3986 components, kept raw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
struct UriParts {
    scheme: Option<String>,
    authority: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl UriParts {
    fn parse(text: &str) -> Result<Self, UriError> {
        validate(text)?;

        static URI_REGEX: OnceLock<Regex> = OnceLock::new();
        let uri_regex = URI_REGEX.get_or_init(|| {
            Regex::new(r"^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?$")
                .expect("Invalid URI regex")
        });

        let Some(caps) = uri_regex.captures(text) else {
            return Err(UriError::IllegalCharacter {
                input: text.to_string(),
                index: 0,
                character: text.chars().next().unwrap_or(' '),
            });
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        let scheme = group(2);
        if let Some(scheme) = &scheme
            && !is_valid_scheme(scheme)
        {
            return Err(UriError::IllegalScheme {
                input: text.to_string(),
            });
        }

        Ok(Self {
            scheme,
            authority: group(4),
            path: group(5).unwrap_or_default(),
            query: group(7),
            fragment: group(9),
        })
    }

    fn render(&self, ascii: bool, query: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = &self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = query.or(self.query.as_deref()) {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        if ascii { encode_non_ascii(&out) } else { out }
    }
}

/// An immutable URI with a flag telling whether it names a file, plus the
/// parameters carried by file references.
///
/// Two refs are equal when both the URI text and the parameter set match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRef {
    uri: UriParts,
    file: bool,
    parameters: BTreeMap<String, String>,
}

impl PathRef {
    /// Parses URI text. For file references the query string is moved into
    /// [`PathRef::parameters`]; other URIs keep it.
    pub fn parse(text: &str) -> Result<Self, UriError> {
        Ok(Self::from_parts(UriParts::parse(text)?))
    }

    fn from_parts(mut uri: UriParts) -> Self {
        let file = uri
            .scheme
            .as_deref()
            .is_none_or(|scheme| scheme.eq_ignore_ascii_case("file"));
        let parameters = if file {
            uri.query
                .take()
                .map(|query| parse_query(&query))
                .unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        Self {
            uri,
            file,
            parameters,
        }
    }

    /// Builds a file reference. The path is stored relative to `base` when
    /// `base` is absolute and contains the file.
    pub fn from_file(
        base: Option<&Path>,
        file: &Path,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        let file = normalize(file);
        let relative = base
            .filter(|base| base.is_absolute())
            .and_then(|base| file.strip_prefix(normalize(base)).ok())
            .map(Path::to_path_buf);

        let uri = match relative {
            Some(relative) => UriParts {
                path: encode_path(&relative),
                ..UriParts::default()
            },
            None if file.is_absolute() => UriParts {
                scheme: Some("file".to_string()),
                authority: Some(String::new()),
                path: format!("/{}", encode_path(&file)),
                ..UriParts::default()
            },
            None => UriParts {
                path: encode_path(&file),
                ..UriParts::default()
            },
        };

        Self {
            uri,
            file: true,
            parameters,
        }
    }

    pub fn is_file(&self) -> bool {
        self.file
    }

    /// True when the URI carries a scheme.
    pub fn is_absolute(&self) -> bool {
        self.uri.scheme.is_some()
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Resolves to a file system path. Relative refs are percent-decoded and
    /// joined onto `base` when one is given.
    pub fn to_file(&self, base: Option<&Path>) -> PathBuf {
        let decoded = percent_decode(&self.uri.path);
        if self.is_absolute() {
            return PathBuf::from(decoded.as_ref());
        }
        match base {
            Some(base) => RelativePath::new(decoded.as_ref()).to_path(base),
            None => PathBuf::from(decoded.as_ref()),
        }
    }

    /// Renders the URI. `ascii` percent-encodes non-ASCII characters;
    /// `include_parameters` appends a file ref's parameters as a query.
    pub fn to_display_string(&self, ascii: bool, include_parameters: bool) -> String {
        let query = (self.file && include_parameters && !self.parameters.is_empty())
            .then(|| encode_query(&self.parameters));
        self.uri.render(ascii, query.as_deref())
    }

    /// Suffix of the last path segment after its final `.`.
    pub fn extension(&self) -> &str {
        let name = self.uri.path.rsplit('/').next().unwrap_or_default();
        name.rfind('.').map_or("", |dot| &name[dot + 1..])
    }

    /// Moves the ref onto `new_base`, keeping the last
    /// `trailing_segments_to_keep + 1` segments of the current path.
    pub fn replace_base_path(
        &self,
        replace_host: bool,
        new_base: &PathRef,
        trailing_segments_to_keep: usize,
    ) -> PathRef {
        let old_segments = split_segments(&self.uri.path);
        let keep_from = old_segments
            .len()
            .saturating_sub(trailing_segments_to_keep + 1);

        let mut segments = split_segments(&new_base.uri.path);
        segments.extend_from_slice(&old_segments[keep_from..]);
        let mut path = segments.join("/");

        let (scheme, authority) = if replace_host {
            (new_base.uri.scheme.clone(), new_base.uri.authority.clone())
        } else {
            (self.uri.scheme.clone(), self.uri.authority.clone())
        };
        if authority.is_some() && !path.starts_with('/') {
            path.insert(0, '/');
        }

        let file = scheme
            .as_deref()
            .is_none_or(|scheme| scheme.eq_ignore_ascii_case("file"));
        PathRef {
            uri: UriParts {
                scheme,
                authority,
                path,
                query: self.uri.query.clone(),
                fragment: self.uri.fragment.clone(),
            },
            file,
            parameters: self.parameters.clone(),
        }
    }

    /// Replaces as many trailing path segments as `new_name` has.
    pub fn replace_name(&self, new_name: &str) -> Result<PathRef, UriError> {
        let escaped = escape_chars(&new_name.replace('\\', "/"), NAME_ESCAPED);
        let new_segments = split_segments(&escaped);
        let current = split_segments(&self.uri.path);
        let keep = current.len().saturating_sub(new_segments.len());

        let mut segments = current[..keep].to_vec();
        segments.extend_from_slice(&new_segments);
        let path = segments.join("/");
        validate(&path)?;

        Ok(PathRef {
            uri: UriParts {
                path,
                ..self.uri.clone()
            },
            file: self.file,
            parameters: self.parameters.clone(),
        })
    }

    fn resolved(&self, base: Option<&Path>) -> PathBuf {
        normalize(&self.to_file(base))
    }

    pub fn is_same_file(&self, base: Option<&Path>, file: &Path) -> bool {
        self.resolved(base) == normalize(file)
    }

    /// True when the ref resolves strictly inside `folder`.
    pub fn has_parent(&self, base: Option<&Path>, folder: &Path) -> bool {
        let resolved = self.resolved(base);
        let folder = normalize(folder);
        resolved != folder && resolved.starts_with(&folder)
    }

    pub fn is_same_or_has_parent(&self, base: Option<&Path>, folder: &Path) -> bool {
        self.resolved(base).starts_with(normalize(folder))
    }

    /// Re-targets a ref that resolves to `old` or into `old` onto `new`,
    /// keeping the suffix below `old`. `None` when the ref is unrelated.
    pub fn replace_parent_path(&self, base: Option<&Path>, old: &Path, new: &Path) -> Option<PathRef> {
        let resolved = self.resolved(base);
        let suffix = resolved.strip_prefix(normalize(old)).ok()?;
        let target = normalize(new).join(suffix);
        let base = if self.is_absolute() { None } else { base };
        Some(PathRef::from_file(base, &target, self.parameters.clone()))
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string(false, true))
    }
}

impl FromStr for PathRef {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lexical path normalisation: drops `.` and folds `..` without touching
/// the file system.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn validate(text: &str) -> Result<(), UriError> {
    let bytes = text.as_bytes();
    for (index, character) in text.char_indices() {
        if character == '%' {
            let hex = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_hexdigit);
            if !(hex(index + 1) && hex(index + 2)) {
                return Err(UriError::MalformedEscape {
                    input: text.to_string(),
                    index,
                });
            }
        } else if character.is_control() || character.is_whitespace() || ILLEGAL.contains(character)
        {
            return Err(UriError::IllegalCharacter {
                input: text.to_string(),
                index,
                character,
            });
        }
    }
    Ok(())
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
}

/// Splits a path on `/`, dropping trailing empty segments. An empty path is
/// one empty segment.
fn split_segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return vec![""];
    }
    let mut segments: Vec<&str> = path.split('/').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

fn percent_encode_char(out: &mut String, character: char) {
    let mut buf = [0u8; 4];
    for byte in character.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{byte:02X}"));
    }
}

fn escape_chars(text: &str, escaped: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for character in text.chars() {
        if escaped.contains(character) {
            percent_encode_char(&mut out, character);
        } else {
            out.push(character);
        }
    }
    out
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for character in segment.chars() {
        if character.is_control() || character.is_whitespace() || SEGMENT_ESCAPED.contains(character)
        {
            percent_encode_char(&mut out, character);
        } else {
            out.push(character);
        }
    }
    out
}

fn encode_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(encode_segment(&name.to_string_lossy())),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii() {
            out.push(character);
        } else {
            percent_encode_char(&mut out, character);
        }
    }
    out
}

fn percent_decode(text: &str) -> Cow<'_, str> {
    urlencoding::decode(text).unwrap_or(Cow::Borrowed(text))
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn encode_query(parameters: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(parameters)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn file_uri_query_moves_into_parameters() {
        let path = PathRef::parse("file:///folder/hello.txt?line=12&col=3").unwrap();

        assert!(path.is_file());
        assert_eq!(path.parameters(), &params(&[("line", "12"), ("col", "3")]));
        assert_eq!(path.to_display_string(false, false), "file:///folder/hello.txt");
        assert_eq!(
            path.to_display_string(false, true),
            "file:///folder/hello.txt?col=3&line=12"
        );
    }

    #[test]
    fn non_file_uri_keeps_query() {
        let path = PathRef::parse("https://example.com/search?q=rust#top").unwrap();

        assert!(!path.is_file());
        assert!(path.parameters().is_empty());
        assert_eq!(path.to_string(), "https://example.com/search?q=rust#top");
    }

    #[rstest]
    #[case("hello world.txt", 5, ' ')]
    #[case("a<b", 1, '<')]
    #[case("tab\there", 3, '\t')]
    #[case("back\\slash", 4, '\\')]
    fn illegal_characters_are_rejected(
        #[case] input: &str,
        #[case] index: usize,
        #[case] character: char,
    ) {
        assert_eq!(
            PathRef::parse(input),
            Err(UriError::IllegalCharacter {
                input: input.to_string(),
                index,
                character,
            })
        );
    }

    #[rstest]
    #[case("bad%2")]
    #[case("bad%zz")]
    fn malformed_escapes_are_rejected(#[case] input: &str) {
        assert!(matches!(
            PathRef::parse(input),
            Err(UriError::MalformedEscape { index: 3, .. })
        ));
    }

    #[test]
    fn scheme_must_start_with_letter() {
        assert!(matches!(
            PathRef::parse("1abc:foo"),
            Err(UriError::IllegalScheme { .. })
        ));
    }

    #[test]
    fn from_file_relative_to_base() {
        let path = PathRef::from_file(
            Some(Path::new("/proj")),
            Path::new("/proj/notes/a file.txt"),
            BTreeMap::new(),
        );

        assert!(!path.is_absolute());
        assert_eq!(path.to_string(), "notes/a%20file.txt");
        assert_eq!(
            path.to_file(Some(Path::new("/proj"))),
            PathBuf::from("/proj/notes/a file.txt")
        );
    }

    #[test]
    fn from_file_outside_base_is_absolute() {
        let path = PathRef::from_file(
            Some(Path::new("/proj")),
            Path::new("/other/hello world.txt"),
            params(&[("hello", "world"), ("привет", "от медведя")]),
        );

        assert!(path.is_absolute());
        assert_eq!(
            path.to_display_string(true, true),
            "file:///other/hello%20world.txt?hello=world&%D0%BF%D1%80%D0%B8%D0%B2%D0%B5%D1%82=%D0%BE%D1%82+%D0%BC%D0%B5%D0%B4%D0%B2%D0%B5%D0%B4%D1%8F"
        );
        assert_eq!(path.to_file(None), PathBuf::from("/other/hello world.txt"));
    }

    #[test]
    fn from_file_keeps_non_ascii_unless_ascii_rendering() {
        let path = PathRef::from_file(None, Path::new("/документ.txt"), BTreeMap::new());

        assert_eq!(path.to_display_string(false, false), "file:///документ.txt");
        assert_eq!(
            path.to_display_string(true, false),
            "file:///%D0%B4%D0%BE%D0%BA%D1%83%D0%BC%D0%B5%D0%BD%D1%82.txt"
        );
    }

    #[test]
    fn parsed_and_built_file_refs_are_equal() {
        let built = PathRef::from_file(None, Path::new("/a/b.txt"), params(&[("x", "1")]));
        let parsed = PathRef::parse("file:///a/b.txt?x=1").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn equality_includes_parameters() {
        let a = PathRef::parse("notes/a.txt?x=1").unwrap();
        let b = PathRef::parse("notes/a.txt?x=2").unwrap();
        let c = PathRef::parse("notes/a.txt").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[rstest]
    #[case("notes/a.txt", "txt")]
    #[case("file:///x/map.MMD", "MMD")]
    #[case("folder.d/readme", "")]
    #[case("", "")]
    fn extension_of_last_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PathRef::parse(input).unwrap().extension(), expected);
    }

    #[test]
    fn replace_base_path_relocates_onto_new_base() {
        let path = PathRef::parse("notes/a.txt").unwrap();
        let new_base = PathRef::from_file(None, Path::new("/proj2"), BTreeMap::new());

        let moved = path.replace_base_path(true, &new_base, 0);

        assert_eq!(moved.to_string(), "file:///proj2/a.txt");
        assert_eq!(
            moved.to_file(Some(Path::new("/proj"))),
            PathBuf::from("/proj2/a.txt")
        );
    }

    #[test]
    fn replace_base_path_keeps_trailing_segments_and_query() {
        let path = PathRef::parse("http://old.host/a/b/c/d.html?x=1#frag").unwrap();
        let new_base = PathRef::parse("https://new.host/base").unwrap();

        assert_eq!(
            path.replace_base_path(true, &new_base, 1).to_string(),
            "https://new.host/base/c/d.html?x=1#frag"
        );
        assert_eq!(
            path.replace_base_path(false, &new_base, 1).to_string(),
            "http://old.host/base/c/d.html?x=1#frag"
        );
    }

    #[test]
    fn replace_base_path_skips_segments_beyond_bounds() {
        let path = PathRef::parse("a.txt").unwrap();
        let new_base = PathRef::parse("file:///root").unwrap();
        assert_eq!(
            path.replace_base_path(true, &new_base, 5).to_string(),
            "file:///root/a.txt"
        );
    }

    #[rstest]
    #[case("file:///a/b/c.txt", "d.txt", "file:///a/b/d.txt")]
    #[case("file:///a/b/c.txt", "x\\d.txt", "file:///a/x/d.txt")]
    #[case("docs/c.txt", "new name.txt", "docs/new%20name.txt")]
    fn replace_name_swaps_trailing_segments(
        #[case] input: &str,
        #[case] new_name: &str,
        #[case] expected: &str,
    ) {
        let path = PathRef::parse(input).unwrap();
        assert_eq!(path.replace_name(new_name).unwrap().to_string(), expected);
    }

    #[test]
    fn replace_name_rejects_illegal_characters() {
        let path = PathRef::parse("docs/c.txt").unwrap();
        assert!(path.replace_name("a\"b").is_err());
    }

    #[test]
    fn parent_tests_use_normalized_paths() {
        let base = Path::new("/proj");
        let path = PathRef::parse("notes/./sub/../a.txt").unwrap();

        assert!(path.is_same_file(Some(base), Path::new("/proj/notes/a.txt")));
        assert!(path.has_parent(Some(base), Path::new("/proj/notes")));
        assert!(!path.has_parent(Some(base), Path::new("/proj/notes/a.txt")));
        assert!(path.is_same_or_has_parent(Some(base), Path::new("/proj/notes/a.txt")));
        assert!(!path.is_same_or_has_parent(Some(base), Path::new("/proj/note")));
    }

    #[test]
    fn replace_parent_path_keeps_suffix() {
        let base = Path::new("/proj");
        let path = PathRef::parse("notes/deep/a.txt?line=2").unwrap();

        let moved = path
            .replace_parent_path(Some(base), Path::new("/proj/notes"), Path::new("/proj/archive"))
            .unwrap();

        assert_eq!(moved.to_string(), "archive/deep/a.txt?line=2");
        assert!(
            path.replace_parent_path(Some(base), Path::new("/proj/other"), Path::new("/x"))
                .is_none()
        );
    }

    #[rstest]
    #[case("/a/./b/../c", "/a/c")]
    #[case("a/../../b", "../b")]
    #[case("/../a", "/a")]
    fn normalize_is_lexical(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(input)), PathBuf::from(expected));
    }
}
