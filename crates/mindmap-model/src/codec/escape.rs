//! Text escaping for topic titles and payload blocks.

use std::sync::OnceLock;

use regex::Regex;

/// Punctuation backslash-escaped in topic titles.
pub const MD_ESCAPED_CHARS: &str = "\\`*_{}[]()#<>+-.!";

const LINE_BREAK: &str = "<br/>";

/// Escapes text for a heading line: markdown punctuation gets a backslash,
/// newlines become `<br/>`, other control characters are dropped.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for character in text.chars() {
        if character == '\n' {
            out.push_str(LINE_BREAK);
        } else if character.is_control() {
            continue;
        } else {
            if MD_ESCAPED_CHARS.contains(character) {
                out.push('\\');
            }
            out.push(character);
        }
    }
    out
}

/// Reverses [`escape_markdown`]. Any `<br>` spelling becomes a newline.
pub fn unescape_markdown(text: &str) -> String {
    static BR_REGEX: OnceLock<Regex> = OnceLock::new();
    static ESCAPED_REGEX: OnceLock<Regex> = OnceLock::new();
    let br_regex =
        BR_REGEX.get_or_init(|| Regex::new(r"(?i)<\s*?br\s*?/?>").expect("Invalid br regex"));
    let escaped_regex = ESCAPED_REGEX.get_or_init(|| {
        Regex::new(r"\\([\\`*_{}\[\]()#<>+\-.!])").expect("Invalid escape regex")
    });

    let with_newlines = br_regex.replace_all(text, "\n");
    escaped_regex.replace_all(&with_newlines, "$1").into_owned()
}

/// Escapes payload text for a `<pre>` block.
pub fn escape_pre(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Wraps payload text into its `<pre>` block.
pub fn make_pre_block(text: &str) -> String {
    format!("<pre>{}</pre>", escape_pre(text))
}
