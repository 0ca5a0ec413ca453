//! `> key=`value`,other=``va`lue``` attribute lines.
//!
//! Values are quoted with one backtick more than the longest backtick run
//! inside them, so a value can hold any backtick sequence.

/// Length of the longest run of backticks in `text`.
pub fn max_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for byte in text.bytes() {
        if byte == b'`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// True when `name` is written and read back unchanged as an attribute
/// key: not empty, and free of whitespace, control characters, `=`, `,`
/// and backticks.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '=' | ',' | '`'))
}

/// Attribute lines cannot continue past a line break.
pub fn is_single_line(value: &str) -> bool {
    !value.contains(['\n', '\r'])
}

/// Quotes `value` with the minimal safe number of backticks.
pub fn quote_value(value: &str) -> String {
    let fence = "`".repeat(max_backtick_run(value) + 1);
    format!("{fence}{value}{fence}")
}

/// Renders the body of an attribute line, without the `> ` prefix.
pub fn write_attributes<'a>(attributes: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    attributes
        .into_iter()
        .map(|(key, value)| format!("{key}={}", quote_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a `> ...` line into key/value pairs. Malformed trailing content
/// is ignored.
pub fn parse_attributes(line: &str) -> Vec<(String, String)> {
    let line = line.trim_end_matches(['\n', '\r']).trim_start();
    let Some(body) = line.strip_prefix('>') else {
        return Vec::new();
    };
    let mut rest = body.strip_prefix([' ', '\t']).unwrap_or(body);
    let mut pairs = Vec::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(equals) = rest.find('=') else {
            break;
        };
        let key = rest[..equals].trim();
        let key = key.rsplit(char::is_whitespace).next().unwrap_or(key);
        let after = rest[equals + 1..].trim_start();

        let opening = after.bytes().take_while(|b| *b == b'`').count();
        if opening == 0 {
            break;
        }
        let Some((value, consumed)) = unquote(after, opening) else {
            break;
        };
        if is_valid_name(key) {
            pairs.push((key.to_string(), value.to_string()));
        }
        rest = &after[consumed..];
    }
    pairs
}

/// Finds the value quoted at the start of `text`, which opens with a run
/// of `opening` backticks.
///
/// A value may itself start with backticks, so the quote width `n` can be
/// anything up to `opening`. Widths are tried from the widest down; a
/// candidate whose longest inner run is exactly `n - 1` is what
/// [`quote_value`] would have produced and wins. Otherwise the widest
/// candidate that closes at all is used. Returns the value and the number
/// of bytes consumed including both quotes.
fn unquote(text: &str, opening: usize) -> Option<(&str, usize)> {
    let mut fallback = None;
    for width in (1..=opening).rev() {
        let body = &text[width..];
        let Some((start, length)) = first_run_at_least(body, width) else {
            continue;
        };
        let value = &body[..start + length - width];
        let consumed = width + start + length;
        if max_backtick_run(value) == width - 1 {
            return Some((value, consumed));
        }
        fallback.get_or_insert((value, consumed));
    }
    fallback
}

/// Start and length of the first backtick run of at least `width`.
fn first_run_at_least(text: &str, width: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'`' {
            let start = index;
            while index < bytes.len() && bytes[index] == b'`' {
                index += 1;
            }
            if index - start >= width {
                return Some((start, index - start));
            }
        } else {
            index += 1;
        }
    }
    None
}
