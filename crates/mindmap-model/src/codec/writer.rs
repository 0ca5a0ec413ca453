use std::collections::BTreeMap;

use crate::attributes::{FORMAT_VERSION, VERSION};
use crate::codec::attribute_line::write_attributes;
use crate::codec::escape::{escape_markdown, make_pre_block};
use crate::codec::{BANNER, NEXT_PARAGRAPH};
use crate::map::{MindMap, NodeId};

/// Narrowest fence the reader accepts.
const MIN_FENCE: usize = 3;

/// Writes the whole map as MMD text.
pub fn serialize(map: &MindMap) -> String {
    let mut out = String::new();
    write_header(map, &mut out);
    if let Some(root) = map.root() {
        write_tree(map, root, &mut out);
    }
    out
}

fn write_header(map: &MindMap, out: &mut String) {
    let mut attributes: BTreeMap<&str, &str> = map
        .global_attributes()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    attributes.insert(VERSION, FORMAT_VERSION);

    out.push_str(BANNER);
    out.push_str(NEXT_PARAGRAPH);
    out.push_str("> ");
    out.push_str(&write_attributes(attributes));
    out.push_str("\n---\n");
}

fn write_tree(map: &MindMap, root: NodeId, out: &mut String) {
    let mut stack = vec![(root, 1)];
    while let Some((id, level)) = stack.pop() {
        write_topic(map, id, level, out);
        if let Some(topic) = map.topic(id) {
            stack.extend(topic.children().iter().rev().map(|child| (*child, level + 1)));
        }
    }
}

fn write_topic(map: &MindMap, id: NodeId, level: usize, out: &mut String) {
    let Some(topic) = map.topic(id) else {
        return;
    };

    out.push('\n');
    out.push_str(&"#".repeat(level));
    out.push(' ');
    out.push_str(&escape_markdown(topic.text()));
    out.push('\n');

    let extra: Vec<(&str, String)> = topic
        .payloads()
        .flat_map(|payload| payload.attributes_for_write())
        .collect();
    let mut attributes: BTreeMap<&str, &str> = topic
        .attributes()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    for (name, value) in &extra {
        attributes.insert(*name, value.as_str());
    }
    if !attributes.is_empty() {
        out.push_str("> ");
        out.push_str(&write_attributes(attributes));
        out.push('\n');
    }

    for payload in topic.payloads() {
        out.push_str("- ");
        out.push_str(payload.discriminant().name());
        out.push('\n');
        out.push_str(&make_pre_block(&payload.save_string()));
        out.push('\n');
    }

    for (language, body) in topic.code_snippets() {
        let fence = fence_for(body);
        out.push_str(&fence);
        out.push_str(language);
        out.push('\n');
        out.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&fence);
        out.push('\n');
    }
}

/// A fence one backtick longer than any body line made only of backticks,
/// so no body line can close it.
fn fence_for(body: &str) -> String {
    let longest = body
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty() && line.bytes().all(|b| b == b'`'))
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(MIN_FENCE))
}
