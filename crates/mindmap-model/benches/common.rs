// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
use mindmap_model::{MindMap, NodeId, PathRef, Payload};

/// A root with `breadth` children per topic down to `depth` levels, where
/// every third topic carries a note and every fifth a file link.
#[allow(dead_code)]
pub fn generate_map(breadth: usize, depth: usize) -> MindMap {
    let mut map = MindMap::with_root();
    let Some(root) = map.root() else {
        return map;
    };
    let _ = map.set_text(root, "Benchmark root");
    let mut counter = 0;
    grow(&mut map, root, breadth, depth, &mut counter);
    map
}

#[allow(dead_code)]
fn grow(map: &mut MindMap, parent: NodeId, breadth: usize, depth: usize, counter: &mut usize) {
    if depth == 0 {
        return;
    }
    for index in 0..breadth {
        *counter += 1;
        let Ok(child) = map.make_child(parent, format!("Topic {counter} (#{index})"), None) else {
            continue;
        };
        if *counter % 3 == 0 {
            let _ = map.set_payload(child, Payload::note(format!("Note <{counter}>\nline two")));
        }
        if *counter % 5 == 0
            && let Ok(path) = PathRef::parse(&format!("docs/file{counter}.md"))
        {
            let _ = map.set_payload(child, Payload::File(path));
        }
        let _ = map.set_attribute(child, "fillColor", Some("#a0b0c0"));
        grow(map, child, breadth, depth - 1, counter);
    }
}
