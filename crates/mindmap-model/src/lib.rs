//! Mind map document model and its MMD text codec.
//!
//! ```
//! use mindmap_model::{MindMap, Payload};
//!
//! let mut map = MindMap::with_root();
//! let root = map.root().unwrap();
//! map.set_text(root, "Project").unwrap();
//! let task = map.make_child(root, "Write docs", None).unwrap();
//! map.set_payload(task, Payload::note("README first")).unwrap();
//!
//! let text = map.to_mmd();
//! let loaded = MindMap::from_mmd(&text).unwrap();
//! assert!(loaded.same_structure(&map));
//! ```

pub mod attributes;
pub mod codec;
pub mod error;
pub mod map;
pub mod path_ref;
pub mod payload;

// Re-export key types for easier usage
pub use codec::{ParseOptions, parse, serialize};
pub use error::{FormatError, ModelError, UriError};
pub use map::{ContentMatcher, ListenerId, MapListener, MindMap, NodeId, SearchScope, Topic};
pub use path_ref::PathRef;
pub use payload::{Discriminant, Payload, PayloadValue};
