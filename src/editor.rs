//! The style editor: selector generation, the rule store and the session that ties them to a
//! document.

pub mod color;
pub mod config;
pub mod generator;
pub mod hierarchy;
pub mod property;
pub mod rules;
pub mod session;
pub mod storage;
pub mod stylesheet;
pub mod values;

pub use color::{to_display_hex, HexColor};
pub use config::EditorConfig;
pub use generator::{display_name, generate_selector};
pub use hierarchy::HierarchyEntry;
pub use property::{canonical_property_name, PropertyMap};
pub use rules::{OriginalValues, SelectorMap, StyleRuleSet, UndoHistory};
pub use session::{is_image_element, Prefill, Stats, StyleEditorSession};
pub use storage::{FileStorage, MemoryStorage, Storage};
