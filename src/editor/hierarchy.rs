use std::rc::Rc;

use serde::Serialize;

use crate::editor::{
    config::EditorConfig,
    generator::{display_name, generate_selector},
};
use crate::html::dom::{parent_element, NodeRef};

/// One level of the breadcrumb shown for the active element.
#[derive(Clone, Debug, Serialize)]
pub struct HierarchyEntry {
    #[serde(skip)]
    pub node: NodeRef,
    pub selector: String,
    pub display_name: String,
}

/// Collects `node` and its ancestors below `<body>`, outermost first.
pub fn build_hierarchy(node: &NodeRef, config: &EditorConfig) -> Vec<HierarchyEntry> {
    let mut entries = Vec::new();
    let mut current = Some(Rc::clone(node));
    while let Some(el) = current {
        let tag_name = el.borrow().get_tag_name();
        if matches!(tag_name.as_deref(), None | Some("body" | "html")) {
            break;
        }
        entries.push(HierarchyEntry {
            node: Rc::clone(&el),
            selector: generate_selector(&el, config),
            display_name: display_name(&el, config),
        });
        current = parent_element(&el);
    }
    entries.reverse();
    entries
}
