use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    css::selector::{parse_selector_list, Selector},
    error::{Error, Result},
    utils::PrintableTree,
};

pub type NodeRef = Rc<RefCell<DomNode>>;

/// https://dom.spec.whatwg.org/#node
#[derive(Debug)]
pub struct DomNode {
    pub node_type: NodeType,
    pub children: Vec<NodeRef>,
    pub parent: Option<Weak<RefCell<Self>>>,
}

impl Default for DomNode {
    fn default() -> Self {
        Self {
            node_type: NodeType::Document,
            children: Vec::new(),
            parent: None,
        }
    }
}

impl DomNode {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            ..Default::default()
        }
    }

    pub fn new_element(tag_name: &str, attributes: Vec<(String, String)>) -> Self {
        Self::new(NodeType::Element(Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes,
        }))
    }

    pub fn append_child(node: &NodeRef, child: Self) -> NodeRef {
        let child = Rc::new(RefCell::new(child));
        child.borrow_mut().parent = Some(Rc::downgrade(node));
        node.borrow_mut().children.push(Rc::clone(&child));
        child
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.node_type {
            NodeType::Element(elm) => Some(elm),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.node_type {
            NodeType::Element(elm) => Some(elm),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    pub fn get_tag_name(&self) -> Option<String> {
        self.element().map(|elm| elm.tag_name.clone())
    }

    pub fn parent_node(&self) -> Option<NodeRef> {
        self.parent.as_ref()?.upgrade()
    }

    /// https://dom.spec.whatwg.org/#dom-node-textcontent
    pub fn text_content(&self) -> String {
        match &self.node_type {
            NodeType::Text(text) | NodeType::Comment(text) => text.clone(),
            NodeType::DocumentType(_) => String::new(),
            _ => self
                .children
                .iter()
                .filter(|c| !matches!(c.borrow().node_type, NodeType::Comment(_)))
                .map(|c| c.borrow().text_content())
                .collect(),
        }
    }

    /// Replaces all children with a single text node (or nothing when `text` is empty).
    pub fn set_text_content(node: &NodeRef, text: &str) {
        let old = std::mem::take(&mut node.borrow_mut().children);
        for child in old {
            child.borrow_mut().parent = None;
        }
        if !text.is_empty() {
            DomNode::append_child(node, DomNode::new(NodeType::Text(text.to_string())));
        }
    }
}

impl fmt::Display for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node_type)
    }
}

/// Returns the parent of `node` if it is an element.
pub fn parent_element(node: &NodeRef) -> Option<NodeRef> {
    let parent = node.borrow().parent_node()?;
    let is_element = parent.borrow().is_element();
    is_element.then_some(parent)
}

/// Element siblings that precede `node`, nearest first.
pub fn preceding_element_siblings(node: &NodeRef) -> Vec<NodeRef> {
    let Some(parent) = node.borrow().parent_node() else {
        return Vec::new();
    };
    let parent = parent.borrow();
    let Some(pos) = parent.children.iter().position(|c| Rc::ptr_eq(c, node)) else {
        return Vec::new();
    };
    parent.children[..pos]
        .iter()
        .rev()
        .filter(|c| c.borrow().is_element())
        .map(Rc::clone)
        .collect()
}

/// Element siblings that follow `node`, nearest first.
pub fn following_element_siblings(node: &NodeRef) -> Vec<NodeRef> {
    let Some(parent) = node.borrow().parent_node() else {
        return Vec::new();
    };
    let parent = parent.borrow();
    let Some(pos) = parent.children.iter().position(|c| Rc::ptr_eq(c, node)) else {
        return Vec::new();
    };
    parent.children[pos + 1..]
        .iter()
        .filter(|c| c.borrow().is_element())
        .map(Rc::clone)
        .collect()
}

/// Returns true if `node` is `ancestor` or lies beneath it.
pub fn is_inclusive_descendant(node: &NodeRef, ancestor: &NodeRef) -> bool {
    let mut current = Some(Rc::clone(node));
    while let Some(n) = current {
        if Rc::ptr_eq(&n, ancestor) {
            return true;
        }
        current = n.borrow().parent_node();
    }
    false
}

/// Nearest inclusive ancestor element whose id is one of `ids`.
pub fn closest_with_id(node: &NodeRef, ids: &[String]) -> Option<NodeRef> {
    let mut current = Some(Rc::clone(node));
    while let Some(n) = current {
        let hit = n
            .borrow()
            .element()
            .and_then(|elm| elm.id())
            .is_some_and(|id| ids.iter().any(|i| i == id));
        if hit {
            return Some(n);
        }
        current = n.borrow().parent_node();
    }
    None
}

/// https://dom.spec.whatwg.org/#dom-node-nodetype
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Comment(String),
    Document,
    DocumentType(String),
    Element(Element),
    Text(String),
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeType::Comment(text) => write!(f, "Comment( {} )", text),
            NodeType::Document => write!(f, "Document"),
            NodeType::DocumentType(text) => write!(f, "DocumentType( {} )", text),
            NodeType::Element(elm) => write!(f, "{}", elm),
            NodeType::Text(text) => write!(f, "Text( {} )", text.trim()),
        }
    }
}

/// https://dom.spec.whatwg.org/#element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag_name: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// https://dom.spec.whatwg.org/#dom-element-classlist
    pub fn class_list(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for c in self.get_attribute("class").unwrap_or("").split_ascii_whitespace() {
            if !classes.iter().any(|e| e == c) {
                classes.push(c.to_string());
            }
        }
        classes
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class_name))
    }

    pub fn add_class(&mut self, class_name: &str) {
        if self.has_class(class_name) {
            return;
        }
        let mut classes = self.class_list();
        classes.push(class_name.to_string());
        self.set_attribute("class", &classes.join(" "));
    }

    pub fn remove_class(&mut self, class_name: &str) {
        if !self.has_class(class_name) {
            return;
        }
        let classes = self
            .class_list()
            .into_iter()
            .filter(|c| c != class_name)
            .collect::<Vec<_>>();
        self.set_attribute("class", &classes.join(" "));
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let attr = self
            .attributes
            .iter()
            .map(|(key, value)| format!("\"{}\"=\"{}\"", key, value))
            .collect::<Vec<String>>();
        if attr.is_empty() {
            write!(f, "Elem( tag: <{}> )", self.tag_name)
        } else {
            write!(
                f,
                "Elem( tag: <{}>, attr: [{}] )",
                self.tag_name,
                attr.join("; ")
            )
        }
    }
}

/// https://dom.spec.whatwg.org/#document-trees
#[derive(Debug)]
pub struct DocumentTree {
    pub root: NodeRef,
}

impl DocumentTree {
    pub fn build(root: NodeRef) -> Result<Self> {
        if root.borrow().node_type != NodeType::Document {
            return Err(Error::Other(
                "The root node of a document tree must be a document node.".into(),
            ));
        }
        Ok(Self { root })
    }

    /// Depth-first, document-order iterator over all nodes, including the document itself.
    pub fn get_dfs_iter(&self) -> impl Iterator<Item = NodeRef> {
        let mut stack = vec![Rc::clone(&self.root)];
        std::iter::from_fn(move || -> Option<NodeRef> {
            let current = stack.pop()?;
            stack.extend(current.borrow().children.iter().map(Rc::clone).rev());
            Some(current)
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = NodeRef> {
        self.get_dfs_iter().filter(|n| n.borrow().is_element())
    }

    pub fn elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeRef> {
        self.elements()
            .filter(|n| n.borrow().get_tag_name().as_deref() == Some(tag_name))
            .collect()
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.root
            .borrow()
            .children
            .iter()
            .find(|c| c.borrow().is_element())
            .map(Rc::clone)
    }

    pub fn head(&self) -> Option<NodeRef> {
        self.child_of_html("head")
    }

    pub fn body(&self) -> Option<NodeRef> {
        self.child_of_html("body")
    }

    fn child_of_html(&self, tag_name: &str) -> Option<NodeRef> {
        let html = self.document_element()?;
        let html = html.borrow();
        html.children
            .iter()
            .find(|c| c.borrow().get_tag_name().as_deref() == Some(tag_name))
            .map(Rc::clone)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.elements()
            .find(|n| n.borrow().element().and_then(|e| e.id()) == Some(id))
    }

    /// https://dom.spec.whatwg.org/#dom-parentnode-queryselector
    ///
    /// An unparseable selector yields `Err`, mirroring the DOM `SyntaxError`.
    pub fn query_selector(&self, selectors: &str) -> Result<Option<NodeRef>> {
        let selectors = parse_selector_list(selectors)?;
        Ok(self.elements().find(|n| matches_any(&selectors, n)))
    }

    /// https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall
    pub fn query_selector_all(&self, selectors: &str) -> Result<Vec<NodeRef>> {
        let selectors = parse_selector_list(selectors)?;
        Ok(self.elements().filter(|n| matches_any(&selectors, n)).collect())
    }

    /// Serializes the document back to HTML markup.
    pub fn to_html(&self) -> String {
        fn serialize(node: &DomNode, raw_text: bool, out: &mut String) {
            match &node.node_type {
                NodeType::Document => {
                    for child in &node.children {
                        serialize(&child.borrow(), false, out);
                    }
                }
                NodeType::DocumentType(name) => out.push_str(&format!("<!DOCTYPE {}>", name)),
                NodeType::Comment(text) => out.push_str(&format!("<!--{}-->", text)),
                NodeType::Text(text) if raw_text => out.push_str(text),
                NodeType::Text(text) => out.push_str(&escape_text(text)),
                NodeType::Element(elm) => {
                    out.push('<');
                    out.push_str(&elm.tag_name);
                    for (k, v) in &elm.attributes {
                        out.push_str(&format!(" {}=\"{}\"", k, escape_attribute(v)));
                    }
                    out.push('>');
                    if super::token::is_void_element(&elm.tag_name) {
                        return;
                    }
                    let raw = super::token::is_raw_text_element(&elm.tag_name);
                    for child in &node.children {
                        serialize(&child.borrow(), raw, out);
                    }
                    out.push_str(&format!("</{}>", elm.tag_name));
                }
            }
        }
        let mut out = String::new();
        serialize(&self.root.borrow(), false, &mut out);
        out
    }
}

fn matches_any(selectors: &[Selector], node: &NodeRef) -> bool {
    selectors.iter().any(|s| s.matches(node))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl fmt::Display for DocumentTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn construct_node_view(
            node_tree: &mut String,
            node: &DomNode,
            current_depth: usize,
            is_last_child: bool,
            mut exclude_branches: Vec<usize>,
        ) {
            if is_last_child {
                exclude_branches.push(current_depth);
            }
            let mut indent_and_branches = String::new();
            for i in 0..current_depth {
                if exclude_branches.contains(&i) {
                    indent_and_branches.push_str("  ");
                } else {
                    indent_and_branches.push_str("│ ");
                }
            }
            indent_and_branches.push_str(if is_last_child { "└─" } else { "├─" });
            node_tree.push_str(&format!("{}{}\n", indent_and_branches, node));
            let children = node
                .children
                .iter()
                .filter(|c| !matches!(&c.borrow().node_type, NodeType::Text(t) if t.trim().is_empty()))
                .collect::<Vec<_>>();
            let children_num = children.len();
            for (i, child) in children.into_iter().enumerate() {
                construct_node_view(
                    node_tree,
                    &child.borrow(),
                    current_depth + 1,
                    i == children_num - 1,
                    exclude_branches.clone(),
                );
            }
        }
        let mut node_tree = String::new();
        construct_node_view(&mut node_tree, &self.root.borrow(), 0, true, vec![]);
        node_tree.pop(); // Remove the last newline character
        write!(f, "{}", node_tree)
    }
}

impl PrintableTree for DocumentTree {}
