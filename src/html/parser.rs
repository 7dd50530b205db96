use std::{cell::RefCell, rc::Rc};

use log::debug;

use crate::{
    error::Result,
    html::{
        dom::{DocumentTree, DomNode, NodeRef, NodeType},
        token::{is_void_element, HtmlToken, HtmlTokenizer},
    },
};

/// Elements that belong in `<head>` when they appear before any body content.
const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Start tags that implicitly close an open `<p>`.
/// https://html.spec.whatwg.org/multipage/grouping-content.html#the-p-element
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

#[derive(Debug, Clone, Default, Copy, PartialEq, Eq)]
enum InsertionMode {
    #[default]
    Initial,
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
}

/// A simplified tree builder following the shape of the HTML insertion modes.
/// It never fails on malformed markup; mis-nested end tags are ignored.
#[derive(Debug)]
pub struct HtmlParser {
    insertion_mode: InsertionMode,
    tokenizer: HtmlTokenizer,
    document: NodeRef,
    html: Option<NodeRef>,
    head: Option<NodeRef>,
    body: Option<NodeRef>,
    /// Stack of open elements below `<body>` or `<head>`.
    stack: Vec<NodeRef>,
}

impl HtmlParser {
    pub fn new(html: &str) -> Self {
        Self {
            insertion_mode: InsertionMode::Initial,
            tokenizer: HtmlTokenizer::new(html),
            document: Rc::new(RefCell::new(DomNode::new(NodeType::Document))),
            html: None,
            head: None,
            body: None,
            stack: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<DocumentTree> {
        loop {
            let token = self.tokenizer.consume_token();
            if token == HtmlToken::Eof {
                break;
            }
            self.process(token);
        }
        self.ensure_body();
        DocumentTree::build(self.document)
    }

    fn process(&mut self, token: HtmlToken) {
        match token {
            HtmlToken::Doctype(name) => {
                if self.insertion_mode == InsertionMode::Initial && self.html.is_none() {
                    DomNode::append_child(&self.document, DomNode::new(NodeType::DocumentType(name)));
                } else {
                    debug!("parse error, ignored a misplaced doctype");
                }
            }
            HtmlToken::Comment(text) => {
                let parent = self.current_node();
                DomNode::append_child(&parent, DomNode::new(NodeType::Comment(text)));
            }
            HtmlToken::Text(text) => self.process_text(text),
            HtmlToken::StartTag {
                tag_name,
                attributes,
                self_closing,
            } => self.process_start_tag(&tag_name, attributes, self_closing),
            HtmlToken::EndTag { tag_name } => self.process_end_tag(&tag_name),
            HtmlToken::Eof => {}
        }
    }

    fn process_text(&mut self, text: String) {
        let is_blank = text.chars().all(|c| c.is_ascii_whitespace());
        match self.insertion_mode {
            InsertionMode::Initial | InsertionMode::BeforeHead | InsertionMode::AfterHead
                if is_blank => {}
            InsertionMode::InHead if is_blank && self.stack.is_empty() => {}
            InsertionMode::InHead if !self.stack.is_empty() => self.insert_text(text),
            InsertionMode::InBody => self.insert_text(text),
            _ => {
                self.ensure_body();
                self.insert_text(text);
            }
        }
    }

    fn process_start_tag(&mut self, tag_name: &str, attributes: Vec<(String, String)>, self_closing: bool) {
        match tag_name {
            "html" => {
                let html = self.ensure_html();
                merge_attributes(&html, attributes);
                return;
            }
            "head" if self.head.is_none() => {
                let head = self.ensure_head();
                merge_attributes(&head, attributes);
                return;
            }
            "body" => {
                let body = self.ensure_body();
                merge_attributes(&body, attributes);
                return;
            }
            "head" => return,
            _ => {}
        }

        let in_head_section = matches!(
            self.insertion_mode,
            InsertionMode::Initial | InsertionMode::BeforeHead | InsertionMode::InHead
        ) && self.body.is_none();
        if in_head_section && HEAD_ELEMENTS.contains(&tag_name) {
            let head = self.ensure_head();
            if self.insertion_mode != InsertionMode::InHead {
                self.insertion_mode = InsertionMode::InHead;
                self.stack.clear();
            }
            let parent = self.stack.last().map(Rc::clone).unwrap_or(head);
            self.insert_element(&parent, tag_name, attributes, self_closing);
            return;
        }

        if self.insertion_mode != InsertionMode::InBody {
            self.ensure_body();
        }

        if CLOSES_P.contains(&tag_name) {
            self.close_if_open("p");
        }
        if tag_name == "li" {
            self.close_if_open("li");
        }
        let parent = self.current_node();
        self.insert_element(&parent, tag_name, attributes, self_closing);
    }

    fn process_end_tag(&mut self, tag_name: &str) {
        match tag_name {
            "head" => {
                if self.insertion_mode == InsertionMode::InHead {
                    self.stack.clear();
                    self.insertion_mode = InsertionMode::AfterHead;
                }
            }
            "body" | "html" => {}
            _ => {
                let pos = self
                    .stack
                    .iter()
                    .rposition(|n| n.borrow().get_tag_name().as_deref() == Some(tag_name));
                match pos {
                    Some(pos) => self.stack.truncate(pos),
                    None => debug!("parse error, ignored the end tag </{}>", tag_name),
                }
            }
        }
    }

    fn insert_element(
        &mut self,
        parent: &NodeRef,
        tag_name: &str,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    ) {
        let node = DomNode::append_child(parent, DomNode::new_element(tag_name, attributes));
        if !self_closing && !is_void_element(tag_name) {
            self.stack.push(node);
        }
    }

    fn insert_text(&mut self, text: String) {
        let parent = self.current_node();
        let last = parent.borrow().children.last().map(Rc::clone);
        if let Some(last) = last {
            if let NodeType::Text(t) = &mut last.borrow_mut().node_type {
                t.push_str(&text);
                return;
            }
        }
        DomNode::append_child(&parent, DomNode::new(NodeType::Text(text)));
    }

    fn close_if_open(&mut self, tag_name: &str) {
        if let Some(pos) = self
            .stack
            .iter()
            .rposition(|n| n.borrow().get_tag_name().as_deref() == Some(tag_name))
        {
            self.stack.truncate(pos);
        }
    }

    fn current_node(&self) -> NodeRef {
        if let Some(node) = self.stack.last() {
            return Rc::clone(node);
        }
        match self.insertion_mode {
            InsertionMode::InBody => self.body.as_ref().map(Rc::clone),
            InsertionMode::InHead => self.head.as_ref().map(Rc::clone),
            _ => self.html.as_ref().map(Rc::clone),
        }
        .unwrap_or_else(|| Rc::clone(&self.document))
    }

    fn ensure_html(&mut self) -> NodeRef {
        if let Some(html) = &self.html {
            return Rc::clone(html);
        }
        let html = DomNode::append_child(&self.document, DomNode::new_element("html", Vec::new()));
        self.html = Some(Rc::clone(&html));
        if self.insertion_mode == InsertionMode::Initial {
            self.insertion_mode = InsertionMode::BeforeHead;
        }
        html
    }

    fn ensure_head(&mut self) -> NodeRef {
        if let Some(head) = &self.head {
            return Rc::clone(head);
        }
        let html = self.ensure_html();
        let head = DomNode::append_child(&html, DomNode::new_element("head", Vec::new()));
        self.head = Some(Rc::clone(&head));
        self.insertion_mode = InsertionMode::InHead;
        self.stack.clear();
        head
    }

    fn ensure_body(&mut self) -> NodeRef {
        if let Some(body) = &self.body {
            return Rc::clone(body);
        }
        self.ensure_head();
        let html = self.ensure_html();
        let body = DomNode::append_child(&html, DomNode::new_element("body", Vec::new()));
        self.body = Some(Rc::clone(&body));
        self.insertion_mode = InsertionMode::InBody;
        self.stack.clear();
        body
    }
}

fn merge_attributes(node: &NodeRef, attributes: Vec<(String, String)>) {
    if let Some(elm) = node.borrow_mut().element_mut() {
        for (k, v) in attributes {
            if elm.get_attribute(&k).is_none() {
                elm.set_attribute(&k, &v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn tags(doc: &DocumentTree) -> Vec<String> {
        doc.elements()
            .filter_map(|n| n.borrow().get_tag_name())
            .collect()
    }

    #[test]
    fn builds_implicit_structure() {
        let doc = parse_html("<p>hello</p>").unwrap();
        assert_eq!(tags(&doc), vec!["html", "head", "body", "p"]);
    }

    #[test]
    fn head_elements_go_to_head() {
        let doc = parse_html(
            "<!DOCTYPE html><html><head><title>T</title><style>p{}</style></head><body><div></div></body></html>",
        )
        .unwrap();
        let head = doc.head().unwrap();
        let head_tags = head
            .borrow()
            .children
            .iter()
            .filter_map(|c| c.borrow().get_tag_name())
            .collect::<Vec<_>>();
        assert_eq!(head_tags, vec!["title", "style"]);
        assert_eq!(doc.elements_by_tag_name("div").len(), 1);
        assert!(matches!(
            doc.root.borrow().children[0].borrow().node_type,
            NodeType::DocumentType(_)
        ));
    }

    #[test]
    fn implicitly_closes_paragraphs_and_list_items() {
        let doc = parse_html("<p>one<div>two</div><ul><li>a<li>b</ul>").unwrap();
        let body = doc.body().unwrap();
        let body_tags = body
            .borrow()
            .children
            .iter()
            .filter_map(|c| c.borrow().get_tag_name())
            .collect::<Vec<_>>();
        assert_eq!(body_tags, vec!["p", "div", "ul"]);
        let ul = doc.elements_by_tag_name("ul").pop().unwrap();
        assert_eq!(ul.borrow().children.len(), 2);
    }

    #[test]
    fn ignores_stray_end_tags() {
        let doc = parse_html("<div><span>x</b></span></div><p>y</p>").unwrap();
        let p = doc.elements_by_tag_name("p").pop().unwrap();
        let parent = p.borrow().parent_node().unwrap();
        assert_eq!(parent.borrow().get_tag_name().unwrap(), "body");
    }

    #[test]
    fn attributes_on_html_and_body_are_kept() {
        let doc = parse_html("<html lang=en><body class=page><p></p></body></html>").unwrap();
        let html = doc.document_element().unwrap();
        assert_eq!(
            html.borrow().element().unwrap().get_attribute("lang"),
            Some("en")
        );
        let body = doc.body().unwrap();
        assert!(body.borrow().element().unwrap().has_class("page"));
    }
}
