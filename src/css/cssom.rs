use std::fmt;

use crate::css::selector::Selector;
use crate::html::dom::NodeRef;

/// https://www.w3.org/TR/cssom-1/#cssstylesheet
#[derive(Debug, Default, PartialEq)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn new(rules: Vec<StyleRule>) -> Self {
        Self { rules }
    }
}

/// - https://www.w3.org/TR/css-syntax-3/#style-rules
/// - https://www.w3.org/TR/cssom-1/#the-cssstylerule-interface
#[derive(Debug, PartialEq)]
pub struct StyleRule {
    /// The prelude as written, e.g. `#main > p.note`.
    pub selector_text: String,
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Returns the most specific selector of this rule that matches the node.
    pub fn best_match(&self, node: &NodeRef) -> Option<&Selector> {
        self.selectors
            .iter()
            .filter(|s| s.matches(node))
            .max_by_key(|s| s.calc_specificity())
    }
}

/// - https://www.w3.org/TR/css-syntax-3/#declaration
/// - https://www.w3.org/TR/cssom-1/#css-declarations
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    /// Serialized component values with whitespace collapsed and `!important` removed.
    pub value: String,
    pub important: bool,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.important {
            write!(f, "{}: {} !important;", self.name, self.value)
        } else {
            write!(f, "{}: {};", self.name, self.value)
        }
    }
}
