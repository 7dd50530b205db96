use std::fmt;

use crate::css::token::{tokenize, CssToken, HashType};
use crate::error::{Error, Result};
use crate::html::dom::{
    following_element_siblings, parent_element, preceding_element_siblings, NodeRef,
};
use crate::utils::TokenIterator;

/// - https://www.w3.org/TR/selectors-3/#simple-selectors
/// - https://www.w3.org/TR/selectors-3/#grammar
#[derive(Clone, Debug, PartialEq)]
pub enum SimpleSelector {
    Type(String),
    Universal,
    Attribute {
        name: String,
        op: Option<String>,
        value: Option<String>,
    },
    Class(String),
    Id(String),
    PseudoClass(String),
}

impl SimpleSelector {
    pub fn matches(&self, node: &NodeRef) -> bool {
        let node_ref = node.borrow();
        let Some(elm) = node_ref.element() else {
            return false;
        };

        match self {
            SimpleSelector::Type(name) => elm.tag_name.eq_ignore_ascii_case(name),
            SimpleSelector::Universal => true,
            // e.g) p.class2 matches <p class="class1 class2 class3">
            SimpleSelector::Class(class_name) => elm.has_class(class_name),
            SimpleSelector::Id(id) => elm.get_attribute("id") == Some(id.as_str()),
            SimpleSelector::Attribute { name, op, value } => {
                let Some(actual) = elm.get_attribute(name) else {
                    return false;
                };
                let (Some(op), Some(value)) = (op.as_deref(), value.as_deref()) else {
                    return true;
                };
                match op {
                    "=" => actual == value,
                    "~=" => actual.split_ascii_whitespace().any(|v| v == value),
                    "|=" => actual == value || actual.starts_with(&format!("{}-", value)),
                    "^=" => !value.is_empty() && actual.starts_with(value),
                    "$=" => !value.is_empty() && actual.ends_with(value),
                    "*=" => !value.is_empty() && actual.contains(value),
                    _ => false,
                }
            }
            SimpleSelector::PseudoClass(class_name) => match class_name.as_str() {
                // https://developer.mozilla.org/en-US/docs/Web/CSS/:link
                "link" | "any-link" => elm.tag_name == "a" && elm.get_attribute("href").is_some(),
                "first-child" => preceding_element_siblings(node).is_empty(),
                "last-child" => following_element_siblings(node).is_empty(),
                "only-child" => {
                    preceding_element_siblings(node).is_empty()
                        && following_element_siblings(node).is_empty()
                }
                "root" => node_ref
                    .parent_node()
                    .is_some_and(|p| !p.borrow().is_element()),
                // Dynamic and unsupported pseudo-classes never match a static document.
                _ => false,
            },
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimpleSelector::Type(name) => write!(f, "{}", name),
            SimpleSelector::Universal => write!(f, "*"),
            SimpleSelector::Class(name) => write!(f, ".{}", name),
            SimpleSelector::Id(id) => write!(f, "#{}", id),
            SimpleSelector::PseudoClass(name) => write!(f, ":{}", name),
            SimpleSelector::Attribute { name, op, value } => match (op, value) {
                (Some(op), Some(value)) => write!(f, "[{}{}\"{}\"]", name, op, value),
                _ => write!(f, "[{}]", name),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Combinator {
    Whitespace,
    GreaterThan,
    Plus,
    Tilde,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Combinator::Whitespace => write!(f, " "),
            Combinator::GreaterThan => write!(f, " > "),
            Combinator::Plus => write!(f, " + "),
            Combinator::Tilde => write!(f, " ~ "),
        }
    }
}

/// https://www.w3.org/TR/selectors-3/#selector-syntax
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    Simple(Vec<SimpleSelector>),

    // The left value is always a Simple selector because of the right associativity of the selector.
    // https://developer.mozilla.org/en-US/docs/Web/CSS/CSS_selectors/Selector_structure#complex_selector
    Complex(Box<Selector>, Combinator, Box<Selector>),
}

impl Selector {
    /// Flattens the selector into compound selectors and the combinators between them, left to right.
    fn flatten(&self) -> (Vec<&[SimpleSelector]>, Vec<&Combinator>) {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut current = self;
        loop {
            match current {
                Selector::Simple(seq) => {
                    compounds.push(seq.as_slice());
                    return (compounds, combinators);
                }
                Selector::Complex(left, combinator, right) => {
                    if let Selector::Simple(seq) = left.as_ref() {
                        compounds.push(seq.as_slice());
                    }
                    combinators.push(combinator);
                    current = right;
                }
            }
        }
    }

    pub fn matches(&self, node: &NodeRef) -> bool {
        /// Matches `compounds[..=idx]` with `compounds[idx]` anchored at `node`,
        /// backtracking over descendant and sibling combinators.
        fn matches_from(
            compounds: &[&[SimpleSelector]],
            combinators: &[&Combinator],
            idx: usize,
            node: &NodeRef,
        ) -> bool {
            if !compounds[idx].iter().all(|s| s.matches(node)) {
                return false;
            }
            if idx == 0 {
                return true;
            }
            let next = idx - 1;

            // https://developer.mozilla.org/en-US/docs/Learn/CSS/Building_blocks/Selectors/Combinators
            match combinators[next] {
                // https://www.w3.org/TR/selectors-3/#descendant-combinators
                Combinator::Whitespace => {
                    let mut ancestor = parent_element(node);
                    while let Some(a) = ancestor {
                        if matches_from(compounds, combinators, next, &a) {
                            return true;
                        }
                        ancestor = parent_element(&a);
                    }
                    false
                }
                // https://www.w3.org/TR/selectors-3/#child-combinators
                Combinator::GreaterThan => parent_element(node)
                    .is_some_and(|p| matches_from(compounds, combinators, next, &p)),
                // https://www.w3.org/TR/selectors-3/#adjacent-sibling-combinators
                Combinator::Plus => preceding_element_siblings(node)
                    .first()
                    .is_some_and(|s| matches_from(compounds, combinators, next, s)),
                // https://www.w3.org/TR/selectors-3/#general-sibling-combinators
                Combinator::Tilde => preceding_element_siblings(node)
                    .iter()
                    .any(|s| matches_from(compounds, combinators, next, s)),
            }
        }

        let (compounds, combinators) = self.flatten();
        matches_from(&compounds, &combinators, compounds.len() - 1, node)
    }

    /// - https://www.w3.org/TR/selectors-3/#specificity
    /// - https://developer.mozilla.org/en-US/docs/Web/CSS/Specificity
    pub fn calc_specificity(&self) -> u32 {
        let (compounds, _) = self.flatten();
        // (a, b, c): ids; classes, attributes and pseudo-classes; type selectors
        let mut spec = (0, 0, 0);
        for simple_selector in compounds.iter().flat_map(|c| c.iter()) {
            match simple_selector {
                SimpleSelector::Id(_) => spec.0 += 1,
                SimpleSelector::Class(_)
                | SimpleSelector::Attribute { .. }
                | SimpleSelector::PseudoClass(_) => spec.1 += 1,
                SimpleSelector::Type(_) => spec.2 += 1,
                SimpleSelector::Universal => {}
            }
        }
        spec.0 * 100 + spec.1 * 10 + spec.2
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (compounds, combinators) = self.flatten();
        for (i, compound) in compounds.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", combinators[i - 1])?;
            }
            for simple in compound.iter() {
                write!(f, "{}", simple)?;
            }
        }
        Ok(())
    }
}

/// Parses a comma-separated selector list such as the argument of `querySelector`.
pub fn parse_selector_list(text: &str) -> Result<Vec<Selector>> {
    let mut tokens = tokenize(text);
    tokens.retain(|t| *t != CssToken::Eof);
    parse_selector_tokens(&tokens)
}

/// Parses the prelude of a style rule.
pub fn parse_selector_tokens(tokens: &[CssToken]) -> Result<Vec<Selector>> {
    let start = tokens
        .iter()
        .position(|t| *t != CssToken::Whitespace)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| *t != CssToken::Whitespace)
        .map_or(start, |p| p + 1);
    SelectorParser::new(&tokens[start..end]).parse()
}

#[derive(Debug)]
pub struct SelectorParser {
    input: TokenIterator<CssToken>,
}

impl SelectorParser {
    pub fn new(tokens: &[CssToken]) -> Self {
        Self {
            input: TokenIterator::new(tokens),
        }
    }

    /// https://www.w3.org/TR/selectors-3/#w3cselgrammar
    pub fn parse(&mut self) -> Result<Vec<Selector>> {
        self.parse_selectors_group()
    }

    fn skip_whitespace(&mut self) {
        while self.input.peek() == Some(&CssToken::Whitespace) {
            self.input.next();
        }
    }

    // selectors_group
    //   : selector [ COMMA S* selector ]*
    //   ;
    fn parse_selectors_group(&mut self) -> Result<Vec<Selector>> {
        let mut selectors = vec![self.parse_selector()?];
        loop {
            self.skip_whitespace();
            match self.input.next() {
                Some(CssToken::Comma) => {
                    self.skip_whitespace();
                    selectors.push(self.parse_selector()?);
                }
                Some(v) => {
                    return Err(Error::CssSelectorParse(format!(
                        "Unexpected token when parsing CSS selectors in parse_selectors_group: {:?}",
                        v
                    )));
                }
                None => break,
            }
        }
        Ok(selectors)
    }

    // selector
    //   : simple_selector_sequence [ combinator simple_selector_sequence ]*
    //   ;
    fn parse_selector(&mut self) -> Result<Selector> {
        let simple = Selector::Simple(self.parse_simple_selector_seq()?);

        let mut n = 0;
        while self.input.peek_nth(n) == Some(&CssToken::Whitespace) {
            n += 1;
        }
        let continues = match self.input.peek_nth(n) {
            Some(CssToken::Delim('+' | '>' | '~')) => true,
            Some(CssToken::Comma) | None => false,
            Some(_) => n > 0,
        };

        if continues {
            Ok(Selector::Complex(
                Box::new(simple),
                self.parse_combinator()?,
                Box::new(self.parse_selector()?),
            ))
        } else {
            Ok(simple)
        }
    }

    // combinator
    //   /* combinators can be surrounded by whitespace */
    //   : PLUS S* | GREATER S* | TILDE S* | S+
    //   ;
    fn parse_combinator(&mut self) -> Result<Combinator> {
        let mut is_detected_space = false;
        while self.input.peek() == Some(&CssToken::Whitespace) {
            self.input.next();
            is_detected_space = true;
        }

        match self.input.peek() {
            Some(CssToken::Delim(c @ ('+' | '>' | '~'))) => {
                let combinator = match *c {
                    '+' => Combinator::Plus,
                    '>' => Combinator::GreaterThan,
                    _ => Combinator::Tilde,
                };
                self.input.next();
                self.skip_whitespace();
                Ok(combinator)
            }
            _ if is_detected_space => Ok(Combinator::Whitespace),
            v => Err(Error::CssSelectorParse(format!(
                "Expected \"+\", \">\", \"~\", or whitespace but found {:?} when parsing CSS selectors in parse_combinator",
                v
            ))),
        }
    }

    // simple_selector_sequence
    //   : [ type_selector | universal ]
    //     [ HASH | class | attrib | pseudo ]*
    //   | [ HASH | class | attrib | pseudo ]+
    //   ;
    fn parse_simple_selector_seq(&mut self) -> Result<Vec<SimpleSelector>> {
        let mut selector_seq = Vec::new();

        match self.input.peek() {
            Some(CssToken::Ident(name)) => {
                selector_seq.push(SimpleSelector::Type(name.to_ascii_lowercase()));
                self.input.next();
            }
            Some(CssToken::Delim('*')) => {
                selector_seq.push(SimpleSelector::Universal);
                self.input.next();
            }
            _ => {}
        }

        loop {
            match self.input.peek() {
                Some(CssToken::Hash(id, HashType::Id)) => {
                    selector_seq.push(SimpleSelector::Id(id.clone()));
                    self.input.next();
                }
                Some(CssToken::Hash(id, HashType::Unrestricted)) => {
                    return Err(Error::CssSelectorParse(format!(
                        "'#{}' is not a valid selector",
                        id
                    )));
                }
                Some(CssToken::Delim('.')) => selector_seq.push(self.parse_class()?),
                Some(CssToken::OpenSquareBracket) => selector_seq.push(self.parse_attrib()?),
                Some(CssToken::Colon) => selector_seq.push(self.parse_pseudo()?),
                _ => break,
            }
        }

        if selector_seq.is_empty() {
            return Err(Error::CssSelectorParse(format!(
                "Expected type selector, universal selector, hash, class, attribute, or pseudo but found {:?} when parsing CSS selectors in parse_simple_selector_seq",
                self.input.peek()
            )));
        }

        Ok(selector_seq)
    }

    // class
    //   : '.' IDENT
    //   ;
    fn parse_class(&mut self) -> Result<SimpleSelector> {
        self.input.next();
        match self.input.next() {
            Some(CssToken::Ident(name)) => Ok(SimpleSelector::Class(name)),
            v => Err(Error::CssSelectorParse(format!(
                "Expected ident but found {:?} when parsing CSS selectors in parse_class",
                v
            ))),
        }
    }

    // attrib
    //   : '[' S* IDENT S* [ [ PREFIXMATCH | SUFFIXMATCH | SUBSTRINGMATCH | '=' | INCLUDES | DASHMATCH ]
    //     S* [ IDENT | STRING ] S* ]? ']'
    //   ;
    fn parse_attrib(&mut self) -> Result<SimpleSelector> {
        self.input.next();
        self.skip_whitespace();

        let name = match self.input.next() {
            Some(CssToken::Ident(name)) => name.to_ascii_lowercase(),
            v => {
                return Err(Error::CssSelectorParse(format!(
                    "Expected ident but found {:?} when parsing CSS selectors in parse_attrib",
                    v
                )))
            }
        };
        self.skip_whitespace();

        let op = match self.input.next() {
            Some(CssToken::CloseSquareBracket) => {
                return Ok(SimpleSelector::Attribute {
                    name,
                    op: None,
                    value: None,
                })
            }
            Some(CssToken::Delim('=')) => "=".to_string(),
            Some(CssToken::Delim(c @ ('^' | '$' | '*' | '~' | '|'))) => {
                match self.input.next() {
                    Some(CssToken::Delim('=')) => format!("{}=", c),
                    v => {
                        return Err(Error::CssSelectorParse(format!(
                            "Expected \"=\" but found {:?} when parsing CSS selectors in parse_attrib",
                            v
                        )))
                    }
                }
            }
            v => {
                return Err(Error::CssSelectorParse(format!(
                    "Expected \"=\", \"^=\", \"$=\", \"*=\", \"~=\", \"|=\" but found {:?} when parsing CSS selectors in parse_attrib",
                    v
                )))
            }
        };
        self.skip_whitespace();

        let value = match self.input.next() {
            Some(CssToken::Ident(s) | CssToken::String(s)) => s,
            v => {
                return Err(Error::CssSelectorParse(format!(
                    "Expected ident or string but found {:?} when parsing CSS selectors in parse_attrib",
                    v
                )))
            }
        };
        self.skip_whitespace();

        match self.input.next() {
            Some(CssToken::CloseSquareBracket) => Ok(SimpleSelector::Attribute {
                name,
                op: Some(op),
                value: Some(value),
            }),
            v => Err(Error::CssSelectorParse(format!(
                "Expected \"]\" but found {:?} when parsing CSS selectors in parse_attrib",
                v
            ))),
        }
    }

    // pseudo
    //     : ':' IDENT
    //     ;
    fn parse_pseudo(&mut self) -> Result<SimpleSelector> {
        self.input.next();
        match self.input.next() {
            Some(CssToken::Ident(s)) => Ok(SimpleSelector::PseudoClass(s.to_ascii_lowercase())),
            v => Err(Error::CssSelectorParse(format!(
                "Expected ident but found {:?} when parsing CSS selectors in parse_pseudo",
                v
            ))),
        }
    }
}
