use log::debug;

use crate::css::cssom::{Declaration, StyleRule, StyleSheet};
use crate::css::selector;
use crate::css::token::{tokenize, CssToken};
use crate::utils::TokenIterator;

/// Returns a stylesheet using the `Parse a stylesheet` entry point (normal parser entry point).
/// https://www.w3.org/TR/css-syntax-3/#parse-stylesheet
///
/// Rules whose selector cannot be parsed are dropped, as a browser would, and at-rules are
/// skipped entirely.
pub fn parse_stylesheet(css: &str) -> StyleSheet {
    let tokens = tokenize(css);
    let mut tokens = TokenIterator::new(&tokens);
    StyleSheet::new(consume_list_of_rules(&mut tokens))
}

/// Parses the contents of a `style` attribute or a rule block.
/// https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations
pub fn parse_declaration_list(css: &str) -> Vec<Declaration> {
    consume_list_of_declarations(&tokenize(css))
}

/// https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules
fn consume_list_of_rules(tokens: &mut TokenIterator<CssToken>) -> Vec<StyleRule> {
    let mut rules = Vec::new();

    loop {
        match tokens.next() {
            Some(CssToken::Whitespace | CssToken::Cdo | CssToken::Cdc) => continue,
            Some(CssToken::Eof) | None => return rules,
            Some(CssToken::AtKeyword(name)) => {
                debug!("skipped the unsupported at-rule @{}", name);
                consume_at_rule(tokens);
            }
            _ => {
                tokens.rewind(1);
                if let Some(rule) = consume_qualified_rule(tokens) {
                    rules.push(rule);
                }
            }
        }
    }
}

/// https://www.w3.org/TR/css-syntax-3/#consume-at-rule
fn consume_at_rule(tokens: &mut TokenIterator<CssToken>) {
    loop {
        match tokens.next() {
            Some(CssToken::Semicolon) | Some(CssToken::Eof) | None => return,
            Some(CssToken::OpenCurlyBrace) => {
                consume_block(tokens);
                return;
            }
            _ => {}
        }
    }
}

/// https://www.w3.org/TR/css-syntax-3/#consume-a-qualified-rule
fn consume_qualified_rule(tokens: &mut TokenIterator<CssToken>) -> Option<StyleRule> {
    let mut prelude = Vec::new();

    loop {
        match tokens.next() {
            Some(CssToken::Eof) | None => {
                debug!("parse error in consume_qualified_rule: unexpected end of input");
                return None;
            }
            Some(CssToken::OpenCurlyBrace) => {
                let block = consume_block(tokens);
                let declarations = consume_list_of_declarations(&block);
                let selector_text = serialize_tokens(&prelude);

                // If the selector parsing fails, the entire style rule is invalid and is ignored.
                return match selector::parse_selector_tokens(&prelude) {
                    Ok(selectors) => Some(StyleRule {
                        selector_text,
                        selectors,
                        declarations,
                    }),
                    Err(e) => {
                        debug!("dropped the rule `{}`: {}", selector_text, e);
                        None
                    }
                };
            }
            Some(t) => prelude.push(t),
        }
    }
}

/// Consumes tokens up to the `}` matching an already consumed `{` and returns the tokens inside.
fn consume_block(tokens: &mut TokenIterator<CssToken>) -> Vec<CssToken> {
    let mut depth = 0usize;
    let mut block = Vec::new();
    loop {
        match tokens.next() {
            Some(CssToken::Eof) | None => return block,
            Some(CssToken::CloseCurlyBrace) if depth == 0 => return block,
            Some(t) => {
                match t {
                    CssToken::OpenCurlyBrace => depth += 1,
                    CssToken::CloseCurlyBrace => depth -= 1,
                    _ => {}
                }
                block.push(t);
            }
        }
    }
}

/// https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations
fn consume_list_of_declarations(tokens: &[CssToken]) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut current = Vec::new();

    for token in tokens {
        match token {
            CssToken::Semicolon if depth == 0 => {
                declarations.extend(consume_declaration(&current));
                current.clear();
                continue;
            }
            CssToken::Eof => break,
            CssToken::OpenParenthesis
            | CssToken::Function(_)
            | CssToken::OpenSquareBracket
            | CssToken::OpenCurlyBrace => depth += 1,
            CssToken::CloseParenthesis
            | CssToken::CloseSquareBracket
            | CssToken::CloseCurlyBrace => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(token.clone());
    }
    declarations.extend(consume_declaration(&current));
    declarations
}

/// https://www.w3.org/TR/css-syntax-3/#consume-declaration
fn consume_declaration(tokens: &[CssToken]) -> Option<Declaration> {
    let tokens = trim_whitespace(tokens);
    let (name, rest) = match tokens.split_first() {
        Some((CssToken::Ident(name), rest)) => (name, rest),
        None => return None,
        Some((t, _)) => {
            debug!("parse error in consume_declaration: expected ident but found {:?}", t);
            return None;
        }
    };
    let rest = trim_whitespace(rest);
    let Some((CssToken::Colon, value)) = rest.split_first() else {
        debug!("parse error in consume_declaration: expected \":\" after `{}`", name);
        return None;
    };

    let mut value = trim_whitespace(value);
    let mut important = false;
    if let Some((CssToken::Ident(last), init)) = value.split_last() {
        let init = trim_whitespace(init);
        if last.eq_ignore_ascii_case("important") {
            if let Some((CssToken::Delim('!'), init)) = init.split_last() {
                important = true;
                value = trim_whitespace(init);
            }
        }
    }

    let value = serialize_tokens(value);
    if value.is_empty() {
        return None;
    }
    let name = if name.starts_with("--") {
        name.clone()
    } else {
        name.to_ascii_lowercase()
    };
    Some(Declaration {
        name,
        value,
        important,
    })
}

fn trim_whitespace(tokens: &[CssToken]) -> &[CssToken] {
    let start = tokens
        .iter()
        .position(|t| *t != CssToken::Whitespace)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| *t != CssToken::Whitespace)
        .map_or(start, |p| p + 1);
    &tokens[start..end]
}

pub fn serialize_tokens(tokens: &[CssToken]) -> String {
    trim_whitespace(tokens)
        .iter()
        .map(|t| t.to_string())
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rules_and_declarations() {
        let sheet = parse_stylesheet(
            "#main > p.note { color: #ff0000 !important; font-size : 12px }\n a, b{margin:0 auto}",
        );
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selector_text, "#main > p.note");
        assert_eq!(
            sheet.rules[0].declarations,
            vec![
                Declaration {
                    name: "color".into(),
                    value: "#ff0000".into(),
                    important: true,
                },
                Declaration {
                    name: "font-size".into(),
                    value: "12px".into(),
                    important: false,
                },
            ]
        );
        assert_eq!(sheet.rules[1].selectors.len(), 2);
        assert_eq!(sheet.rules[1].declarations[0].value, "0 auto");
    }

    #[test]
    fn invalid_rules_and_at_rules_are_skipped() {
        let sheet = parse_stylesheet(
            "@media screen { p { color: red } } #1bad { color: red } @import url(x.css); p { color: blue }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "blue");
    }

    #[test]
    fn declaration_values_keep_functions() {
        let decls = parse_declaration_list(
            "background: linear-gradient(90deg, rgb(1, 2, 3) 0%, #fff 50%); COLOR: Red; bogus; : x",
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(
            decls[0].value,
            "linear-gradient(90deg, rgb(1, 2, 3) 0%, #fff 50%)"
        );
        assert_eq!(decls[1].name, "color");
        assert_eq!(decls[1].value, "Red");
    }

    #[test]
    fn unterminated_rule_is_dropped() {
        let sheet = parse_stylesheet("p { color: red } div");
        assert_eq!(sheet.rules.len(), 1);
    }
}
