use crate::utils::TokenIterator;

/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_name)
}

/// Elements whose content is not parsed as markup.
pub fn is_raw_text_element(tag_name: &str) -> bool {
    matches!(tag_name, "style" | "script" | "textarea" | "title")
}

/// The output of the tokenization step is a series of zero or more of the following tokens:
/// DOCTYPE, start tag, end tag, comment, text, end-of-file.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlToken {
    Doctype(String),
    StartTag {
        tag_name: String,
        attributes: Vec<(String, String)>, // Vec<(name, value)>
        self_closing: bool,
    },
    EndTag {
        tag_name: String,
    },
    Comment(String),
    /// A run of character data. Adjacent characters are merged into one token.
    Text(String),
    Eof,
}

/// A forgiving HTML tokenizer: malformed markup degrades to text instead of failing.
#[derive(Debug)]
pub struct HtmlTokenizer {
    input: TokenIterator<char>,
    /// Set after a start tag whose content is raw text, e.g. `<style>`.
    raw_text_end: Option<String>,
}

impl HtmlTokenizer {
    pub fn new(html: &str) -> Self {
        Self {
            input: TokenIterator::new(&html.chars().collect::<Vec<_>>()),
            raw_text_end: None,
        }
    }

    pub fn tokenize(&mut self) -> Vec<HtmlToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.consume_token();
            let is_eof = token == HtmlToken::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    pub fn consume_token(&mut self) -> HtmlToken {
        if let Some(tag_name) = self.raw_text_end.take() {
            let text = self.consume_raw_text(&tag_name);
            if !text.is_empty() {
                return HtmlToken::Text(text);
            }
        }

        match self.input.peek() {
            None => HtmlToken::Eof,
            Some('<') => self.consume_markup(),
            Some(_) => HtmlToken::Text(self.consume_text()),
        }
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.input.peek() {
            if *c == '<' && self.starts_markup() {
                break;
            }
            let c = *c;
            self.input.next();
            if c == '&' {
                text.push_str(&self.consume_char_reference());
            } else {
                text.push(c);
            }
        }
        text
    }

    /// Whether the `<` under the cursor opens a tag, comment, or doctype.
    fn starts_markup(&self) -> bool {
        match self.input.peek_nth(1) {
            Some(c) if c.is_ascii_alphabetic() => true,
            Some('/') => self.input.peek_nth(2).is_some_and(|c| c.is_ascii_alphabetic()),
            Some('!') => true,
            _ => false,
        }
    }

    fn consume_markup(&mut self) -> HtmlToken {
        if !self.starts_markup() {
            self.input.next();
            let mut text = String::from('<');
            text.push_str(&self.consume_text());
            return HtmlToken::Text(text);
        }
        self.input.next(); // '<'

        match self.input.peek() {
            Some('!') => {
                self.input.next();
                if self.consume_if_str("--") {
                    HtmlToken::Comment(self.consume_until_str("-->"))
                } else {
                    let body = self.consume_until_str(">");
                    let body = body.trim();
                    let name = body
                        .get(..7)
                        .filter(|p| p.eq_ignore_ascii_case("doctype"))
                        .map(|_| body[7..].trim().to_ascii_lowercase())
                        .unwrap_or_default();
                    HtmlToken::Doctype(name)
                }
            }
            Some('/') => {
                self.input.next();
                let tag_name = self.consume_tag_name();
                self.consume_until_str(">");
                HtmlToken::EndTag { tag_name }
            }
            _ => self.consume_start_tag(),
        }
    }

    fn consume_start_tag(&mut self) -> HtmlToken {
        let tag_name = self.consume_tag_name();
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.input.next() {
                None | Some('>') => break,
                Some('/') => {
                    if self.input.peek() == Some(&'>') {
                        self.input.next();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    self.input.rewind(1);
                    let (name, value) = self.consume_attribute();
                    if !name.is_empty() && !attributes.iter().any(|(k, _)| *k == name) {
                        attributes.push((name, value));
                    }
                }
            }
        }

        if is_raw_text_element(&tag_name) && !self_closing {
            self.raw_text_end = Some(tag_name.clone());
        }

        HtmlToken::StartTag {
            tag_name,
            attributes,
            self_closing,
        }
    }

    fn consume_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.input.peek() {
            if c.is_ascii_whitespace() || *c == '/' || *c == '>' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.input.next();
        }
        name
    }

    fn consume_attribute(&mut self) -> (String, String) {
        let mut name = String::new();
        while let Some(c) = self.input.peek() {
            if c.is_ascii_whitespace() || matches!(c, '/' | '>' | '=') {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.input.next();
        }
        self.skip_whitespace();
        if self.input.peek() != Some(&'=') {
            return (name, String::new());
        }
        self.input.next();
        self.skip_whitespace();

        let mut value = String::new();
        match self.input.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.input.next();
                while let Some(c) = self.input.next() {
                    if c == quote {
                        break;
                    }
                    if c == '&' {
                        value.push_str(&self.consume_char_reference());
                    } else {
                        value.push(c);
                    }
                }
            }
            _ => {
                while let Some(c) = self.input.peek() {
                    if c.is_ascii_whitespace() || *c == '>' {
                        break;
                    }
                    let c = *c;
                    self.input.next();
                    if c == '&' {
                        value.push_str(&self.consume_char_reference());
                    } else {
                        value.push(c);
                    }
                }
            }
        }
        (name, value)
    }

    /// Called after consuming `&`. Unknown references are kept verbatim.
    fn consume_char_reference(&mut self) -> String {
        let mut name = String::new();
        for i in 0..8 {
            match self.input.peek_nth(i) {
                Some(';') => {
                    let decoded = match name.as_str() {
                        "amp" => Some('&'),
                        "lt" => Some('<'),
                        "gt" => Some('>'),
                        "quot" => Some('"'),
                        "apos" => Some('\''),
                        "nbsp" => Some('\u{a0}'),
                        _ => name
                            .strip_prefix("#x")
                            .or_else(|| name.strip_prefix("#X"))
                            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                            .or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                            .and_then(char::from_u32),
                    };
                    return match decoded {
                        Some(c) => {
                            self.input.forward(i + 1);
                            c.to_string()
                        }
                        None => "&".to_string(),
                    };
                }
                Some(c) if c.is_ascii_alphanumeric() || *c == '#' => name.push(*c),
                _ => break,
            }
        }
        "&".to_string()
    }

    fn consume_raw_text(&mut self, tag_name: &str) -> String {
        let end = format!("</{}", tag_name);
        let mut text = String::new();
        while self.input.peek().is_some() {
            let ahead = self
                .input
                .peek_chunk(end.len())
                .into_iter()
                .flatten()
                .collect::<String>();
            if ahead.eq_ignore_ascii_case(&end) {
                break;
            }
            if let Some(c) = self.input.next() {
                text.push(c);
            }
        }
        text
    }

    fn consume_if_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        let ahead = self.input.peek_chunk(n).into_iter().flatten().collect::<String>();
        if ahead == s {
            self.input.forward(n);
            true
        } else {
            false
        }
    }

    /// Consumes up to and including `terminator`, returning what came before it.
    fn consume_until_str(&mut self, terminator: &str) -> String {
        let mut out = String::new();
        while self.input.peek().is_some() {
            if self.consume_if_str(terminator) {
                return out;
            }
            if let Some(c) = self.input.next() {
                out.push(c);
            }
        }
        out
    }

    fn skip_whitespace(&mut self) {
        while self.input.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.input.next();
        }
    }
}
