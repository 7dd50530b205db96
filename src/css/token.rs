use std::fmt;

use crate::utils::TokenIterator;

/// https://www.w3.org/TR/css-syntax-3/#tokenization
///
/// Numeric tokens keep their source representation so that declaration values
/// can be written back out exactly as they were authored.
#[derive(Clone, Debug, PartialEq)]
pub enum CssToken {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash(String, HashType),
    String(String),
    BadString,
    Url(String),
    BadUrl,
    Delim(char),
    Number(String),
    Percentage(String),
    Dimension(String, String),
    Whitespace,
    Cdo,
    Cdc,
    Colon,
    Semicolon,
    Comma,
    OpenSquareBracket,
    CloseSquareBracket,
    OpenParenthesis,
    CloseParenthesis,
    OpenCurlyBrace,
    CloseCurlyBrace,

    /// EOF is a special token that is used to indicate the end of the input stream.
    Eof,
}

/// The default hash type is unrestricted.
#[derive(Clone, Debug, PartialEq)]
pub enum HashType {
    Id,
    Unrestricted,
}

impl fmt::Display for CssToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CssToken::Ident(s) => write!(f, "{}", s),
            CssToken::Function(s) => write!(f, "{}(", s),
            CssToken::AtKeyword(s) => write!(f, "@{}", s),
            CssToken::Hash(s, _) => write!(f, "#{}", s),
            CssToken::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            CssToken::BadString | CssToken::BadUrl | CssToken::Eof => Ok(()),
            CssToken::Url(s) => write!(f, "url({})", s),
            CssToken::Delim(c) => write!(f, "{}", c),
            CssToken::Number(n) => write!(f, "{}", n),
            CssToken::Percentage(n) => write!(f, "{}%", n),
            CssToken::Dimension(n, unit) => write!(f, "{}{}", n, unit),
            CssToken::Whitespace => write!(f, " "),
            CssToken::Cdo => write!(f, "<!--"),
            CssToken::Cdc => write!(f, "-->"),
            CssToken::Colon => write!(f, ":"),
            CssToken::Semicolon => write!(f, ";"),
            CssToken::Comma => write!(f, ","),
            CssToken::OpenSquareBracket => write!(f, "["),
            CssToken::CloseSquareBracket => write!(f, "]"),
            CssToken::OpenParenthesis => write!(f, "("),
            CssToken::CloseParenthesis => write!(f, ")"),
            CssToken::OpenCurlyBrace => write!(f, "{{"),
            CssToken::CloseCurlyBrace => write!(f, "}}"),
        }
    }
}

#[derive(Debug)]
pub struct CssTokenizer {
    chars: TokenIterator<char>,
}

impl CssTokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            // https://www.w3.org/TR/css-syntax-3/#input-preprocessing
            chars: TokenIterator::new(
                &input
                    .replace("\r\n", "\n")
                    .replace(['\r', '\u{c}'], "\n")
                    .replace('\0', "\u{fffd}")
                    .chars()
                    .collect::<Vec<_>>(),
            ),
        }
    }

    /// Returns the token list, always terminated by `CssToken::Eof`.
    pub fn tokenize(&mut self) -> Vec<CssToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.consume_token();
            let is_eof = token == CssToken::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.peek_nth(n).copied()
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-token
    fn consume_token(&mut self) -> CssToken {
        self.consume_comments();
        let Some(c) = self.chars.next() else {
            return CssToken::Eof;
        };
        match c {
            c if is_whitespace(c) => {
                while self.chars.peek().is_some_and(|c| is_whitespace(*c)) {
                    self.chars.next();
                }
                CssToken::Whitespace
            }
            '"' | '\'' => self.consume_string_token(c),
            '#' => {
                let next = self.peek_at(0);
                if next.is_some_and(is_ident_char) || is_valid_escape(next, self.peek_at(1)) {
                    let type_flag = if starts_ident(next, self.peek_at(1), self.peek_at(2)) {
                        HashType::Id
                    } else {
                        HashType::Unrestricted
                    };
                    CssToken::Hash(self.consume_ident_sequence(), type_flag)
                } else {
                    CssToken::Delim(c)
                }
            }
            '(' => CssToken::OpenParenthesis,
            ')' => CssToken::CloseParenthesis,
            '[' => CssToken::OpenSquareBracket,
            ']' => CssToken::CloseSquareBracket,
            '{' => CssToken::OpenCurlyBrace,
            '}' => CssToken::CloseCurlyBrace,
            ',' => CssToken::Comma,
            ':' => CssToken::Colon,
            ';' => CssToken::Semicolon,
            '+' | '.' => {
                if starts_number(Some(c), self.peek_at(0), self.peek_at(1)) {
                    self.chars.rewind(1);
                    self.consume_numeric_token()
                } else {
                    CssToken::Delim(c)
                }
            }
            '-' => {
                if starts_number(Some(c), self.peek_at(0), self.peek_at(1)) {
                    self.chars.rewind(1);
                    self.consume_numeric_token()
                } else if self.peek_at(0) == Some('-') && self.peek_at(1) == Some('>') {
                    self.chars.forward(2);
                    CssToken::Cdc
                } else if starts_ident(Some(c), self.peek_at(0), self.peek_at(1)) {
                    self.chars.rewind(1);
                    self.consume_ident_like_token()
                } else {
                    CssToken::Delim(c)
                }
            }
            '<' => {
                if self.peek_at(0) == Some('!')
                    && self.peek_at(1) == Some('-')
                    && self.peek_at(2) == Some('-')
                {
                    self.chars.forward(3);
                    CssToken::Cdo
                } else {
                    CssToken::Delim(c)
                }
            }
            '@' => {
                if starts_ident(self.peek_at(0), self.peek_at(1), self.peek_at(2)) {
                    CssToken::AtKeyword(self.consume_ident_sequence())
                } else {
                    CssToken::Delim(c)
                }
            }
            '\\' => {
                if is_valid_escape(Some(c), self.peek_at(0)) {
                    self.chars.rewind(1);
                    self.consume_ident_like_token()
                } else {
                    CssToken::Delim(c)
                }
            }
            c if c.is_ascii_digit() => {
                self.chars.rewind(1);
                self.consume_numeric_token()
            }
            c if is_ident_start_char(c) => {
                self.chars.rewind(1);
                self.consume_ident_like_token()
            }
            _ => CssToken::Delim(c),
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-comment
    fn consume_comments(&mut self) {
        while self.peek_at(0) == Some('/') && self.peek_at(1) == Some('*') {
            self.chars.forward(2);
            loop {
                match self.chars.next() {
                    Some('*') if self.peek_at(0) == Some('/') => {
                        self.chars.next();
                        break;
                    }
                    Some(_) => {}
                    None => return,
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-string-token
    fn consume_string_token(&mut self, ending: char) -> CssToken {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == ending => return CssToken::String(s),
                None => return CssToken::String(s),
                Some('\n') => {
                    self.chars.rewind(1);
                    return CssToken::BadString;
                }
                Some('\\') => match self.peek_at(0) {
                    None => {}
                    Some('\n') => {
                        self.chars.next();
                    }
                    Some(_) => s.push(self.consume_escaped_char()),
                },
                Some(c) => s.push(c),
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-numeric-token
    fn consume_numeric_token(&mut self) -> CssToken {
        let repr = self.consume_number();
        if starts_ident(self.peek_at(0), self.peek_at(1), self.peek_at(2)) {
            CssToken::Dimension(repr, self.consume_ident_sequence())
        } else if self.peek_at(0) == Some('%') {
            self.chars.next();
            CssToken::Percentage(repr)
        } else {
            CssToken::Number(repr)
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-number
    fn consume_number(&mut self) -> String {
        let mut repr = String::new();
        if let Some(c @ ('+' | '-')) = self.peek_at(0) {
            repr.push(c);
            self.chars.next();
        }
        self.consume_digits(&mut repr);
        if self.peek_at(0) == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            self.chars.next();
            self.consume_digits(&mut repr);
        }
        if let Some(e @ ('e' | 'E')) = self.peek_at(0) {
            let has_sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if has_sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                repr.push(e);
                self.chars.next();
                if has_sign {
                    if let Some(sign) = self.chars.next() {
                        repr.push(sign);
                    }
                }
                self.consume_digits(&mut repr);
            }
        }
        repr
    }

    fn consume_digits(&mut self, repr: &mut String) {
        while let Some(c) = self.peek_at(0).filter(|c| c.is_ascii_digit()) {
            repr.push(c);
            self.chars.next();
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token
    fn consume_ident_like_token(&mut self) -> CssToken {
        let name = self.consume_ident_sequence();
        if self.peek_at(0) != Some('(') {
            return CssToken::Ident(name);
        }
        self.chars.next();
        if name.eq_ignore_ascii_case("url") {
            let mut n = 0;
            while self.peek_at(n).is_some_and(is_whitespace) {
                n += 1;
            }
            if !matches!(self.peek_at(n), Some('"' | '\'')) {
                self.chars.forward(n);
                return self.consume_url_token();
            }
        }
        CssToken::Function(name)
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-url-token
    fn consume_url_token(&mut self) -> CssToken {
        let mut url = String::new();
        loop {
            match self.chars.next() {
                Some(')') | None => return CssToken::Url(url),
                Some(c) if is_whitespace(c) => {
                    while self.peek_at(0).is_some_and(is_whitespace) {
                        self.chars.next();
                    }
                    if matches!(self.peek_at(0), Some(')') | None) {
                        self.chars.next();
                        return CssToken::Url(url);
                    }
                    self.consume_bad_url_remnants();
                    return CssToken::BadUrl;
                }
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return CssToken::BadUrl;
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(0)) => {
                    url.push(self.consume_escaped_char())
                }
                Some(c) => url.push(c),
            }
        }
    }

    fn consume_bad_url_remnants(&mut self) {
        while let Some(c) = self.chars.next() {
            if c == ')' {
                break;
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-name
    fn consume_ident_sequence(&mut self) -> String {
        let mut name = String::new();
        loop {
            match self.peek_at(0) {
                Some(c) if is_ident_char(c) => {
                    name.push(c);
                    self.chars.next();
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(1)) => {
                    self.chars.next();
                    name.push(self.consume_escaped_char());
                }
                _ => return name,
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point
    ///
    /// Called with the backslash already consumed.
    fn consume_escaped_char(&mut self) -> char {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek_at(0).is_some_and(|c| c.is_ascii_hexdigit()) {
            if let Some(c) = self.chars.next() {
                hex.push(c);
            }
        }
        if hex.is_empty() {
            return self.chars.next().unwrap_or('\u{fffd}');
        }
        if self.peek_at(0).is_some_and(is_whitespace) {
            self.chars.next();
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|v| *v != 0 && !(0xd800..=0xdfff).contains(v))
            .and_then(char::from_u32)
            .unwrap_or('\u{fffd}')
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// https://www.w3.org/TR/css-syntax-3/#ident-start-code-point
fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// https://www.w3.org/TR/css-syntax-3/#ident-code-point
fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

/// https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape
fn is_valid_escape(c1: Option<char>, c2: Option<char>) -> bool {
    c1 == Some('\\') && c2.is_some_and(|c| c != '\n')
}

/// https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier
fn starts_ident(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    match c1 {
        Some('-') => {
            c2.is_some_and(|c| is_ident_start_char(c) || c == '-') || is_valid_escape(c2, c3)
        }
        Some('\\') => is_valid_escape(c1, c2),
        Some(c) => is_ident_start_char(c),
        None => false,
    }
}

/// https://www.w3.org/TR/css-syntax-3/#starts-with-a-number
fn starts_number(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    let is_digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
    match c1 {
        Some('+' | '-') => is_digit(c2) || (c2 == Some('.') && is_digit(c3)),
        Some('.') => is_digit(c2),
        c => is_digit(c),
    }
}

pub fn tokenize(css: &str) -> Vec<CssToken> {
    CssTokenizer::new(css).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_selector() {
        assert_eq!(
            tokenize("#main > div.card"),
            vec![
                CssToken::Hash("main".into(), HashType::Id),
                CssToken::Whitespace,
                CssToken::Delim('>'),
                CssToken::Whitespace,
                CssToken::Ident("div".into()),
                CssToken::Delim('.'),
                CssToken::Ident("card".into()),
                CssToken::Eof,
            ]
        );
    }

    #[test]
    fn hash_starting_with_digit_is_unrestricted() {
        assert_eq!(
            tokenize("#1abc")[0],
            CssToken::Hash("1abc".into(), HashType::Unrestricted)
        );
    }

    #[test]
    fn tokenize_declaration_values() {
        assert_eq!(
            tokenize("1px -2.5em 50% +3 .5"),
            vec![
                CssToken::Dimension("1".into(), "px".into()),
                CssToken::Whitespace,
                CssToken::Dimension("-2.5".into(), "em".into()),
                CssToken::Whitespace,
                CssToken::Percentage("50".into()),
                CssToken::Whitespace,
                CssToken::Number("+3".into()),
                CssToken::Whitespace,
                CssToken::Number(".5".into()),
                CssToken::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_functions_urls_and_comments() {
        assert_eq!(
            tokenize("/* c */rgb(1,2) url( a.png ) url(\"b\")"),
            vec![
                CssToken::Function("rgb".into()),
                CssToken::Number("1".into()),
                CssToken::Comma,
                CssToken::Number("2".into()),
                CssToken::CloseParenthesis,
                CssToken::Whitespace,
                CssToken::Url("a.png".into()),
                CssToken::Whitespace,
                CssToken::Function("url".into()),
                CssToken::String("b".into()),
                CssToken::CloseParenthesis,
                CssToken::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_escapes_and_custom_idents() {
        assert_eq!(
            tokenize(r"\31 0 --x -webkit-box"),
            vec![
                CssToken::Ident("10".into()),
                CssToken::Whitespace,
                CssToken::Ident("--x".into()),
                CssToken::Whitespace,
                CssToken::Ident("-webkit-box".into()),
                CssToken::Eof,
            ]
        );
    }

    #[test]
    fn tokens_serialize_back() {
        let text = tokenize("rgba(0, 0, 0, .5) !important")
            .iter()
            .map(|t| t.to_string())
            .collect::<String>();
        assert_eq!(text, "rgba(0, 0, 0, .5) !important");
    }
}
