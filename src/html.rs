pub mod dom;
pub mod parser;
pub mod token;

use crate::error::Result;

use dom::DocumentTree;
use parser::HtmlParser;

/// Parses an HTML document. Malformed markup is recovered from, never rejected.
pub fn parse_html(html: &str) -> Result<DocumentTree> {
    HtmlParser::new(html).parse()
}
