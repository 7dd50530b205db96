pub mod cascade;
pub mod color;
pub mod cssom;
pub mod parser;
pub mod property;
pub mod selector;
pub mod token;

pub use cascade::{computed_style, ComputedStyle, StyleResolver};
pub use color::Color;
pub use parser::{parse_declaration_list, parse_stylesheet};
pub use selector::parse_selector_list;
