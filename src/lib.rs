#![deny(unsafe_code)]

pub mod app;
pub mod css;
pub mod editor;
pub mod error;
pub mod html;
pub mod utils;

pub use app::{Command, Config, Runner};
pub use editor::{
    EditorConfig, FileStorage, MemoryStorage, Storage, StyleEditorSession, StyleRuleSet,
};
pub use error::{Error, Result};
pub use html::parse_html;
