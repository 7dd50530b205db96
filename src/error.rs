use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error("{0}")]
    CssParse(String),
    #[error("{0}")]
    CssSelectorParse(String),
    #[error("{0}")]
    Storage(String),
    #[error("No active element is selected")]
    NoActiveElement,
    #[error("No changes to undo for `{0}`")]
    NothingToUndo(String),
    #[error("No original values were captured for `{0}`")]
    MissingOriginal(String),
    #[error("The element belongs to the editor UI and cannot be selected")]
    IgnoredTarget,
    #[error("`{0}` is not a single property value")]
    InvalidValue(String),
    #[error("No element matches `{0}`")]
    NoMatchingElement(String),
    #[error("No element at hierarchy level {0}")]
    HierarchyIndex(usize),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
