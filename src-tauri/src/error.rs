use thiserror::Error;

/// The input text is not valid JSON.
///
/// Kept separately from [`Error`] because the viewer holds on to it while it shows the raw
/// text instead of a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid JSON at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn from_serde(err: &serde_json::Error) -> Self {
        Self {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A JSON Pointer that does not address a node of the loaded document.
    #[error("invalid pointer: {0}")]
    InvalidPointer(String),

    #[error("no document loaded")]
    NoDocument,

    #[error("no search match at index {0}")]
    InvalidMatch(usize),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid cURL command: {0}")]
    Curl(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("request not found: {0}")]
    RequestNotFound(String),

    /// The external send primitive failed.
    #[error("error sending request: {0}")]
    Transport(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
