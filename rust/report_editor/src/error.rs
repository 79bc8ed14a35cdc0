use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unrecognized JSON shape: {0}")]
    UnrecognizedShape(String),

    #[error("document is empty")]
    EmptyDocument,

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
