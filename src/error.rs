use thiserror::Error;

#[derive(Error, Debug)]
pub enum JimakuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid segment {id}: {reason}")]
    InvalidSegment { id: u32, reason: String },

    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Subtitle parse error at line {line}: {reason}")]
    SubtitleParse { line: usize, reason: String },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, JimakuError>;
