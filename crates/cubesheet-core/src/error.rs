use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CubeError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("no cube data extracted. Check that the report contains 'CU' test lines ending in 'S -'")]
    NoRecords,

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("all {total} document(s) failed to process")]
    BatchFailed { total: usize },

    #[error("failed to write workbook: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
