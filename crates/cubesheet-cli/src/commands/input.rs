use cubesheet_core::error::CubeError;
use cubesheet_core::extraction::pdftotext::PdftotextExtractor;
use cubesheet_core::parsing::ParsedDocument;
use cubesheet_core::trace::ScanObserver;
use cubesheet_core::CubeRecord;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
    Json,
}

/// Decide how to read an input from its extension.
pub fn input_kind(path: &Path) -> Result<InputKind, CubeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => Ok(InputKind::Pdf),
        Some("txt") => Ok(InputKind::Text),
        Some("json") => Ok(InputKind::Json),
        _ => Err(CubeError::UnsupportedInput(format!(
            "{} (expected .pdf, .txt or .json)",
            path.display()
        ))),
    }
}

/// Read a report of any supported kind into records.
///
/// JSON input is a plain array of records and carries no page summaries.
pub fn load_document(
    path: &Path,
    observer: &mut dyn ScanObserver,
) -> Result<ParsedDocument, CubeError> {
    if !path.exists() {
        return Err(CubeError::InputNotFound(path.to_path_buf()));
    }

    match input_kind(path)? {
        InputKind::Pdf => {
            let pdf_bytes = std::fs::read(path)?;
            let extractor = PdftotextExtractor::new();
            cubesheet_core::parse_pdf(&pdf_bytes, &extractor, observer)
        }
        InputKind::Text => {
            let text = std::fs::read_to_string(path)?;
            cubesheet_core::parse_text(&text, observer)
        }
        InputKind::Json => {
            let json_bytes = std::fs::read(path)?;
            let records: Vec<CubeRecord> = serde_json::from_slice(&json_bytes)?;
            if records.is_empty() {
                return Err(CubeError::NoRecords);
            }
            Ok(ParsedDocument {
                records,
                pages: Vec::new(),
                skipped_pages: Vec::new(),
            })
        }
    }
}
