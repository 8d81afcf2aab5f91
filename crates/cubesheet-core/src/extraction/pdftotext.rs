use crate::error::CubeError;
use crate::extraction::{ExtractedDocument, PageContent, PdfExtractor, SkippedPage};
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Runs in reading-order mode so that wrapped table cells land on their own
/// lines below the test line, which is what the record scanner expects.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<ExtractedDocument, CubeError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| CubeError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| CubeError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CubeError::PdftotextNotFound
                } else {
                    CubeError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(CubeError::PdftotextFailed { code, stderr });
        }

        Ok(split_pdftotext_output(&output.stdout))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split raw pdftotext output into pages on form feed.
///
/// A page that is not valid UTF-8 is skipped with a reason; the trailing
/// chunk after the final form feed is dropped when empty.
fn split_pdftotext_output(stdout: &[u8]) -> ExtractedDocument {
    let mut doc = ExtractedDocument::default();
    let chunks: Vec<&[u8]> = stdout.split(|b| *b == b'\x0c').collect();
    let last = chunks.len().saturating_sub(1);

    for (i, chunk) in chunks.into_iter().enumerate() {
        let page_number = i + 1;
        if i == last && i > 0 && chunk.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match std::str::from_utf8(chunk) {
            Ok(text) => doc.pages.push(PageContent {
                page_number,
                text: text.to_string(),
            }),
            Err(e) => doc.skipped.push(SkippedPage {
                page_number,
                reason: format!("page text is not valid UTF-8: {e}"),
            }),
        }
    }

    doc
}
