pub mod pdftotext;
pub mod text;

use crate::error::CubeError;
use serde::{Deserialize, Serialize};

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: usize,
    pub text: String,
}

/// A page whose text could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub page_number: usize,
    pub reason: String,
}

/// All readable pages of one input document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    pub pages: Vec<PageContent>,
    pub skipped: Vec<SkippedPage>,
}

impl ExtractedDocument {
    pub fn from_pages(pages: Vec<PageContent>) -> Self {
        ExtractedDocument {
            pages,
            skipped: Vec::new(),
        }
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text from PDF bytes, one PageContent per readable page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<ExtractedDocument, CubeError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
