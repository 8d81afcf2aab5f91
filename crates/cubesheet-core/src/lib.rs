pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod output;
pub mod parsing;
pub mod trace;
pub mod validate;

pub use model::{ConcreteType, CubeRecord};

use error::CubeError;
use extraction::text::split_text_pages;
use extraction::PdfExtractor;
use parsing::ParsedDocument;
use trace::ScanObserver;

/// Main API entry point: extract every cube record from a PDF report.
///
/// Pages are extracted by `extractor`, then scanned one at a time. Every
/// per-line and per-page finding goes to `observer`; only a document that
/// yields no records at all is an error.
pub fn parse_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    observer: &mut dyn ScanObserver,
) -> Result<ParsedDocument, CubeError> {
    let doc = extractor.extract_pages(pdf_bytes)?;
    parsing::parse_document(&doc, observer)
}

/// Extract cube records from already-extracted report text.
///
/// Form feeds and `TEST REPORT` header lines separate pages.
pub fn parse_text(
    text: &str,
    observer: &mut dyn ScanObserver,
) -> Result<ParsedDocument, CubeError> {
    let doc = split_text_pages(text);
    parsing::parse_document(&doc, observer)
}
