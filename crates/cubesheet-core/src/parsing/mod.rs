pub mod mark;
pub mod metadata;
pub mod scanner;

use crate::error::CubeError;
use crate::extraction::{ExtractedDocument, PageContent, SkippedPage};
use crate::model::{CubeRecord, PageMetadata};
use crate::trace::{ScanEvent, ScanObserver};
use metadata::extract_metadata_observed;
use scanner::Scanner;
use serde::{Deserialize, Serialize};

/// Per-page outcome of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: usize,
    pub metadata: PageMetadata,
    pub records: usize,
}

/// Records of a whole document, in page then line order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub records: Vec<CubeRecord>,
    pub pages: Vec<PageSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<SkippedPage>,
}

/// Extract metadata, then records, from a single page.
///
/// A page without records yields an empty list; that is not an error here.
pub fn parse_page(
    page: &PageContent,
    observer: &mut dyn ScanObserver,
) -> (PageSummary, Vec<CubeRecord>) {
    let metadata = extract_metadata_observed(&page.text, page.page_number, observer);

    let records: Vec<CubeRecord> =
        Scanner::with_observer(&page.text, page.page_number, &metadata, &mut *observer)
            .map(|m| m.record)
            .collect();

    if records.is_empty() {
        observer.on_event(ScanEvent::PageEmpty {
            page_number: page.page_number,
        });
    } else {
        observer.on_event(ScanEvent::PageScanned {
            page_number: page.page_number,
            records: records.len(),
        });
    }

    let summary = PageSummary {
        page_number: page.page_number,
        metadata,
        records: records.len(),
    };
    (summary, records)
}

/// Parse every page of a document and merge the records.
///
/// Pages are handled strictly in order and share nothing: each page's
/// metadata is extracted from that page alone. Fails with
/// [`CubeError::NoRecords`] when the whole document yields nothing.
pub fn parse_document(
    doc: &ExtractedDocument,
    observer: &mut dyn ScanObserver,
) -> Result<ParsedDocument, CubeError> {
    for skipped in &doc.skipped {
        observer.on_event(ScanEvent::PageSkipped {
            page_number: skipped.page_number,
            reason: skipped.reason.clone(),
        });
    }

    let mut records = Vec::new();
    let mut pages = Vec::with_capacity(doc.pages.len());

    for page in &doc.pages {
        let (summary, page_records) = parse_page(page, observer);
        records.extend(page_records);
        pages.push(summary);
    }

    if records.is_empty() {
        return Err(CubeError::NoRecords);
    }

    Ok(ParsedDocument {
        records,
        pages,
        skipped_pages: doc.skipped.clone(),
    })
}
