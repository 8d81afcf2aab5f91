use crate::extraction::{ExtractedDocument, PageContent};

/// Split pasted report text into pages.
///
/// Form feeds always start a new page. Within each chunk, a line that is
/// exactly the `TEST REPORT` title starts a new page too, so several pasted
/// reports keep their own metadata. Text before the first header stays with
/// the first report.
pub fn split_text_pages(text: &str) -> ExtractedDocument {
    let mut pages = Vec::new();

    for chunk in text.split('\x0c') {
        if chunk.trim().is_empty() {
            continue;
        }
        for section in split_into_reports(chunk) {
            pages.push(PageContent {
                page_number: pages.len() + 1,
                text: section,
            });
        }
    }

    ExtractedDocument::from_pages(pages)
}

fn split_into_reports(chunk: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut found_header = false;

    for line in chunk.lines() {
        if is_report_header(line) {
            if found_header && !current.is_empty() {
                sections.push(current.join("\n"));
                current = Vec::new();
            }
            found_header = true;
        }
        current.push(line);
    }

    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections
}

fn is_report_header(line: &str) -> bool {
    line.trim() == "TEST REPORT"
}
