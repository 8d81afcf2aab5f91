use crate::model::PageMetadata;
use crate::trace::{MetadataField, ScanEvent, ScanObserver};
use regex::Regex;
use std::sync::LazyLock;

/// Tried in order; the first pattern that matches anywhere in the page wins.
///
/// `No\b` keeps the short label from matching the start of `Number`.
static REPORT_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)Report\s+No\b\.?:?\s*([A-Z0-9]+)").unwrap(),
        Regex::new(r"(?i)Report\s+Number:?\s*([A-Z0-9]+)").unwrap(),
    ]
});

static DATE_CAST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)Date\s+Cast\s*:\s*(\d{2}-[A-Za-z]{3}-\d{4})").unwrap()]
});

static POUR_LOCATION_LABELS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![Regex::new(r"(?i)(?:Pour\sLocation|Location)\s*:\s*").unwrap()]);

/// Start of the next labelled field after a free-text block.
static NEXT_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n[ \t]*(?:Date\s+Cast|Report\s+No|Report\s+Number)").unwrap()
});

/// Extract the page-scoped report fields. Missing fields are empty strings.
pub fn extract_metadata(text: &str) -> PageMetadata {
    PageMetadata {
        report_number: first_capture(&REPORT_NUMBER_PATTERNS, text).unwrap_or_default(),
        date_cast: first_capture(&DATE_CAST_PATTERNS, text).unwrap_or_default(),
        pour_location: extract_pour_location(text).unwrap_or_default(),
    }
}

/// Extract metadata and report each field to the observer.
pub fn extract_metadata_observed(
    text: &str,
    page_number: usize,
    observer: &mut dyn ScanObserver,
) -> PageMetadata {
    let metadata = extract_metadata(text);

    for (field, value) in [
        (MetadataField::ReportNumber, &metadata.report_number),
        (MetadataField::DateCast, &metadata.date_cast),
        (MetadataField::PourLocation, &metadata.pour_location),
    ] {
        if value.is_empty() {
            observer.on_event(ScanEvent::FieldMissing { page_number, field });
        } else {
            observer.on_event(ScanEvent::FieldFound {
                page_number,
                field,
                value: value.clone(),
            });
        }
    }

    metadata
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).map(|caps| caps[1].to_string()))
}

/// Read the pour location up to the next field label (or end of text),
/// collapsing whitespace runs to single spaces.
fn extract_pour_location(text: &str) -> Option<String> {
    for label in POUR_LOCATION_LABELS.iter() {
        let Some(m) = label.find(text) else {
            continue;
        };
        let rest = &text[m.end()..];
        // The block holds at least one character before a terminator may apply.
        let Some(first) = rest.chars().next() else {
            continue;
        };
        let end = NEXT_FIELD_RE
            .find_at(rest, first.len_utf8())
            .map(|t| t.start())
            .unwrap_or(rest.len());
        return Some(normalize_ws(&rest[..end]));
    }
    None
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
