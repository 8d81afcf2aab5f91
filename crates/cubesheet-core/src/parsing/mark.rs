use regex::Regex;
use std::sync::LazyLock;

static MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?-)(\d+)([A-Z])$").unwrap());

/// A cube mark split into batch stem, sequence number and specimen letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkParts {
    pub prefix: String,
    pub number: String,
    pub suffix: String,
}

/// Split a full cube mark such as `20250621-45D-1A` into
/// (`20250621-45D-`, `1`, `A`).
///
/// Returns `None` when the mark does not end in `-<digits><letter>`.
pub fn split_mark(mark: &str) -> Option<MarkParts> {
    let caps = MARK_RE.captures(mark)?;
    Some(MarkParts {
        prefix: caps[1].to_string(),
        number: caps[2].to_string(),
        suffix: caps[3].to_string(),
    })
}

/// Like [`split_mark`], but an unparsable mark degrades to
/// (whole mark, "", "") instead of failing.
pub fn split_mark_lossy(mark: &str) -> MarkParts {
    split_mark(mark).unwrap_or_else(|| MarkParts {
        prefix: mark.to_string(),
        number: String::new(),
        suffix: String::new(),
    })
}
