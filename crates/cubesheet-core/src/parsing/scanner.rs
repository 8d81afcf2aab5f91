use crate::model::{CubeRecord, PageMetadata};
use crate::parsing::mark::{split_mark, split_mark_lossy};
use crate::trace::{NoopObserver, ScanEvent, ScanObserver};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

/// The ways a cube line and its mark can be wrapped across physical lines.
///
/// Every case starts with a test line of the form
/// `CU<digits> <mark> ... <density> <strength> S -`; they differ in how much
/// of the mark sits on that line and where the rest of it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCase {
    /// `...-6A` complete on the test line.
    FullMark,
    /// `...-11` on the test line, `A` alone on the next.
    SuffixNextLine,
    /// `...WP-` on the test line, `1A` on the next.
    NumberSuffixNextLine,
    /// `...WP` on the test line, `-1A` on the next.
    DashNumberSuffixNextLine,
    /// `...WP` on the test line, any filler line, then `-1A`.
    DashNumberSuffixTwoLinesDown,
}

impl LayoutCase {
    /// Priority order. The first case that matches at a position wins.
    pub const ALL: [LayoutCase; 5] = [
        LayoutCase::FullMark,
        LayoutCase::SuffixNextLine,
        LayoutCase::NumberSuffixNextLine,
        LayoutCase::DashNumberSuffixNextLine,
        LayoutCase::DashNumberSuffixTwoLinesDown,
    ];

    /// 1-based case number.
    pub fn number(self) -> usize {
        match self {
            LayoutCase::FullMark => 1,
            LayoutCase::SuffixNextLine => 2,
            LayoutCase::NumberSuffixNextLine => 3,
            LayoutCase::DashNumberSuffixNextLine => 4,
            LayoutCase::DashNumberSuffixTwoLinesDown => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutCase::FullMark => "case1_full_mark",
            LayoutCase::SuffixNextLine => "case2_suffix_next_line",
            LayoutCase::NumberSuffixNextLine => "case3_number_suffix_next_line",
            LayoutCase::DashNumberSuffixNextLine => "case4_dash_number_suffix_next_line",
            LayoutCase::DashNumberSuffixTwoLinesDown => "case5_dash_number_suffix_two_lines_down",
        }
    }

    pub fn lines_consumed(self) -> usize {
        rule(self).continuation.lines_consumed()
    }
}

impl fmt::Display for LayoutCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the lines after the test line must hold to complete the mark.
#[derive(Debug, Clone, Copy)]
enum Continuation {
    None,
    /// Exactly one uppercase letter on the next line.
    SuffixLetter,
    /// `<digits><letter>` on the next line.
    NumberSuffix,
    /// `-<digits><letter>` on the line `offset` below; lines in between are discarded.
    DashNumberSuffix { offset: usize },
}

impl Continuation {
    fn lines_consumed(self) -> usize {
        match self {
            Continuation::None => 1,
            Continuation::SuffixLetter | Continuation::NumberSuffix => 2,
            Continuation::DashNumberSuffix { offset } => offset + 1,
        }
    }
}

struct CaseRule {
    case: LayoutCase,
    line: Regex,
    continuation: Continuation,
}

/// Test line with the given mark shape in group 1; group 3 is the strength.
fn test_line_pattern(mark: &str) -> Regex {
    Regex::new(&format!(
        r"CU\d+\s+({mark})\s+.*?\s+(\d+\.?\d*)\s+(\d+\.?\d*)\s+S\s+-"
    ))
    .unwrap()
}

static CASE_TABLE: LazyLock<[CaseRule; 5]> = LazyLock::new(|| {
    let bare_mark = test_line_pattern(r"\d{8}-\d+[A-Z]+");
    [
        CaseRule {
            case: LayoutCase::FullMark,
            line: test_line_pattern(r"\d{8}-\d+[A-Z]+-\d+[A-Z]"),
            continuation: Continuation::None,
        },
        CaseRule {
            case: LayoutCase::SuffixNextLine,
            line: test_line_pattern(r"\d{8}-\d+[A-Z]+-\d+"),
            continuation: Continuation::SuffixLetter,
        },
        CaseRule {
            case: LayoutCase::NumberSuffixNextLine,
            line: test_line_pattern(r"\d{8}-\d+[A-Z]+-"),
            continuation: Continuation::NumberSuffix,
        },
        CaseRule {
            case: LayoutCase::DashNumberSuffixNextLine,
            line: bare_mark.clone(),
            continuation: Continuation::DashNumberSuffix { offset: 1 },
        },
        CaseRule {
            case: LayoutCase::DashNumberSuffixTwoLinesDown,
            line: bare_mark,
            continuation: Continuation::DashNumberSuffix { offset: 2 },
        },
    ]
});

static NUMBER_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([A-Z])$").unwrap());
static DASH_NUMBER_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*(\d+)([A-Z])$").unwrap());

fn rule(case: LayoutCase) -> &'static CaseRule {
    &CASE_TABLE[case.number() - 1]
}

/// One record together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    pub record: CubeRecord,
    pub case: LayoutCase,
    /// Line indices consumed on the page, `start..end`.
    pub lines: Range<usize>,
}

/// Walks the lines of one page and yields cube records lazily.
///
/// At each cursor position the layout cases are tried in priority order.
/// A match advances the cursor past every consumed line; otherwise the
/// cursor moves by one line. Consumed lines are never looked at again.
pub struct Scanner<'a, O: ScanObserver = NoopObserver> {
    lines: Vec<&'a str>,
    cursor: usize,
    page_number: usize,
    metadata: &'a PageMetadata,
    observer: O,
}

impl<'a> Scanner<'a, NoopObserver> {
    pub fn new(text: &'a str, metadata: &'a PageMetadata) -> Self {
        Scanner::with_observer(text, 1, metadata, NoopObserver)
    }
}

impl<'a, O: ScanObserver> Scanner<'a, O> {
    pub fn with_observer(
        text: &'a str,
        page_number: usize,
        metadata: &'a PageMetadata,
        observer: O,
    ) -> Self {
        Scanner {
            lines: text.lines().map(str::trim).collect(),
            cursor: 0,
            page_number,
            metadata,
            observer,
        }
    }

    /// Current line index.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&'a str> {
        self.lines.get(index).copied()
    }

    /// Try one case at line `i`. Returns the assembled full mark, the strength
    /// and the number of lines consumed.
    fn try_case(&self, rule: &CaseRule, i: usize) -> Option<(String, String, usize)> {
        let caps = rule.line.captures(self.line(i)?)?;
        let base = &caps[1];
        let strength = caps[3].to_string();

        let full_mark = match rule.continuation {
            Continuation::None => base.to_string(),
            Continuation::SuffixLetter => {
                let next = self.line(i + 1)?;
                if !is_single_uppercase(next) {
                    return None;
                }
                format!("{base}{next}")
            }
            Continuation::NumberSuffix => {
                let id = NUMBER_SUFFIX_RE.captures(self.line(i + 1)?)?;
                format!("{base}{}{}", &id[1], &id[2])
            }
            Continuation::DashNumberSuffix { offset } => {
                let id = DASH_NUMBER_SUFFIX_RE.captures(self.line(i + offset)?)?;
                format!("{base}-{}{}", &id[1], &id[2])
            }
        };

        Some((full_mark, strength, rule.continuation.lines_consumed()))
    }

    fn build_record(&mut self, full_mark: &str, strength: String) -> CubeRecord {
        let parts = match split_mark(full_mark) {
            Some(parts) => parts,
            None => {
                self.observer.on_event(ScanEvent::MarkUnparsed {
                    page_number: self.page_number,
                    mark: full_mark.to_string(),
                });
                split_mark_lossy(full_mark)
            }
        };

        CubeRecord {
            mark_prefix: parts.prefix,
            mark_number: parts.number,
            mark_suffix: parts.suffix,
            report_number: self.metadata.report_number.clone(),
            date_cast: self.metadata.date_cast.clone(),
            pour_location: self.metadata.pour_location.clone(),
            compressive_strength: strength,
        }
    }
}

impl<O: ScanObserver> Iterator for Scanner<'_, O> {
    type Item = ScanMatch;

    fn next(&mut self) -> Option<ScanMatch> {
        while self.cursor < self.lines.len() {
            let start = self.cursor;
            let hit = CASE_TABLE.iter().find_map(|rule| {
                self.try_case(rule, start)
                    .map(|(mark, strength, consumed)| (rule.case, mark, strength, consumed))
            });

            let Some((case, full_mark, strength, consumed)) = hit else {
                self.cursor += 1;
                continue;
            };

            self.cursor = start + consumed;
            self.observer.on_event(ScanEvent::CaseMatched {
                page_number: self.page_number,
                line_index: start,
                case,
                lines_consumed: consumed,
            });

            let record = self.build_record(&full_mark, strength);
            self.observer.on_event(ScanEvent::RecordEmitted {
                page_number: self.page_number,
                record: record.clone(),
            });

            return Some(ScanMatch {
                record,
                case,
                lines: start..self.cursor,
            });
        }
        None
    }
}

fn is_single_uppercase(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// Scan one page and collect its records.
pub fn scan_page(text: &str, metadata: &PageMetadata) -> Vec<CubeRecord> {
    Scanner::new(text, metadata).map(|m| m.record).collect()
}
