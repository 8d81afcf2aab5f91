//! Post-extraction checks over the full record set.
//!
//! Findings are annotations only. Nothing here stops a workbook from being
//! written.

use crate::config::ReportConfig;
use crate::model::{ConcreteType, CubeRecord, RecordField};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum IssueKind {
    MissingField(RecordField),
    DuplicateMark,
    InvalidStrength,
    StrengthOutOfRange,
    InvalidDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based record position.
    pub row: usize,
    #[serde(flatten)]
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_cubes: usize,
    pub by_type: BTreeMap<ConcreteType, usize>,
    /// Mean strength per type in MPa, rounded to 2 decimal places.
    pub avg_strength: BTreeMap<ConcreteType, Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Check records for missing fields, duplicate marks, implausible strengths
/// and malformed dates, and summarise them per concrete type.
pub fn validate_records(records: &[CubeRecord], config: &ReportConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_marks = HashSet::new();
    // A sum that overflows `Decimal` is `None` and its type gets no average.
    let mut strength_sums: BTreeMap<ConcreteType, (Option<Decimal>, usize)> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;

        for field in RecordField::ALL {
            if record.field(field).trim().is_empty() {
                let issue = ValidationIssue {
                    row,
                    kind: IssueKind::MissingField(field),
                    message: format!("Row {row}: missing {field}"),
                };
                if field.is_critical() {
                    report.errors.push(issue);
                } else {
                    report.warnings.push(issue);
                }
            }
        }

        let mark = record.full_mark();
        if !mark.is_empty() && !seen_marks.insert(mark.clone()) {
            report.warnings.push(ValidationIssue {
                row,
                kind: IssueKind::DuplicateMark,
                message: format!("Row {row}: duplicate cube mark '{mark}'"),
            });
        }

        let strength = parse_strength(&record.compressive_strength);
        match strength {
            None if !record.compressive_strength.trim().is_empty() => {
                report.warnings.push(ValidationIssue {
                    row,
                    kind: IssueKind::InvalidStrength,
                    message: format!(
                        "Row {row}: invalid compressive strength '{}'",
                        record.compressive_strength
                    ),
                });
            }
            Some(value) if value < config.min_strength || value > config.max_strength => {
                report.warnings.push(ValidationIssue {
                    row,
                    kind: IssueKind::StrengthOutOfRange,
                    message: format!(
                        "Row {row}: strength {value} MPa outside {}-{} MPa",
                        config.min_strength, config.max_strength
                    ),
                });
            }
            _ => {}
        }

        if !record.date_cast.trim().is_empty() && !is_valid_date(&record.date_cast) {
            report.warnings.push(ValidationIssue {
                row,
                kind: IssueKind::InvalidDate,
                message: format!("Row {row}: invalid date_cast '{}'", record.date_cast),
            });
        }

        let ty = record.concrete_type();
        *report.stats.by_type.entry(ty).or_insert(0) += 1;
        if let Some(value) = strength {
            let entry = strength_sums.entry(ty).or_insert((Some(Decimal::ZERO), 0));
            entry.0 = entry.0.and_then(|sum| sum.checked_add(value));
            entry.1 += 1;
        }
    }

    report.stats.total_cubes = records.len();
    report.stats.avg_strength = strength_sums
        .into_iter()
        .filter_map(|(ty, (sum, count))| {
            let avg = sum?.checked_div(Decimal::from(count))?;
            Some((ty, avg.round_dp(2)))
        })
        .collect();

    report
}

fn parse_strength(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// `DD-Mon-YYYY`, month abbreviation in any case, and a real calendar date.
fn is_valid_date(s: &str) -> bool {
    let s = s.trim();
    let bytes = s.as_bytes();
    if bytes.len() != 11 || bytes[2] != b'-' || bytes[6] != b'-' {
        return false;
    }
    NaiveDate::parse_from_str(&title_case(s), "%d-%b-%Y").is_ok()
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use rust_decimal_macros::dec;

    fn record(prefix: &str, number: &str, suffix: &str, strength: &str) -> CubeRecord {
        CubeRecord {
            mark_prefix: prefix.into(),
            mark_number: number.into(),
            mark_suffix: suffix.into(),
            report_number: "04428CU763515".into(),
            date_cast: "01-Aug-2025".into(),
            pour_location: "Zone 2".into(),
            compressive_strength: strength.into(),
        }
    }

    fn validate(records: &[CubeRecord]) -> ValidationReport {
        validate_records(records, &default_config().unwrap())
    }

    #[test]
    fn test_clean_records_have_no_issues() {
        let report = validate(&[
            record("20250801-60D-", "1", "A", "79.2"),
            record("20250801-60D-", "1", "B", "78.8"),
        ]);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.stats.total_cubes, 2);
    }

    #[test]
    fn test_missing_strength_is_an_error() {
        let report = validate(&[record("20250801-60D-", "1", "A", "")]);
        assert!(report.has_errors());
        assert_eq!(
            report.errors[0].kind,
            IssueKind::MissingField(RecordField::CompressiveStrength)
        );
        assert!(report
            .warnings
            .iter()
            .all(|w| w.kind != IssueKind::MissingField(RecordField::CompressiveStrength)));
    }

    #[test]
    fn test_unparsed_mark_reports_number_and_suffix_errors() {
        let report = validate(&[record("20250801-60D", "", "", "60.0")]);
        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::MissingField(RecordField::MarkNumber),
                IssueKind::MissingField(RecordField::MarkSuffix),
            ]
        );
    }

    #[test]
    fn test_missing_optional_fields_are_warnings() {
        let mut r = record("20250801-60D-", "1", "A", "79.2");
        r.pour_location.clear();
        r.report_number.clear();
        r.date_cast.clear();
        let report = validate(&[r]);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 3);
        assert!(report
            .warnings
            .iter()
            .all(|w| matches!(w.kind, IssueKind::MissingField(_))));
    }

    #[test]
    fn test_duplicate_mark_is_warning_and_kept() {
        let records = [
            record("20250801-60D-", "1", "A", "79.2"),
            record("20250801-60D-", "1", "A", "79.2"),
        ];
        let report = validate(&records);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::DuplicateMark);
        assert_eq!(report.warnings[0].row, 2);
        assert_eq!(report.stats.total_cubes, 2);
    }

    #[test]
    fn test_strength_out_of_range() {
        let report = validate(&[
            record("20250801-60D-", "1", "A", "19.9"),
            record("20250801-60D-", "1", "B", "100.1"),
            record("20250801-60D-", "1", "C", "100.0"),
        ]);
        let rows: Vec<usize> = report
            .warnings
            .iter()
            .filter(|w| w.kind == IssueKind::StrengthOutOfRange)
            .map(|w| w.row)
            .collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn test_invalid_strength_text() {
        let report = validate(&[record("20250801-60D-", "1", "A", "n/a")]);
        assert_eq!(report.warnings[0].kind, IssueKind::InvalidStrength);
    }

    #[test]
    fn test_date_shapes() {
        assert!(is_valid_date("02-Jul-2025"));
        assert!(is_valid_date("02-JUL-2025"));
        assert!(is_valid_date("02-jul-2025"));
        assert!(!is_valid_date("2-Jul-2025"));
        assert!(!is_valid_date("02-July-2025"));
        assert!(!is_valid_date("31-Feb-2025"));
        assert!(!is_valid_date("02/07/2025"));
    }

    #[test]
    fn test_invalid_date_warning() {
        let mut r = record("20250801-60D-", "1", "A", "79.2");
        r.date_cast = "31-Feb-2025".into();
        let report = validate(&[r]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::InvalidDate);
    }

    #[test]
    fn test_stats_per_type() {
        let report = validate(&[
            record("20250801-60D-", "1", "A", "79.2"),
            record("20250801-60D-", "1", "B", "78.9"),
            record("20250802-45DWP-", "1", "A", "60.7"),
            record("20250802-30D-", "1", "A", "35.0"),
        ]);
        let stats = &report.stats;
        assert_eq!(stats.total_cubes, 4);
        assert_eq!(stats.by_type[&ConcreteType::Grade60], 2);
        assert_eq!(stats.by_type[&ConcreteType::Grade45Wp], 1);
        assert_eq!(stats.by_type[&ConcreteType::Unknown], 1);
        assert_eq!(stats.avg_strength[&ConcreteType::Grade60], dec!(79.05));
        assert_eq!(stats.avg_strength[&ConcreteType::Grade45Wp], dec!(60.7));
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        let report = validate(&[
            record("20250801-60D-", "1", "A", "70.0"),
            record("20250801-60D-", "1", "B", "70.0"),
            record("20250801-60D-", "1", "C", "70.1"),
        ]);
        assert_eq!(report.stats.avg_strength[&ConcreteType::Grade60], dec!(70.03));
    }

    #[test]
    fn test_overflowing_strength_sum_drops_average() {
        let huge = "79228162514264337593543950335";
        let report = validate(&[
            record("20250801-60D-", "1", "A", huge),
            record("20250801-60D-", "1", "B", huge),
            record("20250802-45D-", "1", "A", "50.0"),
        ]);
        assert_eq!(report.stats.total_cubes, 3);
        assert_eq!(report.stats.by_type[&ConcreteType::Grade60], 2);
        assert!(!report.stats.avg_strength.contains_key(&ConcreteType::Grade60));
        assert_eq!(report.stats.avg_strength[&ConcreteType::Grade45], dec!(50.0));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.row == 1 && w.kind == IssueKind::StrengthOutOfRange));
    }

    #[test]
    fn test_report_serializes_issue_kind() {
        let report = validate(&[record("20250801-60D-", "1", "A", "")]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["kind"], "missing_field");
        assert_eq!(json["errors"][0]["field"], "compressive_strength");
        assert_eq!(json["errors"][0]["row"], 1);
    }
}
