use cubesheet_core::model::RecordField;
use cubesheet_core::parsing::ParsedDocument;
use cubesheet_core::trace::{ScanTrace, TraceSeverity};
use cubesheet_core::validate::{ValidationIssue, ValidationReport};

const COLUMN_TITLES: [&str; 7] = [
    "Prefix",
    "No.",
    "Sfx",
    "Report No.",
    "Date Cast",
    "MPa",
    "Pour Location",
];

pub fn print_records(parsed: &ParsedDocument) {
    for summary in &parsed.pages {
        let m = &summary.metadata;
        println!(
            "Page {}: {} cube(s)  report={}  cast={}  location={}",
            summary.page_number,
            summary.records,
            or_dash(&m.report_number),
            or_dash(&m.date_cast),
            or_dash(&m.pour_location),
        );
    }
    for skipped in &parsed.skipped_pages {
        println!("Page {}: skipped ({})", skipped.page_number, skipped.reason);
    }
    if !parsed.pages.is_empty() || !parsed.skipped_pages.is_empty() {
        println!();
    }

    let rows: Vec<[&str; 7]> = parsed
        .records
        .iter()
        .map(|r| RecordField::ALL.map(|f| r.field(f)))
        .collect();

    let mut widths = COLUMN_TITLES.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    print_row(&COLUMN_TITLES, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("  {}", rule.join("  "));
    for row in &rows {
        print_row(row, &widths);
    }

    println!("\n{} cube record(s)", parsed.records.len());
}

fn print_row(cells: &[&str; 7], widths: &[usize; 7]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    println!("  {}", padded.join("  ").trim_end());
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

pub fn print_validation(report: &ValidationReport) {
    let stats = &report.stats;
    println!("Total cubes: {}", stats.total_cubes);
    for (ty, count) in &stats.by_type {
        match stats.avg_strength.get(ty) {
            Some(avg) => println!("  {:<8} {:>4}  avg {} MPa", ty.name(), count, avg),
            None => println!("  {:<8} {:>4}", ty.name(), count),
        }
    }

    print_issues("Errors", &report.errors);
    print_issues("Warnings", &report.warnings);

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("\nNo issues found.");
    }
}

fn print_issues(title: &str, issues: &[ValidationIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{title} ({}):", issues.len());
    for issue in issues {
        println!("  - {}", issue.message);
    }
}

pub fn print_trace(trace: &ScanTrace) {
    println!("\nScan trace:");
    for entry in &trace.entries {
        let level = match entry.severity {
            TraceSeverity::Warning => "warn ",
            TraceSeverity::Info => "info ",
            TraceSeverity::Debug => "debug",
        };
        println!("  [{level}] {}", entry.message);
    }
}
