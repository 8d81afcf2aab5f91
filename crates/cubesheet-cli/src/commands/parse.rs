use cubesheet_core::error::CubeError;
use cubesheet_core::parsing::ParsedDocument;
use cubesheet_core::trace::{ScanTrace, TraceCollector, TracingObserver};
use serde::Serialize;
use std::path::PathBuf;

use crate::commands::input::load_document;
use crate::output;

#[derive(Serialize)]
struct ParseOutput<'a> {
    #[serde(flatten)]
    document: &'a ParsedDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a ScanTrace>,
}

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    with_trace: bool,
) -> Result<(), CubeError> {
    let mut collector = TraceCollector::forwarding(TracingObserver);
    let parsed = load_document(&input_file, &mut collector)?;
    let trace = collector.into_trace();

    let out = ParseOutput {
        document: &parsed,
        trace: with_trace.then_some(&trace),
    };

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&out)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} cube record(s), written to {}",
                parsed.records.len(),
                path.display()
            );
            let warnings = trace.warnings().count();
            if warnings > 0 {
                eprintln!("  {warnings} warning(s) during parsing");
            }
        }
        None => match output_format {
            "json" => output::json::print(&out)?,
            _ => {
                output::table::print_records(&parsed);
                if with_trace {
                    output::table::print_trace(&trace);
                }
            }
        },
    }

    Ok(())
}
