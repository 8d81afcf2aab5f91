use cubesheet_core::config::{default_config, load_config};
use cubesheet_core::error::CubeError;
use cubesheet_core::trace::TracingObserver;
use cubesheet_core::validate::validate_records;
use std::path::PathBuf;

use crate::commands::input::load_document;
use crate::output;

/// Findings never fail the command; only unreadable input does.
pub fn run(
    input_file: PathBuf,
    output_format: &str,
    config_file: Option<PathBuf>,
) -> Result<(), CubeError> {
    let config = match config_file {
        Some(path) => load_config(&path)?,
        None => default_config()?,
    };

    let parsed = load_document(&input_file, &mut TracingObserver)?;
    let report = validate_records(&parsed.records, &config);

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_validation(&report),
    }

    Ok(())
}
