use cubesheet_core::config::{default_config, load_config, ReportConfig};
use cubesheet_core::error::CubeError;
use cubesheet_core::output::{save_workbook, write_pipe_csv};
use cubesheet_core::trace::TracingObserver;
use cubesheet_core::validate::validate_records;
use cubesheet_core::CubeRecord;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::commands::input::load_document;
use crate::logging;

pub struct ProcessArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub folder: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub validate: bool,
    pub config: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

pub fn run(args: ProcessArgs) -> Result<(), CubeError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    match (&args.input, &args.output, &args.folder, &args.output_dir) {
        (Some(input), Some(output), None, _) => {
            if !input.exists() {
                return Err(CubeError::InputNotFound(input.clone()));
            }
            let log_path = args
                .log_file
                .clone()
                .unwrap_or_else(|| parent_dir(output).join(&config.log_filename));
            logging::init(args.verbose, Some(&log_path))?;

            let count = process_document(input, output, &config, args.validate)?;
            println!("Processed {count} cube record(s) -> {}", output.display());
            Ok(())
        }
        (None, None, Some(folder), Some(output_dir)) => {
            let pdfs = list_pdfs(folder)?;
            std::fs::create_dir_all(output_dir)?;
            let log_path = args
                .log_file
                .clone()
                .unwrap_or_else(|| output_dir.join(&config.log_filename));
            logging::init(args.verbose, Some(&log_path))?;

            run_batch(&pdfs, output_dir, &config, args.validate)
        }
        _ => Err(CubeError::UnsupportedInput(
            "give either <INPUT> <OUTPUT> or --folder DIR --output-dir DIR".into(),
        )),
    }
}

/// Extract, optionally validate, and write one document. Returns the record count.
fn process_document(
    input: &Path,
    output: &Path,
    config: &ReportConfig,
    validate: bool,
) -> Result<usize, CubeError> {
    tracing::info!("Processing {}", input.display());

    let parsed = load_document(input, &mut TracingObserver)?;
    let records = parsed.records;
    tracing::info!("Extracted {} cube record(s)", records.len());

    if validate {
        log_validation(&records, config);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if is_csv(output) {
        let file = File::create(output)?;
        write_pipe_csv(&records, BufWriter::new(file))?;
    } else {
        save_workbook(&records, config, output)?;
    }
    tracing::info!("Written to {}", output.display());

    Ok(records.len())
}

fn run_batch(
    pdfs: &[PathBuf],
    output_dir: &Path,
    config: &ReportConfig,
    validate: bool,
) -> Result<(), CubeError> {
    tracing::info!("Found {} PDF file(s)", pdfs.len());

    let mut succeeded = 0;
    for pdf in pdfs {
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".into());
        let output = output_dir.join(format!("{stem}_processed.xlsx"));

        match process_document(pdf, &output, config, validate) {
            Ok(count) => {
                succeeded += 1;
                println!("{}: {count} cube record(s) -> {}", pdf.display(), output.display());
            }
            Err(e) => {
                tracing::error!("{}: {e}", pdf.display());
            }
        }
    }

    tracing::info!("Batch complete: {succeeded}/{} document(s) processed", pdfs.len());

    if succeeded == 0 {
        return Err(CubeError::BatchFailed { total: pdfs.len() });
    }
    Ok(())
}

/// Every `*.pdf` in `folder` (any case), sorted by lowercase file name.
fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, CubeError> {
    if !folder.is_dir() {
        return Err(CubeError::InputNotFound(folder.to_path_buf()));
    }

    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdfs.sort_by_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });

    if pdfs.is_empty() {
        return Err(CubeError::UnsupportedInput(format!(
            "no PDF files found in {}",
            folder.display()
        )));
    }
    Ok(pdfs)
}

fn log_validation(records: &[CubeRecord], config: &ReportConfig) {
    let report = validate_records(records, config);

    for issue in &report.errors {
        tracing::error!("{}", issue.message);
    }
    for issue in &report.warnings {
        tracing::warn!("{}", issue.message);
    }

    let stats = &report.stats;
    tracing::info!("Total cubes: {}", stats.total_cubes);
    for (ty, count) in &stats.by_type {
        match stats.avg_strength.get(ty) {
            Some(avg) => tracing::info!("  {ty}: {count} cube(s), average {avg} MPa"),
            None => tracing::info!("  {ty}: {count} cube(s)"),
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
