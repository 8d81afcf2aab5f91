mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cubesheet",
    version,
    about = "Convert concrete cube compressive-strength test reports into spreadsheets"
)]
struct Cli {
    /// Log debug detail (per-line matches, metadata lookups)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract cube records from a report (or a folder of PDFs) and write a workbook
    Process {
        /// Report to read: PDF, pasted text (.txt) or pre-parsed records (.json)
        #[arg(required_unless_present = "folder", conflicts_with = "folder")]
        input: Option<PathBuf>,

        /// Output file: .xlsx workbook, or pipe-delimited .csv
        #[arg(required_unless_present = "folder", conflicts_with = "folder")]
        output: Option<PathBuf>,

        /// Process every PDF in this folder
        #[arg(long, value_name = "DIR", requires = "output_dir")]
        folder: Option<PathBuf>,

        /// Where batch workbooks are written as <name>_processed.xlsx
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Check records and log errors, warnings and statistics
        #[arg(long)]
        validate: bool,

        /// Custom JSON report configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Log file (default: cube_automation.log next to the output)
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,
    },
    /// Extract cube records from a report and print them (without writing a workbook)
    Parse {
        /// Path to PDF, pasted text (.txt) or pre-parsed JSON
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write parsed output to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Include the per-page scan trace
        #[arg(long)]
        trace: bool,
    },
    /// Check extracted records for missing fields, duplicates and implausible values
    Validate {
        /// Path to PDF, pasted text (.txt) or pre-parsed JSON
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Custom JSON report configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Inspect and check report configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in configuration as JSON
    Show,
    /// Validate a custom configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            folder,
            output_dir,
            validate,
            config,
            log_file,
        } => commands::process::run(commands::process::ProcessArgs {
            input,
            output,
            folder,
            output_dir,
            validate,
            config,
            log_file,
            verbose,
        }),
        Commands::Parse {
            input_file,
            output,
            out,
            trace,
        } => logging::init(verbose, None)
            .and_then(|()| commands::parse::run(input_file, &output, out, trace)),
        Commands::Validate {
            input_file,
            output,
            config,
        } => logging::init(verbose, None)
            .and_then(|()| commands::validate::run(input_file, &output, config)),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
