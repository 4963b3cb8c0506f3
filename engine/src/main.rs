//! Invoice Fixer CLI - clean up invoice CSV exports
//!
//! # Main Command
//!
//! ```bash
//! invoice-fixer process invoices.csv          # writes invoices_new.csv
//! invoice-fixer -s other.txt process in.csv   # use another settings file
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! invoice-fixer parse invoices.csv   # table as JSON records
//! invoice-fixer settings             # parsed settings as JSON
//! invoice-fixer stages               # pipeline stages in order
//! ```

use clap::{Parser, Subcommand};
use invoice_fixer::{process_file_with_settings, read_table, stages_description, RunLog, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "invoice-fixer")]
#[command(about = "Clean up invoice CSV exports using a settings file", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(
        short,
        long,
        global = true,
        env = "INVOICE_FIXER_SETTINGS",
        default_value = "settings.txt"
    )]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a CSV file
    Process {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: <stem><postfix>.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the parsed settings as JSON
    Settings,

    /// Show the pipeline stages
    Stages,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process { input, output } => cmd_process(&input, &cli.settings, output),
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::Settings => cmd_settings(&cli.settings),
        Commands::Stages => {
            println!("{}", stages_description());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("invoice_fixer=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_process(
    input: &Path,
    settings_path: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_file() {
        return Err(format!("'{}' doesn't appear to be a valid file", input.display()).into());
    }
    if !settings_path.is_file() {
        return Err(format!(
            "the settings file '{}' appears to be missing",
            settings_path.display()
        )
        .into());
    }

    let mut log = RunLog::new();
    let settings = Settings::load(settings_path, &mut log)?;
    let output = output.unwrap_or_else(|| output_path(input, &settings.new_file_name_postfix));

    let summary = process_file_with_settings(input, &settings, &output, &mut log)?;

    eprintln!("\nRows: {}", summary.rows);
    eprintln!(
        "Stages applied: {}",
        summary.applied.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    );
    if !summary.skipped.is_empty() {
        eprintln!(
            "Stages skipped: {}",
            summary.skipped.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        );
    }
    if log.has_issues() {
        eprintln!("Issues ({}):", log.issues().len());
        for issue in log.issues().iter().take(20) {
            eprintln!("  - {}", issue);
        }
    }
    eprintln!("\nAll done! New file: {}", output.display());
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let result = read_table(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Columns: {}", result.table.headings().join(", "));
    eprintln!("Parsed {} records", result.table.len());

    let json = serde_json::to_string_pretty(&result.table.to_json_records())?;
    write_output(&json, output)
}

fn cmd_settings(settings_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut log = RunLog::new();
    let settings = Settings::load(settings_path, &mut log)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

/// `<dir>/<stem><postfix><.ext>`
fn output_path(input: &Path, postfix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, postfix, ext.to_string_lossy()),
        None => format!("{}{}", stem, postfix),
    };
    input.with_file_name(file_name)
}
