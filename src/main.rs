use clap::Parser;
use glob::glob;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod extract;
mod hash;
mod state;
mod ui;

use extract::client::ChatClient;
use extract::ExtractConfig;

/// Send images to a local Ollama vision model and get sorted unique keywords
/// plus SHA-256, or view existing CSV data from .txt files in an image viewer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Image files, wildcards, folders, or *.txt CSV files to process
    #[arg(required = true, num_args = 1..)]
    paths: Vec<String>,

    /// Enable detailed debug output
    #[arg(long)]
    debug: bool,

    /// Network timeout in seconds
    #[arg(long, default_value_t = extract::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let (csv_files, others) = split_inputs(&cli.paths);

    if !csv_files.is_empty() && others.is_empty() {
        run_viewer(&csv_files)
    } else {
        run_extraction(&cli)
    }
}

/// Log to stderr; stdout is reserved for CSV output
fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Separate CSV inputs (viewer) from everything else (extraction)
///
/// Arguments ending in `*.txt` are globbed; existing files with a `.txt`
/// extension in any case are taken as they are.
fn split_inputs(paths: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let mut csv_files = Vec::new();
    let mut others = Vec::new();

    for arg in paths {
        if arg.ends_with("*.txt") {
            match glob(arg) {
                Ok(entries) => csv_files.extend(entries.filter_map(|e| e.ok())),
                Err(err) => warn!("Ignoring invalid pattern {:?}: {}", arg, err),
            }
            continue;
        }

        let path = Path::new(arg);
        if is_txt(path) && path.exists() {
            csv_files.push(path.to_path_buf());
        } else {
            others.push(arg.clone());
        }
    }

    (csv_files, others)
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"))
}

fn run_viewer(csv_files: &[PathBuf]) -> ExitCode {
    let records = state::catalog::load_csv_files(csv_files);
    if records.is_empty() {
        error!("No image data found in the provided .txt files.");
        return ExitCode::FAILURE;
    }

    info!(
        "Loaded {} images from CSV files. Launching GUI...",
        records.len()
    );

    match ui::run(records) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Viewer failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_extraction(cli: &Cli) -> ExitCode {
    let images = extract::scan::expand_inputs(&cli.paths);
    if images.is_empty() {
        error!("No matching images found.");
        return ExitCode::FAILURE;
    }

    let config = ExtractConfig::with_timeout(cli.timeout);
    let client = match ChatClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            error!("Could not create HTTP client: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    let mut output = stdout.lock();
    let result = extract::run_batch(&client, &images, &mut output);
    // Flush errors surface here as well
    let flushed = output.flush();

    match (result, flushed) {
        (Ok(_), Ok(())) => ExitCode::SUCCESS,
        (Err(err), _) => {
            error!("Failed to write output: {}", err);
            ExitCode::FAILURE
        }
        (_, Err(err)) => {
            error!("Failed to write output: {}", err);
            ExitCode::FAILURE
        }
    }
}
