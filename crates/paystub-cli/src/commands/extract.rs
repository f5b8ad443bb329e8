//! Extract command - pull pay data out of a directory of pay stubs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::{glob_with, MatchOptions};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use paystub_core::extract::{create_extractor, PayDataExtractor, Strategy};
use paystub_core::models::config::TextLayout;
use paystub_core::models::document::{DocumentContent, DocumentPages};
use paystub_core::models::paydata::PayData;
use paystub_core::pdf::load_document;

use super::config::load_config;
use super::output::{resolve_output_path, write_records};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Directory holding the pay stubs
    #[arg(short, long, default_value = "./input")]
    directory: PathBuf,

    /// Single file, relative to the directory
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Glob selecting files in the directory
    #[arg(short = 'p', long, default_value = "*.pdf")]
    file_pattern: String,

    /// Extraction strategy (regex, position-index)
    #[arg(long)]
    strategy: Option<String>,

    /// Rules as inline JSON or a path to a rules file
    #[arg(long)]
    rules: Option<String>,

    /// Output file; the extension picks the format (json, xls, xlsx, html, csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// A file that could not be turned into a record.
struct Failure {
    path: PathBuf,
    reason: String,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(strategy) = &args.strategy {
        config.extraction.strategy = strategy.parse::<Strategy>()?;
    }
    if let Some(rules) = &args.rules {
        config.extraction.rules = Some(rules.clone());
    }

    let files = collect_files(&args)?;
    if files.is_empty() {
        anyhow::bail!(
            "No matching files found in {} for pattern: {}",
            args.directory.display(),
            args.file_pattern
        );
    }

    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let extractor = create_extractor(&config)?;
    info!("Using {} strategy", config.extraction.strategy);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut records: Vec<PayData> = Vec::with_capacity(files.len());
    let mut failures: Vec<Failure> = Vec::new();

    for path in &files {
        match process_file(path, extractor.as_ref(), &config.text) {
            Ok(record) => {
                debug!("Extracted check {} from {}", record.check.check_number, path.display());
                records.push(record);
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), reason);
                    failures.push(Failure {
                        path: path.clone(),
                        reason,
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), reason);
                    anyhow::bail!("Processing failed: {}", reason);
                }
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let output = args.output.clone().unwrap_or_else(|| config.output.file.clone());
    let output_path = resolve_output_path(&output, &args.directory);
    write_records(&output_path, &records)?;

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(records.len()).green(),
        style(failures.len()).red()
    );
    println!("   Output written to {}", output_path.display());

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in &failures {
            println!("  - {}: {}", failure.path.display(), failure.reason);
        }
    }

    Ok(())
}

fn collect_files(args: &ExtractArgs) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(file) = &args.file {
        let path = args.directory.join(file);
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        return Ok(vec![path]);
    }

    let pattern = args.directory.join(&args.file_pattern);
    let pattern = pattern.to_string_lossy();
    let options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let mut files: Vec<PathBuf> = glob_with(&pattern, options)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    debug!("Pattern {} matched {} files", pattern, files.len());
    Ok(files)
}

/// Load one input file in the form its extension names.
fn read_document(path: &Path, layout: &TextLayout) -> anyhow::Result<DocumentContent> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let document = load_document(&data, layout).context("step:[parse pdf]")?;
            if document.text.trim().is_empty() {
                anyhow::bail!("No text extracted from PDF");
            }
            Ok(document)
        }
        "txt" => Ok(DocumentContent::from_delimited_text(fs::read_to_string(path)?, layout)),
        "json" => {
            let pages = DocumentPages::from_json(&fs::read_to_string(path)?)?;
            Ok(DocumentContent::from_pages(pages, layout))
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

fn process_file(
    path: &Path,
    extractor: &dyn PayDataExtractor,
    layout: &TextLayout,
) -> anyhow::Result<PayData> {
    let document = read_document(path, layout)
        .with_context(|| format!("step:[read] file:[{}]", path.display()))?;
    let record = extractor
        .extract(&document)
        .with_context(|| format!("step:[parse pay data] file:[{}]", path.display()))?;
    Ok(record)
}
