//! epub-tidy CLI - web-novel EPUB cleaning tool
//!
//! Cleans every chapter of an EPUB and writes a new archive.

use clap::Parser;
use colored::*;
use epub_tidy::{ArchiveProcessor, Progress, Summary};
use std::path::{Path, PathBuf};

/// Strip site chrome from web-novel EPUB chapters
#[derive(Parser)]
#[command(
    name = "epub-tidy",
    author = "iyulab",
    version,
    about = "Strip navigation, comments and scripts from web-novel EPUB chapters",
    long_about = "epub-tidy - keeps only the title and story text of each chapter.\n\n\
                  Usage:\n  \
                  epub-tidy                       Clean input.epub into out_cleaned.epub\n  \
                  epub-tidy <input> <output>      Clean <input> into <output>"
)]
struct Cli {
    /// Input EPUB path
    #[arg(default_value = "input.epub")]
    input: PathBuf,

    /// Output EPUB path
    #[arg(default_value = "out_cleaned.epub")]
    output: PathBuf,

    /// Print the run summary as JSON after processing
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("Reading {}...", cli.input.display());

    let summary = ArchiveProcessor::new().process_with_progress(&cli.input, &cli.output, report)?;

    print_summary(&cli.input, &cli.output, &summary);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn report(event: Progress<'_>) {
    match event {
        Progress::Started { total } => {
            println!("{}: {}", "Chapters to clean".bold(), total);
        }
        Progress::Cleaned { processed, total } => {
            println!("Cleaned {}/{} chapters", processed, total);
        }
        Progress::Failed { name, message } => {
            println!("{} {}: {}", "✗".red().bold(), name, message);
        }
        Progress::RebuildingSpine => {
            println!("Rebuilding reading order...");
        }
        Progress::Writing { path } => {
            println!("Writing {}...", path.display());
        }
    }
}

fn print_summary(input: &Path, output: &Path, summary: &Summary) {
    let mark = if summary.is_complete() {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };

    println!();
    println!("{} {}", mark, "Cleaning Complete".green().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Input".bold(), input.display());
    println!("{}: {}", "Output".bold(), output.display());
    println!(
        "{}: {}/{} chapters",
        "Cleaned".bold(),
        summary.processed,
        summary.total
    );
    println!("{}: {}", "Reading order".bold(), summary.reading_order);

    if !summary.failures.is_empty() {
        println!("\n{}", "Failures".yellow().bold());
        println!("{}", "─".repeat(40));
        for failure in &summary.failures {
            println!("  {} {}: {}", "✗".red(), failure.name, failure.message);
        }
    }
}
