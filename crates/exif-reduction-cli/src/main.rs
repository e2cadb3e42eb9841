mod logging;
mod progress;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use exif_reduction_core::{
    Capabilities, ContainerReader, ExiftoolWriter, MetadataWriter, NoopWriter, Operation, ProcessOptions, Progress,
    RunSummary, DEFAULT_WORKERS,
};
use tracing::{info, warn};

use crate::progress::CliProgress;

#[derive(Parser)]
#[command(
    name = "exif-reduction",
    version,
    about = "Repair photo and video timestamps from EXIF, file names and folder names"
)]
struct Cli {
    /// Directory to process (default: current directory)
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Destination for directory-copy
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Which operation to run
    #[arg(short, long, value_enum, default_value_t = Operation::ExifReduction)]
    operation: Operation,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Never rewrite embedded capture dates, only file timestamps
    #[arg(long)]
    no_exif_write: bool,

    /// exiftool executable used to write capture dates into JPEGs
    #[arg(long, default_value = "exiftool")]
    exiftool: PathBuf,

    /// Print the run summaries as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logger();

    let directory = match cli.directory {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut options = ProcessOptions::new(directory, cli.operation).with_workers(cli.workers);
    if let Some(target) = cli.target {
        options = options.with_target(target);
    }
    options.validate()?;

    eprintln!("Operation: {}", options.operation);
    eprintln!("Directory: {}", options.directory.display());
    if let Some(target) = &options.target_directory {
        eprintln!("Target:    {}", target.display());
    }
    eprintln!("Workers:   {}", options.worker_count);

    if !cli.yes && !prompt_confirm("Proceed?")? {
        eprintln!("Aborted, nothing was changed.");
        return Ok(());
    }
    options = options.confirmed(true);

    let writer: Box<dyn MetadataWriter> = if cli.no_exif_write {
        Box::new(NoopWriter)
    } else {
        match ExiftoolWriter::detect(&cli.exiftool) {
            Some(writer) => {
                info!("writing capture dates with {}", cli.exiftool.display());
                Box::new(writer)
            }
            None => {
                warn!(
                    "{} not found; embedded capture dates will not be rewritten",
                    cli.exiftool.display()
                );
                Box::new(NoopWriter)
            }
        }
    };
    let caps = Capabilities {
        reader: &ContainerReader,
        writer: writer.as_ref(),
    };

    let t_total = std::time::Instant::now();
    let bar = CliProgress::new();
    let result = exif_reduction_core::process(&options, caps, &|p: &Progress| bar.update(p));
    bar.finish();
    let summaries = result?;

    for summary in &summaries {
        print_summary(summary);
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }
    eprintln!("Done! ({:.2}s)", t_total.elapsed().as_secs_f64());

    Ok(())
}

fn print_summary(s: &RunSummary) {
    let name = s.operation.map(|o| o.to_string()).unwrap_or_default();
    match s.operation {
        Some(Operation::ExifReduction) => eprintln!(
            "[{}] {} files: {} retimed, {} capture dates written, {} skipped ({:.2}s)",
            name,
            s.total,
            s.retimed,
            s.metadata_written,
            s.skipped.len(),
            s.elapsed.as_secs_f64()
        ),
        _ => eprintln!(
            "[{}] {} files: {} moved, {} copied, {} renamed, {} duplicates, {} already in place, {} empty dirs removed, {} skipped ({:.2}s)",
            name,
            s.total,
            s.moved,
            s.copied,
            s.renamed,
            s.duplicates,
            s.in_place,
            s.dirs_removed,
            s.skipped.len(),
            s.elapsed.as_secs_f64()
        ),
    }
    for (path, reason) in &s.skipped {
        eprintln!("  skipped {}: {}", path.display(), reason);
    }
    if !s.warnings.is_empty() {
        eprintln!("  {} warnings (see log)", s.warnings.len());
    }
}

/// Ask on the terminal; anything but an explicit yes declines.
fn prompt_confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
