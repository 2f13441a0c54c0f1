use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wordscout::{
    write_lines, EncodingMode, ScanConfig, ScanError, ScanObserver, ScanOutcome, ScanOverrides,
    ScanProgress, Scanner, SearchRequest,
};

type Result<T> = std::result::Result<T, ScanError>;

/// Count occurrences of a literal term in every file under a directory
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Literal text to count (case-sensitive)
    #[arg(short, long)]
    term: String,

    /// Root directory to scan
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Write the result lines to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker threads (1 = sequential)
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Per-file read timeout, e.g. 500ms or 2s
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Replace invalid UTF-8 instead of skipping the file
    #[arg(long)]
    lossy: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_links: bool,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

/// Drives an indicatif bar from scan progress
struct ProgressObserver {
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    fn new(quiet: bool) -> Self {
        let bar = (!quiet).then(|| {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
            ProgressBar::new(0).with_style(style)
        });
        Self { bar }
    }
}

impl ScanObserver for ProgressObserver {
    fn on_progress(&mut self, progress: ScanProgress) {
        if let Some(bar) = &self.bar {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.processed as u64);
        }
    }

    fn on_scan_complete(&mut self, _outcome: &ScanOutcome) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = ScanOverrides {
        thread_count: cli.threads,
        file_timeout: cli.timeout,
        encoding_mode: cli.lossy.then_some(EncodingMode::Lossy),
        follow_links: cli.follow_links,
        log_level: cli.log_level.clone(),
    };
    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(overrides);
    config.validate()?;
    init_logging(&config.log_level);
    debug!("Merged configuration: {:?}", config);

    let request = SearchRequest::new(cli.term, cli.path)?;
    let scanner = Scanner::new(config);
    let mut observer = ProgressObserver::new(cli.quiet || cli.json);
    let outcome = scanner.scan(&request, &mut observer)?;

    if cli.json {
        print_json(&outcome)?;
    } else {
        print_results(&outcome);
    }

    if let Some(output) = cli.output {
        write_lines(&output, outcome.to_lines())?;
        if !cli.json {
            println!("Results saved to {}", output.display());
        }
    }
    Ok(())
}

fn print_json(outcome: &ScanOutcome) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, outcome)
        .map_err(|e| ScanError::io("<stdout>", e.into()))?;
    writeln!(handle).map_err(|e| ScanError::io("<stdout>", e))
}

fn print_results(outcome: &ScanOutcome) {
    for result in &outcome.results {
        println!(
            "{} {}, {} {}, {} {}",
            "File:".bold(),
            result.file_name.blue(),
            "Path:".bold(),
            result.file_path.display(),
            "Occurrences:".bold(),
            result.count.to_string().green()
        );
    }

    println!(
        "\nFound {} occurrences in {} files ({} failed)",
        outcome.total_occurrences(),
        outcome.results.len(),
        outcome.failed_count
    );
    if outcome.walk_errors > 0 {
        println!(
            "{}",
            format!("{} directory entries could not be read", outcome.walk_errors).yellow()
        );
    }
}
