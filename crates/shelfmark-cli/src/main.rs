use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use shelfmark_core::config_file::{self, ConfigFile};
use shelfmark_core::{Config, ProgressEvent, TopicPatterns};
use shelfmark_pdf::LopdfSource;

mod output;

use output::ColorMode;

/// Shelfmark - Classify, rate and deduplicate a PDF book library
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a directory of PDFs and produce a library report
    Scan {
        /// Root directory to scan recursively
        root: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Write the JSON report to a file instead of rendering to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Number of worker tasks
        #[arg(long)]
        workers: Option<usize>,

        /// Path to a TOML topic-pattern table replacing the built-in one
        #[arg(long)]
        patterns: Option<PathBuf>,

        /// Seed for rating jitter (omit for deterministic ratings)
        #[arg(long)]
        jitter_seed: Option<u64>,

        /// Upper bound for accepted publication years
        #[arg(long)]
        current_year: Option<i32>,
    },

    /// Validate a TOML topic-pattern table and report every problem
    ValidatePatterns {
        /// Path to the pattern table
        path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            root,
            no_color,
            output,
            json,
            workers,
            patterns,
            jitter_seed,
            current_year,
        } => {
            scan(
                root,
                no_color,
                output,
                json,
                workers,
                patterns,
                jitter_seed,
                current_year,
            )
            .await
        }
        Command::ValidatePatterns { path, no_color } => validate_patterns(&path, no_color),
    }
}

#[allow(clippy::too_many_arguments)]
async fn scan(
    root: PathBuf,
    no_color: bool,
    output: Option<PathBuf>,
    json: bool,
    workers: Option<usize>,
    patterns: Option<PathBuf>,
    jitter_seed: Option<u64>,
    current_year: Option<i32>,
) -> anyhow::Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    // Resolve configuration: CLI flags > config file > defaults
    let file_config = config_file::load_config();
    let config = build_config(&file_config, workers, patterns, jitter_seed, current_year)?;

    let use_color = !no_color && output.is_none() && !json;
    let color = ColorMode(use_color);

    let paths = collect_pdfs(&root);
    if paths.is_empty() {
        anyhow::bail!("No PDF files found under {}", root.display());
    }

    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let progress_bar = bar.clone();
    let progress: Arc<dyn Fn(ProgressEvent) + Send + Sync> = Arc::new(move |event| {
        match event {
            ProgressEvent::Processing { path, .. } => {
                progress_bar.set_message(path);
            }
            ProgressEvent::Processed { degraded, path, .. } => {
                if degraded {
                    progress_bar.println(format!("unreadable, kept as filename-only: {path}"));
                }
                progress_bar.inc(1);
            }
        }
    });

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let report = shelfmark_core::analyze_documents(
        Arc::new(config),
        Arc::new(LopdfSource::new()),
        &root,
        paths,
        cancel,
        progress,
    )
    .await;
    bar.finish_and_clear();

    if let Some(ref output_path) = output {
        let json_text = serde_json::to_string_pretty(&report)?;
        std::fs::write(output_path, json_text)?;
        eprintln!("Report written to {}", output_path.display());
        return Ok(());
    }

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        output::print_report(&mut writer, &report, color)?;
    }

    Ok(())
}

/// Fold the on-disk config and CLI flags into an engine [`Config`].
fn build_config(
    file_config: &ConfigFile,
    workers: Option<usize>,
    patterns: Option<PathBuf>,
    jitter_seed: Option<u64>,
    current_year: Option<i32>,
) -> anyhow::Result<Config> {
    let mut config = Config::default();

    let scan = file_config.scan.as_ref();
    let scoring = file_config.scoring.as_ref();

    if let Some(workers) = workers.or_else(|| {
        file_config
            .concurrency
            .as_ref()
            .and_then(|c| c.num_workers)
    }) {
        config.num_workers = workers.max(1);
    }
    if let Some(year) = current_year.or_else(|| scoring.and_then(|s| s.current_year)) {
        config.current_year = year;
    }
    config.jitter_seed = jitter_seed.or_else(|| scoring.and_then(|s| s.jitter_seed));

    if let Some(extra) = scan.and_then(|s| s.extra_publishers.as_ref()) {
        config
            .publishers
            .extend(extra.iter().map(|p| p.to_lowercase()));
    }

    let patterns_path = patterns.or_else(|| {
        scan.and_then(|s| s.patterns_path.as_ref())
            .map(PathBuf::from)
    });
    if let Some(path) = patterns_path {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read pattern table {}: {e}", path.display()))?;
        match TopicPatterns::from_toml(&text) {
            Ok(table) => config.patterns = table,
            Err(e) => {
                // A broken table degrades every record to the
                // classification fallback instead of aborting the run.
                eprintln!(
                    "Pattern table {} is invalid ({e}); classifying with fallback heuristics only",
                    path.display()
                );
                config.patterns = TopicPatterns { topics: Vec::new() };
            }
        }
    }

    Ok(config)
}

/// Collect PDF paths under `root`, sorted for stable processing order.
fn collect_pdfs(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}

fn validate_patterns(path: &Path, no_color: bool) -> anyhow::Result<()> {
    use owo_colors::OwoColorize;

    let color = ColorMode(!no_color);
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read pattern table {}: {e}", path.display()))?;

    let issues = TopicPatterns::validate_toml(&text)
        .map_err(|e| anyhow::anyhow!("Pattern table is structurally invalid: {e}"))?;

    if issues.is_empty() {
        if color.enabled() {
            println!("{} {}", "PASS".green().bold(), path.display());
        } else {
            println!("PASS {}", path.display());
        }
        return Ok(());
    }

    for issue in &issues {
        if color.enabled() {
            println!("{} {issue}", "WARN".yellow().bold());
        } else {
            println!("WARN {issue}");
        }
    }
    anyhow::bail!("{} issue(s) found in {}", issues.len(), path.display());
}
