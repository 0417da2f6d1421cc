//! Per-document analysis pipeline and batch orchestration.
//!
//! [`process_document`] is the pure per-file path: extraction,
//! classification, scoring. [`analyze_documents`] drives a batch through
//! the worker pool, then runs the sequential duplicate pass and report
//! assembly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::classify;
use crate::dedupe::resolve_duplicates;
use crate::extract::extract;
use crate::pool::{AnalysisPool, DocJob};
use crate::report::{build_report, Report};
use crate::score::{calculate_rating, estimate_difficulty, reading_time_days};
use crate::{Config, DocumentSource, DocumentText, ProgressEvent, Record};

/// Run the full per-document pipeline on one source text.
///
/// Infallible: every failure mode upstream of this point already degraded
/// to empty fields, and every stage has defined behavior for empty input.
pub fn process_document(config: &Config, rel_path: &str, text: &DocumentText) -> Record {
    let stem = Path::new(rel_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let fields = extract(
        &text.metadata,
        &text.first_page_text,
        stem,
        config.current_year,
    );

    let sample = text.full_text_sample.as_deref();
    let topics = classify(&config.patterns, Path::new(rel_path), &fields.title, sample);

    let difficulty = estimate_difficulty(&fields.title, &topics[0], text.page_count);

    // Keyword probe text: opening page plus the content sample.
    let mut probe = text.first_page_text.clone();
    if let Some(sample) = sample {
        probe.push('\n');
        probe.push_str(sample);
    }
    let publisher_hint = ["producer", "publisher", "creator"]
        .iter()
        .filter_map(|k| text.metadata.get(*k).map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let rating = calculate_rating(
        rel_path,
        fields.year,
        text.page_count,
        difficulty,
        &probe,
        &publisher_hint,
        config,
    );

    let suggested_filename =
        suggest_filename(&fields.title, fields.author.as_deref(), fields.year, stem);

    debug!(
        path = %rel_path,
        topic = %topics[0].topic,
        difficulty = %difficulty,
        rating,
        "document analyzed"
    );

    Record {
        path: rel_path.to_string(),
        title: fields.title,
        author: fields.author.unwrap_or_default(),
        year: fields.year,
        page_count: text.page_count,
        size_bytes: text.size_bytes,
        subject: text.metadata.get("subject").cloned(),
        keywords: text.metadata.get("keywords").cloned(),
        topics,
        difficulty,
        rating,
        reading_time_days: reading_time_days(text.page_count, difficulty),
        suggested_filename,
    }
}

/// Filename-only record for an unreadable source file. Equivalent to
/// processing an empty document: the filename heuristics still apply.
pub fn degraded_record(config: &Config, rel_path: &str) -> Record {
    process_document(config, rel_path, &DocumentText::default())
}

/// Characters stripped from suggested filenames.
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const MAX_FILENAME_STEM: usize = 100;

/// Propose `Title - Author [Year].pdf`, degrading gracefully when fields
/// are absent. Never applied by this crate.
fn suggest_filename(title: &str, author: Option<&str>, year: Option<i32>, stem: &str) -> String {
    let mut name = if title.is_empty() {
        stem.to_string()
    } else {
        title.to_string()
    };
    if let Some(author) = author {
        name.push_str(" - ");
        name.push_str(author);
    }
    if let Some(year) = year {
        name.push_str(&format!(" [{year}]"));
    }

    let mut cleaned: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.len() > MAX_FILENAME_STEM {
        let mut end = MAX_FILENAME_STEM;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
        cleaned = cleaned.trim_end().to_string();
    }
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    format!("{cleaned}.pdf")
}

/// Analyze a batch of files and assemble the report.
///
/// Per-document work fans out across the pool and completes in arbitrary
/// order; records are collected back in submission order, so duplicate
/// resolution and the report are deterministic for a given input list.
/// Cancellation drops not-yet-finished documents from the batch.
pub async fn analyze_documents(
    config: Arc<Config>,
    source: Arc<dyn DocumentSource>,
    root: &Path,
    paths: Vec<PathBuf>,
    cancel: CancellationToken,
    progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
) -> Report {
    let total = paths.len();
    let pool = AnalysisPool::new(
        config.clone(),
        source,
        cancel.clone(),
        config.num_workers,
    );

    let mut receivers = Vec::with_capacity(total);
    for (index, path) in paths.into_iter().enumerate() {
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        let (result_tx, result_rx) = oneshot::channel();
        pool.submit(DocJob {
            path,
            rel_path,
            index,
            total,
            result_tx,
            progress: progress.clone(),
        })
        .await;
        receivers.push(result_rx);
    }

    // Close the queue first: workers drain what is already buffered, and on
    // cancellation the undelivered jobs are dropped with the pool, releasing
    // their result senders so the collection loop below cannot stall.
    pool.shutdown().await;

    let mut records = Vec::with_capacity(total);
    for rx in receivers {
        // A dropped sender means the job was cancelled before completion.
        if let Ok(record) = rx.await {
            records.push(record);
        }
    }

    let duplicates = resolve_duplicates(&records);
    build_report(records, duplicates)
}
