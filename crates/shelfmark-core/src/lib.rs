use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub mod analyzer;
pub mod classify;
pub mod config_file;
pub mod dedupe;
pub mod extract;
pub mod normalize;
pub mod patterns;
pub mod pool;
pub mod report;
pub mod score;

// Re-export for convenience
pub use analyzer::{analyze_documents, process_document};
pub use dedupe::{DuplicateEdge, resolve_duplicates};
pub use normalize::normalize_name;
pub use patterns::{PatternIssue, TopicPatterns};
pub use report::{Report, Summary, build_report};
pub use score::Difficulty;

/// Sentinel topic assigned when no pattern and no fallback heuristic matches.
pub const FALLBACK_TOPIC: &str = "Uncategorized";
/// Sentinel subtopic paired with [`FALLBACK_TOPIC`].
pub const FALLBACK_SUBTOPIC: &str = "General";

/// Earliest publication year accepted from any source.
pub const MIN_YEAR: i32 = 1900;

/// Raw per-document input supplied by an upstream [`DocumentSource`].
///
/// All fields degrade to empty/zero rather than being absent: a source that
/// cannot read a file at all returns an error, but partial extraction
/// failures (no metadata, no text layer) produce a partially-empty value.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub page_count: u32,
    pub size_bytes: u64,
    /// Embedded metadata, keys lowercased without the PDF `/` prefix
    /// (e.g. `title`, `author`, `creationdate`).
    pub metadata: BTreeMap<String, String>,
    /// Text of the opening page(s), possibly empty.
    pub first_page_text: String,
    /// Roughly the first 20% of the extracted text, when available.
    pub full_text_sample: Option<String>,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open document: {0}")]
    Open(String),
    #[error("failed to extract text: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document readers feeding the analysis pipeline.
///
/// Implementors provide the low-level byte-stream step; everything from
/// field extraction onward lives in this crate and treats the produced
/// [`DocumentText`] as opaque input.
pub trait DocumentSource: Send + Sync {
    /// Read one file. Partial failures degrade to empty fields; only a
    /// fully unreadable file is an error.
    fn read(&self, path: &Path) -> Result<DocumentText, SourceError>;
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("source read error: {0}")]
    Source(#[from] SourceError),
    #[error("pattern table error: {0}")]
    PatternConfig(String),
}

/// A two-level classification tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicAssignment {
    pub topic: String,
    pub subtopic: String,
}

impl TopicAssignment {
    pub fn new(topic: impl Into<String>, subtopic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subtopic: subtopic.into(),
        }
    }

    /// The `Uncategorized`/`General` sentinel pair.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_TOPIC, FALLBACK_SUBTOPIC)
    }
}

/// The working representation of one document.
///
/// Created once per input file, filled in by the extraction, classification
/// and scoring stages, then read-only for duplicate resolution and the
/// report. `path` is the stable identity and never changes.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Relative path under the scan root; immutable key.
    pub path: String,
    /// Best-effort title; may be empty.
    pub title: String,
    /// Best-effort author; empty string means absent.
    pub author: String,
    /// Publication year in `MIN_YEAR..=current_year`, if one was found.
    pub year: Option<i32>,
    pub page_count: u32,
    pub size_bytes: u64,
    /// Embedded subject field, passed through for completeness scoring.
    pub subject: Option<String>,
    /// Embedded keywords field, passed through for completeness scoring.
    pub keywords: Option<String>,
    /// Non-empty after classification; first entry is the primary topic.
    pub topics: Vec<TopicAssignment>,
    pub difficulty: Difficulty,
    /// Always within `[1.0, 10.0]`, rounded to one decimal.
    pub rating: f64,
    /// Estimated days to read at the difficulty's pages-per-day pace.
    /// Absent when the page count is unknown.
    pub reading_time_days: Option<u32>,
    /// Proposed canonical filename; never applied by this crate.
    pub suggested_filename: String,
}

impl Record {
    /// Primary topic pair (classification guarantees at least one entry).
    pub fn primary_topic(&self) -> &TopicAssignment {
        &self.topics[0]
    }

    /// Filename stem of `path`.
    pub fn file_stem(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

/// Engine configuration: injected heuristic tables plus runtime knobs.
///
/// The pattern table and publisher list are explicit data so they can be
/// swapped or emptied without touching the scoring code; an empty pattern
/// table simply routes every record through the classification fallback.
#[derive(Debug, Clone)]
pub struct Config {
    pub num_workers: usize,
    /// Upper bound for accepted publication years and anchor for recency.
    pub current_year: i32,
    /// Seed for the optional rating jitter. `None` disables jitter and
    /// makes ratings fully deterministic.
    pub jitter_seed: Option<u64>,
    /// Compiled `topic -> subtopic -> [regex]` table, in table order.
    pub patterns: TopicPatterns,
    /// Reputable-publisher keywords for the authority sub-score
    /// (matched case-insensitively against metadata and content).
    pub publishers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: 4,
            current_year: 2024,
            jitter_seed: None,
            patterns: TopicPatterns::builtin(),
            publishers: [
                "o'reilly",
                "oreilly",
                "addison-wesley",
                "addison wesley",
                "manning",
                "pragmatic bookshelf",
                "apress",
                "packt",
                "mit press",
                "no starch",
                "wiley",
                "springer",
                "cambridge university",
                "prentice hall",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Progress events emitted while a batch is analyzed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Processing {
        index: usize,
        total: usize,
        path: String,
    },
    Processed {
        index: usize,
        total: usize,
        path: String,
        /// True when the source failed and the record was degraded to
        /// filename-only fields.
        degraded: bool,
    },
}
