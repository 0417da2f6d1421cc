//! Duplicate resolution over completed records.
//!
//! Runs single-threaded after all per-record work: each record registers
//! normalized-name signatures, and a collision picks a keeper by metadata
//! completeness. Records are processed in input order; signature variants
//! iterate in their set order, so the whole pass is deterministic.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::normalize::normalize_name;
use crate::Record;

/// One resolved duplicate: `duplicate_path` is redundant with `original_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEdge {
    pub original_path: String,
    pub duplicate_path: String,
}

/// (size_bytes, page_count, normalized name).
type Signature = (u64, u32, String);

/// Normalized-name variants for one record: title, filename stem, and
/// author+title when an author is present.
fn signatures(record: &Record) -> BTreeSet<Signature> {
    let mut names = BTreeSet::new();
    let title = normalize_name(&record.title);
    if !title.is_empty() {
        names.insert(title.clone());
    }
    let stem = normalize_name(record.file_stem());
    if !stem.is_empty() {
        names.insert(stem);
    }
    if !record.author.is_empty() && !title.is_empty() {
        let combined = normalize_name(&format!("{} {}", record.author, record.title));
        if !combined.is_empty() {
            names.insert(combined);
        }
    }
    names
        .into_iter()
        .map(|name| (record.size_bytes, record.page_count, name))
        .collect()
}

/// Placeholder author values that do not count toward completeness.
const PLACEHOLDER_AUTHORS: &[&str] = &["unknown", "anonymous", "n/a", "various"];

/// Metadata-completeness score used to pick the keeper on a collision.
fn completeness_score(record: &Record) -> u32 {
    let mut score = 0;

    if !record.author.is_empty() {
        score += 2;
        if record.author.split_whitespace().count() > 1 {
            score += 1;
        }
        if !PLACEHOLDER_AUTHORS.contains(&record.author.to_lowercase().as_str()) {
            score += 1;
        }
    }

    if record.year.is_some() {
        score += 2;
    }

    if !record.title.is_empty() {
        score += 1;
        // A title that still looks like a raw filename earns no style point.
        if !record.title.contains('_') && !record.title.to_lowercase().ends_with(".pdf") {
            score += 1;
        }
        if record.title.split_whitespace().count() > 2 {
            score += 1;
        }
    }

    if record.subject.is_some() {
        score += 1;
    }
    if record.keywords.is_some() {
        score += 1;
    }

    score
}

/// Resolve duplicates across `records` in input order.
///
/// The first signature hit decides a match. The more complete record is
/// kept (ties keep the incumbent); when the incoming record wins, every
/// signature pointing at the dethroned keeper is repointed so no record
/// is ever reported as a duplicate twice.
pub fn resolve_duplicates(records: &[Record]) -> Vec<DuplicateEdge> {
    let mut kept: HashMap<Signature, usize> = HashMap::new();
    let mut edges = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let sigs = signatures(record);

        let matched = sigs
            .iter()
            .find_map(|sig| kept.get(sig).copied())
            .filter(|&keeper| keeper != index);

        match matched {
            Some(keeper_index) => {
                let keeper = &records[keeper_index];
                if completeness_score(record) > completeness_score(keeper) {
                    debug!(
                        winner = %record.path,
                        loser = %keeper.path,
                        "incoming record is more complete, replacing keeper"
                    );
                    edges.push(DuplicateEdge {
                        original_path: record.path.clone(),
                        duplicate_path: keeper.path.clone(),
                    });
                    for slot in kept.values_mut() {
                        if *slot == keeper_index {
                            *slot = index;
                        }
                    }
                    for sig in sigs {
                        kept.insert(sig, index);
                    }
                } else {
                    debug!(
                        winner = %keeper.path,
                        loser = %record.path,
                        "incoming record is a duplicate"
                    );
                    edges.push(DuplicateEdge {
                        original_path: keeper.path.clone(),
                        duplicate_path: record.path.clone(),
                    });
                }
            }
            None => {
                for sig in sigs {
                    kept.insert(sig, index);
                }
            }
        }
    }

    edges
}
