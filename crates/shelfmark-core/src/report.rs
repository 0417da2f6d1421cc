//! Final report assembly: deterministic ordering, library-wide summary
//! figures, and human-readable size/range formatting.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dedupe::DuplicateEdge;
use crate::Record;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_books: usize,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    pub total_pages: u64,
    pub unique_authors: usize,
    /// `"1999-2023"`, a single `"2008"`, or `"Unknown"`.
    pub years_range: String,
    /// Book count per primary topic, sorted by topic name.
    pub topics: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    /// Kept records, sorted by path.
    pub books: Vec<Record>,
    /// Edges in resolution order.
    pub duplicates: Vec<DuplicateEdge>,
}

/// Format a byte count with two decimals in the largest fitting unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

fn years_range(books: &[&Record]) -> String {
    let years: Vec<i32> = books.iter().filter_map(|b| b.year).collect();
    match (years.iter().min(), years.iter().max()) {
        (Some(min), Some(max)) if min == max => min.to_string(),
        (Some(min), Some(max)) => format!("{min}-{max}"),
        _ => "Unknown".to_string(),
    }
}

/// Assemble the report: duplicates are dropped from the book list and the
/// summary, and the surviving books are sorted by path so output is stable
/// regardless of processing order.
pub fn build_report(records: Vec<Record>, duplicates: Vec<DuplicateEdge>) -> Report {
    let duplicate_paths: BTreeSet<&str> =
        duplicates.iter().map(|e| e.duplicate_path.as_str()).collect();

    let mut books: Vec<Record> = records
        .into_iter()
        .filter(|r| !duplicate_paths.contains(r.path.as_str()))
        .collect();
    books.sort_by(|a, b| a.path.cmp(&b.path));

    let kept: Vec<&Record> = books.iter().collect();
    let total_size_bytes: u64 = kept.iter().map(|b| b.size_bytes).sum();
    let unique_authors = kept
        .iter()
        .filter(|b| !b.author.is_empty())
        .map(|b| b.author.to_lowercase())
        .collect::<BTreeSet<_>>()
        .len();
    let mut topics: BTreeMap<String, usize> = BTreeMap::new();
    for book in &kept {
        *topics.entry(book.primary_topic().topic.clone()).or_default() += 1;
    }

    let summary = Summary {
        total_books: kept.len(),
        total_size_bytes,
        total_size_human: format_size(total_size_bytes),
        total_pages: kept.iter().map(|b| b.page_count as u64).sum(),
        unique_authors,
        years_range: years_range(&kept),
        topics,
    };

    Report {
        summary,
        books,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Difficulty;
    use crate::TopicAssignment;

    fn record(path: &str, author: &str, year: Option<i32>, topic: &str) -> Record {
        Record {
            path: path.to_string(),
            title: "T".to_string(),
            author: author.to_string(),
            year,
            page_count: 100,
            size_bytes: 1024,
            subject: None,
            keywords: None,
            topics: vec![TopicAssignment::new(topic, "General")],
            difficulty: Difficulty::Moderate,
            rating: 6.0,
            reading_time_days: Some(4),
            suggested_filename: String::new(),
        }
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
    }

    #[test]
    fn duplicates_are_excluded_from_summary() {
        let records = vec![
            record("b.pdf", "A", Some(2000), "Computer Science"),
            record("a.pdf", "B", Some(2010), "Computer Science"),
            record("dup.pdf", "A", Some(2005), "Computer Science"),
        ];
        let duplicates = vec![DuplicateEdge {
            original_path: "a.pdf".into(),
            duplicate_path: "dup.pdf".into(),
        }];
        let report = build_report(records, duplicates);
        assert_eq!(report.summary.total_books, 2);
        assert_eq!(report.summary.total_size_bytes, 2048);
        assert_eq!(report.summary.total_pages, 200);
        assert_eq!(report.summary.unique_authors, 2);
        assert_eq!(report.summary.years_range, "2000-2010");
        assert_eq!(report.duplicates.len(), 1);
    }

    #[test]
    fn books_are_sorted_by_path() {
        let report = build_report(
            vec![
                record("z.pdf", "", None, "Computer Science"),
                record("a.pdf", "", None, "Computer Science"),
                record("m.pdf", "", None, "Computer Science"),
            ],
            Vec::new(),
        );
        let paths: Vec<&str> = report.books.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, vec!["a.pdf", "m.pdf", "z.pdf"]);
    }

    #[test]
    fn years_range_degenerate_cases() {
        let single = build_report(vec![record("a.pdf", "", Some(2008), "T")], Vec::new());
        assert_eq!(single.summary.years_range, "2008");
        let none = build_report(vec![record("a.pdf", "", None, "T")], Vec::new());
        assert_eq!(none.summary.years_range, "Unknown");
        let empty = build_report(Vec::new(), Vec::new());
        assert_eq!(empty.summary.years_range, "Unknown");
        assert_eq!(empty.summary.total_books, 0);
    }

    #[test]
    fn topic_counts_use_primary_topic() {
        let report = build_report(
            vec![
                record("a.pdf", "", None, "Computer Science"),
                record("b.pdf", "", None, "Computer Science"),
                record("c.pdf", "", None, "Web Development"),
            ],
            Vec::new(),
        );
        assert_eq!(report.summary.topics.get("Computer Science"), Some(&2));
        assert_eq!(report.summary.topics.get("Web Development"), Some(&1));
    }

    #[test]
    fn authors_are_deduplicated_case_insensitively() {
        let report = build_report(
            vec![
                record("a.pdf", "Robert Martin", None, "T"),
                record("b.pdf", "robert martin", None, "T"),
                record("c.pdf", "", None, "T"),
            ],
            Vec::new(),
        );
        assert_eq!(report.summary.unique_authors, 1);
    }

    #[test]
    fn json_shape_is_stable() {
        let duplicates = vec![DuplicateEdge {
            original_path: "a.pdf".into(),
            duplicate_path: "b.pdf".into(),
        }];
        let report = build_report(vec![record("a.pdf", "X", Some(2020), "T")], duplicates);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["summary"]["total_books"].is_u64());
        assert!(value["summary"]["total_size_human"].is_string());
        assert!(value["books"][0]["rating"].is_f64());
        assert!(value["books"][0]["difficulty"].is_string());
        assert!(value["duplicates"][0]["original_path"].is_string());
        assert!(value["duplicates"][0]["duplicate_path"].is_string());
    }
}
