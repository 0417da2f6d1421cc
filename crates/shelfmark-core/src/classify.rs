//! Multi-signal topic classification with a fallback ladder.
//!
//! Each (topic, subtopic) pair accumulates weight from independent signal
//! passes over path, title and content text. The best pair wins; when
//! nothing clears the threshold, a chain of cheaper heuristics runs until
//! the catch-all pair, so classification never comes back empty.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::TopicPatterns;
use crate::{FALLBACK_SUBTOPIC, FALLBACK_TOPIC, TopicAssignment};

const PATH_WEIGHT: f64 = 2.0;
const TITLE_WEIGHT: f64 = 3.0;
const TOC_WEIGHT: f64 = 0.5;
const CONTENT_WEIGHT: f64 = 0.1;
const SCORE_THRESHOLD: f64 = 1.0;

/// Leading slice of the content sample treated as a table-of-contents
/// excerpt for the per-pattern pass.
const TOC_EXCERPT_LEN: usize = 2000;

/// Title override patterns tried when no pair clears the threshold.
static TITLE_OVERRIDES: Lazy<Vec<(Regex, &str, &str)>> = Lazy::new(|| {
    [
        (
            r"(?i)machine learning|deep learning|neural network",
            "Artificial Intelligence",
            "Machine Learning",
        ),
        (
            r"(?i)distributed systems?|system design",
            "Software Engineering",
            "Architecture",
        ),
        (r"(?i)web development|full stack", "Web Development", "Full Stack"),
        (r"(?i)data science|analytics", "Artificial Intelligence", "Data Science"),
    ]
    .iter()
    .map(|(p, t, s)| (Regex::new(p).unwrap(), *t, *s))
    .collect()
});

/// Minimal title keywords, the last heuristic before the catch-all.
static TITLE_KEYWORDS: &[(&str, &str, &str)] = &[
    ("algorithm", "Computer Science", "Algorithms"),
    ("programming", "Programming Languages", "Other Languages"),
    ("software", "Software Engineering", "Best Practices"),
    ("network", "Computer Science", "Networks"),
    ("database", "Computer Science", "Databases"),
];

/// Classify against the pattern table; never returns an empty sequence.
///
/// The result is ordered by descending score, ties kept in taxonomy order;
/// the head is the primary assignment.
pub fn classify(
    patterns: &TopicPatterns,
    path: &Path,
    title: &str,
    content_sample: Option<&str>,
) -> Vec<TopicAssignment> {
    let path_text = path.to_string_lossy();
    let toc_excerpt = content_sample.map(|s| head(s, TOC_EXCERPT_LEN));

    let mut scored: Vec<(TopicAssignment, f64)> = Vec::new();
    for topic in &patterns.topics {
        for subtopic in &topic.subtopics {
            let mut score = 0.0;
            if subtopic.patterns.iter().any(|p| p.is_match(&path_text)) {
                score += PATH_WEIGHT;
            }
            if subtopic.patterns.iter().any(|p| p.is_match(title)) {
                score += TITLE_WEIGHT;
            }
            if let Some(toc) = toc_excerpt {
                let hits = subtopic.patterns.iter().filter(|p| p.is_match(toc)).count();
                score += hits as f64 * TOC_WEIGHT;
            }
            if let Some(sample) = content_sample {
                let occurrences: usize =
                    subtopic.patterns.iter().map(|p| p.find_iter(sample).count()).sum();
                score += occurrences as f64 * CONTENT_WEIGHT;
            }
            if score >= SCORE_THRESHOLD {
                scored.push((
                    TopicAssignment::new(&topic.name, &subtopic.name),
                    score,
                ));
            }
        }
    }

    if scored.is_empty() {
        return vec![fallback(path, title)];
    }
    // Stable sort keeps taxonomy order for equal scores.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(assignment, _)| assignment).collect()
}

/// The fallback ladder: title overrides, path segment keywords, minimal
/// title keywords, then the catch-all pair.
fn fallback(path: &Path, title: &str) -> TopicAssignment {
    for (pattern, topic, subtopic) in TITLE_OVERRIDES.iter() {
        if pattern.is_match(title) {
            return TopicAssignment::new(*topic, *subtopic);
        }
    }

    let path_lower = path.to_string_lossy().to_lowercase();
    if path_lower.contains("algorithm") || (path_lower.contains("data") && path_lower.contains("struct")) {
        return TopicAssignment::new("Computer Science", "Algorithms");
    }
    if path_lower.contains("arch") || path_lower.contains("system") {
        return TopicAssignment::new("Software Engineering", "Architecture");
    }

    let title_lower = title.to_lowercase();
    for (keyword, topic, subtopic) in TITLE_KEYWORDS {
        if title_lower.contains(keyword) {
            return TopicAssignment::new(*topic, *subtopic);
        }
    }

    TopicAssignment::new(FALLBACK_TOPIC, FALLBACK_SUBTOPIC)
}

/// First `max` bytes of `s`, cut back to a char boundary.
fn head(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn builtin() -> TopicPatterns {
        TopicPatterns::builtin()
    }

    #[test]
    fn title_signal_dominates() {
        let result = classify(
            &builtin(),
            &PathBuf::from("/books/misc/file.pdf"),
            "Fluent Python",
            None,
        );
        assert_eq!(result[0], TopicAssignment::new("Programming Languages", "Python"));
    }

    #[test]
    fn path_signal_alone_clears_threshold() {
        let result = classify(
            &builtin(),
            &PathBuf::from("/books/rust/untitled.pdf"),
            "",
            None,
        );
        assert_eq!(result[0], TopicAssignment::new("Programming Languages", "Rust"));
    }

    #[test]
    fn content_occurrences_accumulate() {
        // 0.5 for the toc-excerpt pattern hit plus 0.1 per occurrence:
        // five mentions reach the 1.0 threshold.
        let sample = "kubernetes ".repeat(5);
        let result = classify(&builtin(), &PathBuf::from("x.pdf"), "", Some(&sample));
        assert_eq!(result[0], TopicAssignment::new("Software Engineering", "DevOps"));
    }

    #[test]
    fn four_occurrences_fall_short() {
        // 0.5 + 4 * 0.1 = 0.9, below threshold.
        let sample = "kubernetes ".repeat(4);
        let result = classify(&builtin(), &PathBuf::from("x.pdf"), "", Some(&sample));
        assert_eq!(result[0].topic, FALLBACK_TOPIC);
    }

    #[test]
    fn strongest_pair_comes_first() {
        // Title match (3.0) beats path match (2.0).
        let result = classify(
            &builtin(),
            &PathBuf::from("/books/python/book.pdf"),
            "The Rust Programming Language",
            None,
        );
        assert_eq!(result[0], TopicAssignment::new("Programming Languages", "Rust"));
        assert!(result.contains(&TopicAssignment::new("Programming Languages", "Python")));
    }

    #[test]
    fn never_empty_even_with_nothing() {
        let result = classify(&builtin(), &PathBuf::from(""), "", None);
        assert_eq!(result, vec![TopicAssignment::fallback()]);
    }

    #[test]
    fn empty_pattern_table_uses_ladder() {
        let empty = TopicPatterns { topics: Vec::new() };
        let result = classify(
            &empty,
            &PathBuf::from("book.pdf"),
            "Designing Distributed Systems",
            None,
        );
        assert_eq!(result, vec![TopicAssignment::new("Software Engineering", "Architecture")]);
    }

    #[test]
    fn ladder_path_segments() {
        let empty = TopicPatterns { topics: Vec::new() };
        let result = classify(
            &empty,
            &PathBuf::from("/library/algorithms/book.pdf"),
            "Untitled",
            None,
        );
        assert_eq!(result[0], TopicAssignment::new("Computer Science", "Algorithms"));
    }

    #[test]
    fn ladder_title_keywords() {
        let empty = TopicPatterns { topics: Vec::new() };
        let result = classify(&empty, &PathBuf::from("b.pdf"), "About Databases", None);
        assert_eq!(result[0], TopicAssignment::new("Computer Science", "Databases"));
    }
}
