//! Best-effort field extraction: title, author and year from embedded
//! metadata, filename shapes and content heuristics, in that priority.
//!
//! Every step is infallible — a source that yields nothing usable degrades
//! to the next one, and the worst case is an empty/absent field, never an
//! error.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::MIN_YEAR;

/// Extracted best-effort fields for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
}

// ── Filename shapes ─────────────────────────────────────────────────────

/// `Title - Author [YYYY]`, `Title by Author [YYYY]`, `Title (Author) [YYYY]`,
/// tried in order; first full match wins.
static FILENAME_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(?P<title>.+?)\s*-\s*(?P<author>.+?)\s*\[(?P<year>\d{4})\]",
        r"^(?P<title>.+?)\s+by\s+(?P<author>.+?)\s*\[(?P<year>\d{4})\]",
        r"^(?P<title>.+?)\s*\((?P<author>[^)]+)\)\s*\[(?P<year>\d{4})\]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// `Initials. Surname` shape used to detect author-first filenames.
static AUTHOR_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\.\s*[A-Z]?\.?\s+[A-Z][a-z]+").unwrap());

/// Trailing `[YYYY]` on a filename stem.
static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\[(\d{4})\]\s*$").unwrap());

/// A plausible 4-digit year anywhere in text.
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

// ── Author validity ─────────────────────────────────────────────────────

/// Generic, software and placeholder strings that disqualify an author
/// (substring match on the lowercased value).
static INVALID_AUTHORS: &[&str] = &[
    "unknown",
    "administrator",
    "admin",
    "user",
    "guest",
    "tex",
    "latex",
    "adobe",
    "microsoft",
    "writer",
    "framemaker",
    "indesign",
    "pdf",
    "acrobat",
    "scanner",
    "scansnap",
    "copyright",
    "radical eye software",
    "www.",
    "http",
    ".com",
    ".org",
    ".net",
];

/// Structural and deny-list validity check for an extracted author string.
///
/// Length in `[2, 100]`, at most 4 digits, at most 30% characters that are
/// neither alphanumeric nor spaces, and no deny-list substring.
pub fn is_valid_author(author: &str) -> bool {
    let trimmed = author.trim();
    if trimmed.len() < 2 || trimmed.len() > 100 {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if INVALID_AUTHORS.iter().any(|bad| lower.contains(bad)) {
        return false;
    }

    if trimmed.chars().filter(|c| c.is_ascii_digit()).count() > 4 {
        return false;
    }

    let special = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();
    (special as f64) <= trimmed.chars().count() as f64 * 0.3
}

// ── Cleanup ─────────────────────────────────────────────────────────────

static ESCAPE_SEQ: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[0-9]+").unwrap());
static META_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-.,:]").unwrap());

/// Clean an embedded metadata value: drop control characters and escape
/// artifacts, replace remaining special characters with spaces, collapse
/// whitespace.
pub fn clean_metadata_value(value: &str) -> String {
    let without_control: String = value.chars().filter(|c| !c.is_control()).collect();
    let without_escapes = ESCAPE_SEQ.replace_all(&without_control, "");
    let spaced = META_SPECIAL.replace_all(&without_escapes, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Filler words and spans stripped from titles.
static TITLE_ARTIFACTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:pdf|ebook|download|free|copy|version)\b",
        r"\([^)]*\)",
        r"\[[^\]]*\]",
        r"(?i)www\.\S+",
        r"(?i)https?://\S+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Clean a title for display: filler-word and annotation stripping, then
/// the general metadata cleanup. Annotations go first since the cleanup
/// would otherwise erase the brackets they match on.
pub fn clean_title(title: &str) -> String {
    let mut title = title.to_string();
    for artifact in TITLE_ARTIFACTS.iter() {
        title = artifact.replace_all(&title, "").into_owned();
    }
    clean_metadata_value(&title)
}

/// Validate a year against the accepted range.
fn accept_year(year: i32, current_year: i32) -> Option<i32> {
    (MIN_YEAR..=current_year).contains(&year).then_some(year)
}

fn parse_year(text: &str, current_year: i32) -> Option<i32> {
    text.parse::<i32>()
        .ok()
        .and_then(|y| accept_year(y, current_year))
}

// ── Per-source extraction ───────────────────────────────────────────────

/// `D:YYYY` PDF date prefix, then any plain 4-digit group.
static PDF_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"D:(\d{4})").unwrap());
static ANY_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

fn year_from_metadata(metadata: &BTreeMap<String, String>, current_year: i32) -> Option<i32> {
    for field in ["creationdate", "moddate", "date"] {
        let Some(value) = metadata.get(field) else {
            continue;
        };
        let captured = PDF_DATE
            .captures(value)
            .or_else(|| ANY_YEAR.captures(value));
        if let Some(caps) = captured
            && let Some(year) = parse_year(&caps[1], current_year)
        {
            return Some(year);
        }
    }
    None
}

/// Parsed fields from a filename stem.
#[derive(Debug, Default)]
struct FilenameFields {
    title: Option<String>,
    author: Option<String>,
    year: Option<i32>,
}

fn parse_filename(stem: &str, current_year: i32) -> FilenameFields {
    let mut fields = FilenameFields::default();
    let mut rest = stem;
    if let Some(caps) = TRAILING_YEAR.captures(stem) {
        fields.year = parse_year(&caps[1], current_year);
        rest = &stem[..caps.get(0).unwrap().start()];
    }

    // "Initials. Surname - Title" puts the author first; it must be
    // checked before the generic dash shape, which would read the
    // initials as the title.
    let parts: Vec<&str> = rest.split(" - ").collect();
    if parts.len() == 2 && AUTHOR_FIRST.is_match(parts[0]) {
        fields.author = Some(parts[0].trim().to_string());
        fields.title = Some(parts[1].trim().to_string());
        return fields;
    }

    for shape in FILENAME_SHAPES.iter() {
        if let Some(caps) = shape.captures(stem) {
            return FilenameFields {
                title: Some(caps["title"].trim().to_string()),
                author: Some(caps["author"].trim().to_string()),
                year: parse_year(&caps["year"], current_year),
            };
        }
    }
    fields
}

/// `Author: X` / `By X` / `Written by X` lines in page text.
static CONTENT_AUTHOR: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:Author|By|Written by):\s*([A-Z][A-Za-z .\-]+)",
        r"([A-Z][A-Za-z .\-]+)\s+\d{4}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CONTENT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Published|Copyright)[:\s]+(\d{4})").unwrap());

fn title_from_content(text: &str) -> Option<String> {
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    if first_line.len() > 3 && first_line.len() < 200 {
        let cleaned = clean_title(first_line);
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
    }
    None
}

fn author_from_content(text: &str) -> Option<String> {
    for pattern in CONTENT_AUTHOR.iter() {
        if let Some(caps) = pattern.captures(text) {
            let candidate = caps[1].trim().to_string();
            if is_valid_author(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

fn year_from_content(text: &str, current_year: i32) -> Option<i32> {
    if let Some(caps) = CONTENT_YEAR.captures(text)
        && let Some(year) = parse_year(&caps[1], current_year)
    {
        return Some(year);
    }
    BARE_YEAR
        .find(text)
        .and_then(|m| parse_year(m.as_str(), current_year))
}

// ── Entry point ─────────────────────────────────────────────────────────

/// Extract title/author/year with per-field priority:
/// embedded metadata > filename shape > content heuristic > absent.
///
/// `metadata` keys are expected lowercased without the `/` prefix.
/// Invalid authors and out-of-range years are discarded, not reported.
pub fn extract(
    metadata: &BTreeMap<String, String>,
    first_page_text: &str,
    filename_stem: &str,
    current_year: i32,
) -> ExtractedFields {
    let from_name = parse_filename(filename_stem, current_year);

    let title = metadata
        .get("title")
        .map(|t| clean_title(t))
        .filter(|t| !t.is_empty())
        .or_else(|| from_name.title.as_deref().map(clean_title))
        .filter(|t| !t.is_empty())
        .or_else(|| title_from_content(first_page_text))
        .unwrap_or_else(|| clean_title(filename_stem));

    let author = metadata
        .get("author")
        .or_else(|| metadata.get("creator"))
        .map(|a| clean_metadata_value(a))
        .filter(|a| is_valid_author(a))
        .or_else(|| from_name.author.filter(|a| is_valid_author(a)))
        .or_else(|| author_from_content(first_page_text));

    let year = year_from_metadata(metadata, current_year)
        .or(from_name.year)
        .or_else(|| year_from_content(first_page_text, current_year));

    ExtractedFields {
        title,
        author,
        year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // =========================================================================
    // Filename shapes
    // =========================================================================

    #[test]
    fn dash_author_year_shape() {
        let fields = extract(&meta(&[]), "", "Clean Code - Robert Martin [2008]", 2024);
        assert_eq!(fields.title, "Clean Code");
        assert_eq!(fields.author.as_deref(), Some("Robert Martin"));
        assert_eq!(fields.year, Some(2008));
    }

    #[test]
    fn by_author_shape() {
        let fields = extract(&meta(&[]), "", "Refactoring by Martin Fowler [2018]", 2024);
        assert_eq!(fields.title, "Refactoring");
        assert_eq!(fields.author.as_deref(), Some("Martin Fowler"));
        assert_eq!(fields.year, Some(2018));
    }

    #[test]
    fn paren_author_shape() {
        let fields = extract(&meta(&[]), "", "TAOCP (Donald Knuth) [1997]", 2024);
        assert_eq!(fields.title, "TAOCP");
        assert_eq!(fields.author.as_deref(), Some("Donald Knuth"));
        assert_eq!(fields.year, Some(1997));
    }

    #[test]
    fn author_first_shape() {
        let fields = extract(
            &meta(&[]),
            "",
            "B. W. Kernighan - The C Programming Language [1988]",
            2024,
        );
        assert_eq!(fields.author.as_deref(), Some("B. W. Kernighan"));
        assert_eq!(fields.title, "The C Programming Language");
        assert_eq!(fields.year, Some(1988));
    }

    #[test]
    fn unparsable_filename_falls_back_to_stem() {
        let fields = extract(&meta(&[]), "", "some_random_scan", 2024);
        assert_eq!(fields.title, "some_random_scan");
        assert_eq!(fields.author, None);
        assert_eq!(fields.year, None);
    }

    // =========================================================================
    // Priority and metadata
    // =========================================================================

    #[test]
    fn metadata_beats_filename() {
        let fields = extract(
            &meta(&[
                ("title", "Structure and Interpretation"),
                ("author", "Harold Abelson"),
                ("creationdate", "D:19960701000000"),
            ]),
            "",
            "sicp - Someone Else [2001]",
            2024,
        );
        assert_eq!(fields.title, "Structure and Interpretation");
        assert_eq!(fields.author.as_deref(), Some("Harold Abelson"));
        assert_eq!(fields.year, Some(1996));
    }

    #[test]
    fn invalid_metadata_author_degrades_to_filename() {
        let fields = extract(
            &meta(&[("author", "Adobe Acrobat 9.0")]),
            "",
            "Clean Code - Robert Martin [2008]",
            2024,
        );
        assert_eq!(fields.author.as_deref(), Some("Robert Martin"));
    }

    #[test]
    fn content_heuristics_are_last_resort() {
        let fields = extract(
            &meta(&[]),
            "The Art of Testing\nWritten by: Glenford Myers\nCopyright 2011",
            "scan0001",
            2024,
        );
        assert_eq!(fields.title, "The Art of Testing");
        assert_eq!(fields.author.as_deref(), Some("Glenford Myers"));
        assert_eq!(fields.year, Some(2011));
    }

    // =========================================================================
    // Author validity
    // =========================================================================

    #[test]
    fn deny_list_rejects_software_authors() {
        assert!(!is_valid_author("Adobe InDesign"));
        assert!(!is_valid_author("unknown"));
        assert!(!is_valid_author("www.ebooks.net"));
        assert!(!is_valid_author("LaTeX with hyperref"));
    }

    #[test]
    fn structural_limits() {
        assert!(!is_valid_author("X"));
        assert!(!is_valid_author(&"a".repeat(101)));
        assert!(!is_valid_author("v1.2.3.4.5 build 20240101"));
        assert!(!is_valid_author("@@##!!"));
        assert!(is_valid_author("Robert C. Martin"));
        assert!(is_valid_author("Erich Gamma"));
    }

    // =========================================================================
    // Year bounds
    // =========================================================================

    #[test]
    fn year_out_of_range_is_absent() {
        let old = extract(&meta(&[]), "", "Old Tome - Somebody [1850]", 2024);
        assert_eq!(old.year, None);
        let future = extract(&meta(&[]), "", "Time Travel - Somebody [2199]", 2024);
        assert_eq!(future.year, None);
    }

    #[test]
    fn current_year_bound_is_injected() {
        let fields = extract(&meta(&[]), "", "Fresh - Somebody [2023]", 2022);
        assert_eq!(fields.year, None);
    }

    // =========================================================================
    // Title cleanup
    // =========================================================================

    #[test]
    fn title_cleanup_strips_fillers() {
        assert_eq!(
            clean_title("Algorithms [scan] (retail) Free PDF www.pirate.example"),
            "Algorithms"
        );
    }

    #[test]
    fn metadata_value_cleanup() {
        assert_eq!(
            clean_metadata_value("Design\u{0} Patterns\\374  --  GoF"),
            "Design Patterns -- GoF"
        );
    }

    #[test]
    fn everything_empty_never_fails() {
        let fields = extract(&meta(&[]), "", "", 2024);
        assert_eq!(fields.title, "");
        assert_eq!(fields.author, None);
        assert_eq!(fields.year, None);
    }
}
