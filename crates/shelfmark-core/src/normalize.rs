use once_cell::sync::Lazy;
use regex::Regex;

/// Bracketed or parenthesized spans, non-greedy.
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[(].*?[\])]").unwrap());

/// Punctuation except hyphens (hyphens are kept for compound words until
/// run-collapsing turns them into spaces).
static PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());

/// Runs of whitespace and/or hyphens.
static RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Leading articles/prefixes stripped before comparison. Order matters:
/// longer prefixes are tried first so "hands-on" is not split by "a".
const PREFIXES: &[&str] = &["hands on", "hands-on", "the", "a", "an"];

/// Trailing noise suffixes stripped before comparison.
const SUFFIXES: &[&str] = &["pdf", "ebook", "book", "edition", "ed"];

/// Canonicalize a title or name for comparison.
///
/// Deterministic and idempotent: lowercase, strip leading articles, drop
/// bracketed spans and punctuation, collapse whitespace/hyphen runs, strip
/// trailing noise suffixes. The result is never shown to the user.
pub fn normalize_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut name = name.to_lowercase();
    name = BRACKETED.replace_all(&name, "").into_owned();
    name = PUNCT.replace_all(&name, "").into_owned();
    name = RUNS.replace_all(&name, " ").trim().to_string();

    // Strip prefixes/suffixes to a fixpoint so the function is idempotent
    // even for stacked articles ("the a team").
    loop {
        let before = name.len();
        for prefix in PREFIXES {
            if let Some(rest) = name.strip_prefix(&format!("{prefix} ")) {
                name = rest.trim_start().to_string();
            }
        }
        for suffix in SUFFIXES {
            if let Some(rest) = name.strip_suffix(&format!(" {suffix}")) {
                name = rest.trim_end().to_string();
            }
        }
        if name.len() == before {
            break;
        }
    }

    name
}
