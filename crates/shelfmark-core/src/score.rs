//! Difficulty estimation and quality rating.
//!
//! Difficulty combines keyword tiers in the title, a topic complexity
//! bonus and page-count adjustments into one of four buckets. Rating is a
//! weighted blend of five sub-scores on top of a fixed base, optionally
//! spread by seeded jitter.

use std::hash::{DefaultHasher, Hash, Hasher};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::{Config, TopicAssignment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Moderate,
    Hard,
    Extreme,
}

impl Difficulty {
    /// Base contribution to the technical-depth sub-score.
    fn depth_base(self) -> f64 {
        match self {
            Difficulty::Easy => 0.25,
            Difficulty::Moderate => 0.5,
            Difficulty::Hard => 0.75,
            Difficulty::Extreme => 1.0,
        }
    }

    /// Reading pace in pages per day.
    pub fn pages_per_day(self) -> u32 {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Moderate => 25,
            Difficulty::Hard => 20,
            Difficulty::Extreme => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Difficulty ──────────────────────────────────────────────────────────

/// Keyword tiers scanned in order; the first tier with a title match
/// supplies its delta and stops the scan.
static TIERS: Lazy<Vec<(Vec<Regex>, i32)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
            .collect()
    };
    vec![
        (
            compile(&[
                r"beginner|basic|introduction|primer|fundamental",
                r"getting started|learn|simple|quick start",
                r"practical guide|hands-on|tutorial|101",
                r"essentials|fundamentals|basics",
            ]),
            -2,
        ),
        (
            compile(&[
                r"intermediate|professional|practical|handbook",
                r"guide|cookbook|recipes|patterns",
                r"development|programming|engineering",
            ]),
            0,
        ),
        (
            compile(&[
                r"advanced|mastering|expert|deep dive",
                r"complete|comprehensive|definitive|in-depth",
                r"architecture|design|internals",
            ]),
            2,
        ),
        (
            compile(&[
                r"theoretical|theory|academic|research",
                r"distributed|concurrent|parallel|quantum",
                r"compiler|kernel|formal methods",
            ]),
            4,
        ),
    ]
});

/// Complexity bonus by (topic, subtopic); `None` matches any subtopic.
/// First matching entry wins.
static COMPLEXITY_BONUS: &[(&str, Option<&str>, i32)] = &[
    ("Computer Science", Some("Theory"), 3),
    ("Computer Science", Some("Algorithms"), 2),
    ("Computer Science", Some("Operating Systems"), 2),
    ("Artificial Intelligence", Some("Machine Learning"), 2),
    ("Software Engineering", Some("Architecture"), 2),
    ("Programming Languages", Some("C/C++"), 2),
    ("Programming Languages", Some("Rust"), 1),
    ("Web Development", Some("Security"), 1),
    ("Leadership & Self-Development", None, -2),
];

/// Bucket a record into a difficulty level from its title, primary topic
/// and page count.
pub fn estimate_difficulty(title: &str, topic: &TopicAssignment, page_count: u32) -> Difficulty {
    let mut score = 0i32;

    for (patterns, delta) in TIERS.iter() {
        if patterns.iter().any(|p| p.is_match(title)) {
            score += delta;
            break;
        }
    }

    for (t, sub, bonus) in COMPLEXITY_BONUS {
        if *t == topic.topic && sub.is_none_or(|s| s == topic.subtopic) {
            score += bonus;
            break;
        }
    }

    if page_count > 600 {
        score += 2;
    } else if page_count > 400 {
        score += 1;
    } else if page_count < 200 {
        score -= 1;
    }

    match score {
        i32::MIN..=-2 => Difficulty::Easy,
        -1..=1 => Difficulty::Moderate,
        2..=3 => Difficulty::Hard,
        _ => Difficulty::Extreme,
    }
}

// ── Rating ──────────────────────────────────────────────────────────────

const RATING_BASE: f64 = 6.0;
const JITTER_SPREAD: f64 = 0.3;

const W_RECENCY: f64 = 0.15;
const W_COMPREHENSIVENESS: f64 = 0.25;
const W_AUTHORITY: f64 = 0.20;
const W_TECH_DEPTH: f64 = 0.25;
const W_PRACTICAL: f64 = 0.15;

static ACADEMIC_KEYWORDS: &[&str] =
    &["university", "research", "theorem", "proof", "journal", "acm", "ieee"];
static TECHNICAL_KEYWORDS: &[&str] = &[
    "implementation",
    "algorithm",
    "architecture",
    "protocol",
    "optimization",
    "concurrency",
    "compiler",
];
static PRACTICAL_KEYWORDS: &[&str] =
    &["example", "exercise", "code", "hands-on", "project", "tutorial", "practice"];

fn keyword_hits(haystack_lower: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .map(|k| haystack_lower.matches(k).count())
        .sum()
}

fn recency(year: Option<i32>, current_year: i32) -> f64 {
    let Some(year) = year else { return 0.0 };
    match current_year.saturating_sub(year) {
        ..=1 => 1.0,
        2..=3 => 0.8,
        4..=5 => 0.6,
        6..=8 => 0.4,
        9..=10 => 0.2,
        _ => 0.0,
    }
}

fn comprehensiveness(page_count: u32) -> f64 {
    match page_count {
        800.. => 1.0,
        500.. => 0.8,
        300.. => 0.6,
        150.. => 0.4,
        1.. => 0.2,
        0 => 0.0,
    }
}

/// Compute the rating in `[1.0, 10.0]`, rounded to one decimal.
///
/// `content` is the probe text for keyword sub-scores (page text plus
/// sample); `publisher_hint` carries any embedded producer/publisher
/// metadata. Jitter, when a seed is configured, is derived from the seed
/// and the record path so it is stable per file regardless of batch order.
pub fn calculate_rating(
    path: &str,
    year: Option<i32>,
    page_count: u32,
    difficulty: Difficulty,
    content: &str,
    publisher_hint: &str,
    config: &Config,
) -> f64 {
    let content_lower = content.to_lowercase();
    let publisher_lower = publisher_hint.to_lowercase();

    let publisher_match = config
        .publishers
        .iter()
        .any(|p| publisher_lower.contains(p.as_str()) || content_lower.contains(p.as_str()));
    let authority = ((if publisher_match { 0.6 } else { 0.0 })
        + keyword_hits(&content_lower, ACADEMIC_KEYWORDS).min(4) as f64 * 0.1)
        .min(1.0);

    let technical_depth = (difficulty.depth_base()
        + keyword_hits(&content_lower, TECHNICAL_KEYWORDS) as f64 * 0.05)
        .min(1.0);

    let practical_value = (keyword_hits(&content_lower, PRACTICAL_KEYWORDS) as f64 * 0.1).min(1.0);

    let weighted = W_RECENCY * recency(year, config.current_year)
        + W_COMPREHENSIVENESS * comprehensiveness(page_count)
        + W_AUTHORITY * authority
        + W_TECH_DEPTH * technical_depth
        + W_PRACTICAL * practical_value;

    let mut rating = RATING_BASE + weighted * 2.0;

    if let Some(seed) = config.jitter_seed {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let mut rng = fastrand::Rng::with_seed(seed ^ hasher.finish());
        rating += rng.f64() * (2.0 * JITTER_SPREAD) - JITTER_SPREAD;
    }

    (rating.clamp(1.0, 10.0) * 10.0).round() / 10.0
}

/// Days to finish the book at the difficulty's pace; unknown page counts
/// yield no estimate.
pub fn reading_time_days(page_count: u32, difficulty: Difficulty) -> Option<u32> {
    if page_count == 0 {
        return None;
    }
    Some(page_count.div_ceil(difficulty.pages_per_day()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(t: &str, s: &str) -> TopicAssignment {
        TopicAssignment::new(t, s)
    }

    // =========================================================================
    // Difficulty
    // =========================================================================

    #[test]
    fn mastering_distributed_systems_is_hard() {
        // "mastering" +2, Architecture bonus +2, 0 pages -1 => 3 => hard.
        let difficulty = estimate_difficulty(
            "Mastering Distributed Systems",
            &topic("Software Engineering", "Architecture"),
            0,
        );
        assert!(difficulty >= Difficulty::Hard);
    }

    #[test]
    fn first_tier_match_stops_the_scan() {
        // Both "beginner" (easy, -2) and "advanced" (hard, +2) appear;
        // only the easy tier counts.
        let difficulty = estimate_difficulty(
            "Beginner to Advanced Crochet",
            &TopicAssignment::fallback(),
            250,
        );
        assert_eq!(difficulty, Difficulty::Easy);
    }

    #[test]
    fn theory_with_length_is_extreme() {
        // extreme tier +4, Theory bonus +3, >600 pages +2 => 9.
        let difficulty = estimate_difficulty(
            "Theory of Computation",
            &topic("Computer Science", "Theory"),
            700,
        );
        assert_eq!(difficulty, Difficulty::Extreme);
    }

    #[test]
    fn leadership_titles_skew_easy() {
        // moderate tier 0, topic bonus -2, short -1 => -3 => easy.
        let difficulty = estimate_difficulty(
            "The Manager's Handbook",
            &topic("Leadership & Self-Development", "Management"),
            150,
        );
        assert_eq!(difficulty, Difficulty::Easy);
    }

    #[test]
    fn no_signals_is_moderate() {
        let difficulty = estimate_difficulty("Crochet", &TopicAssignment::fallback(), 250);
        assert_eq!(difficulty, Difficulty::Moderate);
    }

    // =========================================================================
    // Rating
    // =========================================================================

    #[test]
    fn known_value_without_jitter() {
        // recency 1.0, comprehensiveness 1.0, authority 0.6 (publisher),
        // depth 0.5, practical 0.0 => 6 + 2*0.645 = 7.29 => 7.3.
        let config = Config::default();
        let rating = calculate_rating(
            "a.pdf",
            Some(2023),
            900,
            Difficulty::Moderate,
            "Published by O'Reilly Media.",
            "",
            &config,
        );
        assert_eq!(rating, 7.3);
    }

    #[test]
    fn empty_record_stays_in_bounds() {
        let config = Config::default();
        let rating = calculate_rating("x.pdf", None, 0, Difficulty::Moderate, "", "", &config);
        assert_eq!(rating, 6.3); // base 6.0 + 2 * 0.25 * 0.5 depth base
        assert!((1.0..=10.0).contains(&rating));
    }

    #[test]
    fn rating_never_escapes_bounds() {
        let config = Config::default();
        let content = "example exercise code tutorial practice project ".repeat(50)
            + &"university research theorem acm ieee ".repeat(20)
            + &"implementation algorithm architecture ".repeat(40)
            + "O'Reilly";
        let rating = calculate_rating(
            "max.pdf",
            Some(2024),
            1200,
            Difficulty::Extreme,
            &content,
            "O'Reilly",
            &config,
        );
        assert!((1.0..=10.0).contains(&rating));
        assert_eq!(rating, 8.0); // every sub-score saturated at 1.0
    }

    #[test]
    fn jitter_is_seed_stable_and_bounded() {
        let base = Config::default();
        let seeded = Config {
            jitter_seed: Some(42),
            ..Config::default()
        };
        let plain = calculate_rating("b.pdf", Some(2020), 350, Difficulty::Hard, "", "", &base);
        let first = calculate_rating("b.pdf", Some(2020), 350, Difficulty::Hard, "", "", &seeded);
        let second = calculate_rating("b.pdf", Some(2020), 350, Difficulty::Hard, "", "", &seeded);
        assert_eq!(first, second);
        // Jitter is bounded by the spread plus one-decimal rounding slack.
        assert!((first - plain).abs() <= JITTER_SPREAD + 0.1 + f64::EPSILON);
    }

    #[test]
    fn jitter_depends_on_path_not_order() {
        let seeded = Config {
            jitter_seed: Some(7),
            ..Config::default()
        };
        let a = calculate_rating("a.pdf", Some(2020), 350, Difficulty::Hard, "", "", &seeded);
        let b = calculate_rating("b.pdf", Some(2020), 350, Difficulty::Hard, "", "", &seeded);
        let a_again = calculate_rating("a.pdf", Some(2020), 350, Difficulty::Hard, "", "", &seeded);
        assert_eq!(a, a_again);
        assert!((1.0..=10.0).contains(&a) && (1.0..=10.0).contains(&b));
    }

    // =========================================================================
    // Reading time
    // =========================================================================

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_days(100, Difficulty::Easy), Some(4));
        assert_eq!(reading_time_days(100, Difficulty::Extreme), Some(7));
        assert_eq!(reading_time_days(1, Difficulty::Hard), Some(1));
        assert_eq!(reading_time_days(0, Difficulty::Moderate), None);
    }
}
