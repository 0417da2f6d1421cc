//! Topic/subtopic pattern tables: the built-in taxonomy and the TOML
//! override loader, plus the advisory validation used by the CLI.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::CoreError;

/// One subtopic with its keyword patterns, compiled case-insensitively.
#[derive(Debug, Clone)]
pub struct SubtopicPatterns {
    pub name: String,
    pub patterns: Vec<Regex>,
}

/// One topic with its ordered subtopics.
#[derive(Debug, Clone)]
pub struct TopicEntry {
    pub name: String,
    pub subtopics: Vec<SubtopicPatterns>,
}

/// The full ordered taxonomy. Order is significant: earlier topics win
/// score ties, and the first subtopic is the topic's default.
#[derive(Debug, Clone)]
pub struct TopicPatterns {
    pub topics: Vec<TopicEntry>,
}

/// An advisory problem found while validating a pattern set.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternIssue {
    EmptyTopic { topic: String },
    EmptySubtopic { topic: String, subtopic: String },
    BadRegex { topic: String, subtopic: String, pattern: String, error: String },
    /// Compiles, but matches the empty string and would hit every document.
    Broad { topic: String, subtopic: String, pattern: String },
}

impl std::fmt::Display for PatternIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternIssue::EmptyTopic { topic } => {
                write!(f, "topic '{topic}' has no subtopics")
            }
            PatternIssue::EmptySubtopic { topic, subtopic } => {
                write!(f, "subtopic '{topic}/{subtopic}' has no patterns")
            }
            PatternIssue::BadRegex { topic, subtopic, pattern, error } => {
                write!(f, "invalid pattern '{pattern}' in '{topic}/{subtopic}': {error}")
            }
            PatternIssue::Broad { topic, subtopic, pattern } => {
                write!(
                    f,
                    "pattern '{pattern}' in '{topic}/{subtopic}' matches the empty string"
                )
            }
        }
    }
}

static BUILTIN: &[(&str, &[(&str, &[&str])])] = &[
    (
        "Programming Languages",
        &[
            ("Python", &["python", "django", "flask", "pandas", "numpy"]),
            ("JavaScript", &["javascript", r"\bjs\b", "node", "react", "vue", "angular", "typescript"]),
            ("Java", &["java", "spring", "jvm"]),
            ("C/C++", &["c\\+\\+", "cpp", r"\bc\b", "systems programming"]),
            ("Go", &["golang", r"\bgo\b"]),
            ("Rust", &["rust"]),
            ("Other Languages", &["ruby", "php", "swift", "kotlin", "scala", "haskell", "erlang", "elixir"]),
        ],
    ),
    (
        "Software Engineering",
        &[
            ("Architecture", &["architecture", "design patterns", "microservices", "distributed", "scalability"]),
            ("Best Practices", &["clean code", "refactoring", "code quality", "craftsmanship", "pragmatic"]),
            ("Testing", &["testing", "tdd", "test driven", "unit test", "quality assurance"]),
            ("DevOps", &["devops", "docker", "kubernetes", "ci/cd", "deployment", "infrastructure"]),
            ("Agile", &["agile", "scrum", "kanban", "lean", "sprint"]),
        ],
    ),
    (
        "Computer Science",
        &[
            ("Algorithms", &["algorithm", "data structure", "complexity", "sorting", "searching"]),
            ("Theory", &["theory", "computation", "automata", "formal", "discrete math"]),
            ("Operating Systems", &["operating system", "linux", "unix", "windows", "kernel"]),
            ("Networks", &["network", "tcp", "protocol", "socket"]),
            ("Databases", &["database", "sql", "nosql", "mongodb", "postgresql", "mysql"]),
        ],
    ),
    (
        "Artificial Intelligence",
        &[
            ("Machine Learning", &["machine learning", r"\bml\b", "neural", "deep learning", "tensorflow", "pytorch"]),
            ("Data Science", &["data science", "analytics", "statistics", "visualization"]),
            ("NLP", &["natural language", "nlp", "text mining", "linguistics"]),
            ("Computer Vision", &["computer vision", "image", "opencv"]),
            ("AI General", &["artificial intelligence", r"\bai\b", "expert system"]),
        ],
    ),
    (
        "Web Development",
        &[
            ("Frontend", &["frontend", "front-end", "html", "css", "ui", "ux"]),
            ("Backend", &["backend", "back-end", "server", "api", "rest", "graphql"]),
            ("Full Stack", &["full stack", "fullstack", "web development"]),
            ("Security", &["security", "penetration", "hacking", "cryptography", "vulnerability"]),
        ],
    ),
    (
        "System & Infrastructure",
        &[
            ("Cloud", &["cloud", "aws", "azure", "gcp", "serverless"]),
            ("Performance", &["performance", "optimization", "scaling", "tuning"]),
            ("Monitoring", &["monitoring", "logging", "observability", "metrics"]),
        ],
    ),
    (
        "Leadership & Self-Development",
        &[
            ("Management", &["management", "leadership", "team", "manager"]),
            ("Career", &["career", "interview", "resume", "job"]),
            ("Productivity", &["productivity", "habits", "focus", "time management"]),
        ],
    ),
];

static BUILTIN_COMPILED: Lazy<TopicPatterns> = Lazy::new(|| {
    let topics = BUILTIN
        .iter()
        .map(|(topic, subs)| TopicEntry {
            name: (*topic).to_string(),
            subtopics: subs
                .iter()
                .map(|(sub, pats)| SubtopicPatterns {
                    name: (*sub).to_string(),
                    patterns: pats
                        .iter()
                        .map(|p| {
                            Regex::new(&format!("(?i){p}")).unwrap_or_else(|e| {
                                panic!("builtin pattern '{p}' must compile: {e}")
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    TopicPatterns { topics }
});

impl TopicPatterns {
    /// The built-in seven-topic taxonomy.
    pub fn builtin() -> Self {
        BUILTIN_COMPILED.clone()
    }

    /// Parse a pattern set from TOML of the shape:
    ///
    /// ```toml
    /// [topics."Programming Languages"]
    /// Python = ["python", "django"]
    /// ```
    ///
    /// Structural problems are hard errors; individual bad regexes are
    /// skipped and reported through [`TopicPatterns::validate`] instead,
    /// so one typo does not take the whole taxonomy down.
    pub fn from_toml(text: &str) -> Result<Self, CoreError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| CoreError::PatternConfig(e.to_string()))?;
        let Some(topics_value) = table.get("topics") else {
            return Err(CoreError::PatternConfig("missing [topics] table".into()));
        };
        let topics_table = topics_value
            .as_table()
            .ok_or_else(|| CoreError::PatternConfig("[topics] must be a table".into()))?;

        let mut topics = Vec::new();
        for (topic_name, subs_value) in topics_table {
            let subs_table = subs_value.as_table().ok_or_else(|| {
                CoreError::PatternConfig(format!("topic '{topic_name}' must be a table"))
            })?;
            let mut subtopics = Vec::new();
            for (sub_name, patterns_value) in subs_table {
                let list = patterns_value.as_array().ok_or_else(|| {
                    CoreError::PatternConfig(format!(
                        "subtopic '{topic_name}.{sub_name}' must be an array of strings"
                    ))
                })?;
                let mut patterns = Vec::new();
                for item in list {
                    let pat = item.as_str().ok_or_else(|| {
                        CoreError::PatternConfig(format!(
                            "subtopic '{topic_name}.{sub_name}' contains a non-string pattern"
                        ))
                    })?;
                    if let Ok(re) = Regex::new(&format!("(?i){pat}")) {
                        patterns.push(re);
                    } else {
                        tracing::warn!(topic = %topic_name, subtopic = %sub_name, pattern = %pat,
                            "skipping invalid pattern");
                    }
                }
                subtopics.push(SubtopicPatterns { name: sub_name.clone(), patterns });
            }
            topics.push(TopicEntry { name: topic_name.clone(), subtopics });
        }
        Ok(TopicPatterns { topics })
    }

    /// Advisory validation over the *source* TOML, reporting every problem
    /// rather than stopping at the first.
    pub fn validate_toml(text: &str) -> Result<Vec<PatternIssue>, CoreError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| CoreError::PatternConfig(e.to_string()))?;
        let Some(topics_table) = table.get("topics").and_then(|v| v.as_table()) else {
            return Err(CoreError::PatternConfig("missing [topics] table".into()));
        };

        let mut issues = Vec::new();
        for (topic_name, subs_value) in topics_table {
            let Some(subs_table) = subs_value.as_table() else {
                return Err(CoreError::PatternConfig(format!(
                    "topic '{topic_name}' must be a table"
                )));
            };
            if subs_table.is_empty() {
                issues.push(PatternIssue::EmptyTopic { topic: topic_name.clone() });
            }
            for (sub_name, patterns_value) in subs_table {
                let patterns = patterns_value.as_array().cloned().unwrap_or_default();
                if patterns.is_empty() {
                    issues.push(PatternIssue::EmptySubtopic {
                        topic: topic_name.clone(),
                        subtopic: sub_name.clone(),
                    });
                }
                for item in &patterns {
                    let Some(pat) = item.as_str() else { continue };
                    match Regex::new(&format!("(?i){pat}")) {
                        Err(e) => issues.push(PatternIssue::BadRegex {
                            topic: topic_name.clone(),
                            subtopic: sub_name.clone(),
                            pattern: pat.to_string(),
                            error: e.to_string(),
                        }),
                        Ok(re) if re.is_match("") => issues.push(PatternIssue::Broad {
                            topic: topic_name.clone(),
                            subtopic: sub_name.clone(),
                            pattern: pat.to_string(),
                        }),
                        Ok(_) => {}
                    }
                }
            }
        }
        Ok(issues)
    }
}
