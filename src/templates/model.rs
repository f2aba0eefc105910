use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// A validated template. Built only by [`super::validate`], never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub info: TemplateInfo,
    pub steps: Vec<HttpStep>,
    pub script: Option<String>,
    pub extractors: Vec<Extractor>,
    /// Exploit handler reference, e.g. `modules/lfi.py` or `lfi`.
    pub exploit: Option<String>,
}

impl Template {
    pub fn display_name(&self) -> &str {
        self.info.name.as_deref().unwrap_or(&self.id)
    }

    /// Number of requests a scan issues when nothing matches.
    pub fn request_count(&self) -> usize {
        self.steps.iter().map(|s| s.paths.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub severity: Option<Severity>,
    pub tags: BTreeSet<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpStep {
    pub method: Method,
    pub paths: Vec<String>,
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Word { words: Vec<String> },
    Status { codes: Vec<u16> },
    Regex { patterns: Vec<Pattern> },
}

impl Matcher {
    pub fn kind(&self) -> MatcherKind {
        match self {
            Self::Word { .. } => MatcherKind::Word,
            Self::Status { .. } => MatcherKind::Status,
            Self::Regex { .. } => MatcherKind::Regex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Word,
    Status,
    Regex,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Status => "status",
            Self::Regex => "regex",
        }
    }

    /// Name of the payload field that this matcher type requires.
    pub fn payload_field(&self) -> &'static str {
        match self {
            Self::Word => "words",
            Self::Status => "status",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extractor {
    pub kind: ExtractorKind,
    pub patterns: Vec<Pattern>,
}

/// A compiled regular expression that compares by its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Search semantics: a match anywhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }

    /// True when the pattern matches at offset 0. The leftmost match is
    /// reported first, so checking its start is enough.
    pub fn matches_start(&self, haystack: &str) -> bool {
        self.0.find(haystack).is_some_and(|m| m.start() == 0)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}
