use serde::{Deserialize, Serialize};

use super::finding::{Finding, Severity};
use crate::templates::MatcherKind;

/// Identifies the (step, path, matcher) combination that triggered a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedMatcher {
    /// Index of the step in the template's `http` list.
    pub step: usize,
    /// The path template that was requested.
    pub path: String,
    /// Index of the matcher within the step.
    pub index: usize,
    #[serde(rename = "type")]
    pub matcher_type: MatcherKind,
}

/// Outcome of one template run against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub template_id: String,
    pub template_name: Option<String>,
    pub severity: Option<Severity>,
    /// Base URL the scan was started with.
    pub target_url: String,
    /// Method of the triggering request, or of the last request sent.
    pub method: String,
    /// Status of the triggering response, or of the last successful one.
    pub status_code: Option<u16>,
    pub response_length: Option<usize>,
    pub vulnerable: bool,
    /// Full URL of the triggering request.
    pub matched_url: Option<String>,
    pub matched: Option<MatchedMatcher>,
    #[serde(default)]
    pub extracted: Vec<Finding>,
    pub requests_sent: usize,
    pub failed_requests: usize,
    pub duration_ms: u64,
}

impl ScanResult {
    pub fn matched_matcher_type(&self) -> Option<MatcherKind> {
        self.matched.as_ref().map(|m| m.matcher_type)
    }

    /// Returns the total number of extraction findings.
    pub fn total_findings(&self) -> usize {
        self.extracted.len()
    }
}
