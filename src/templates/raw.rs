use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// A scalar or a list of scalars. Template authors write `status: 200` as
/// often as `status: [200, 204]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

/// Template document exactly as parsed, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub info: RawInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<Vec<RawStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript: Option<RawScript>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extractors: Vec<RawExtractor>,
    #[serde(alias = "exploit_module", skip_serializing_if = "Option::is_none")]
    pub exploit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Either a list or a comma-separated string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(alias = "paths", skip_serializing_if = "Option::is_none")]
    pub path: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchers: Option<Vec<RawMatcher>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawMatcher {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OneOrMany<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<OneOrMany<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawExtractor {
    #[serde(rename = "type", default = "default_extractor_kind")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<OneOrMany<String>>,
}

fn default_extractor_kind() -> String {
    "regex".to_string()
}

/// Script source, either inline or as the `[{code: ...}]` block list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawScript {
    Source(String),
    Blocks(Vec<RawScriptBlock>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawScriptBlock {
    pub code: String,
}

impl RawScript {
    /// First non-blank source, if any.
    pub fn into_source(self) -> Option<String> {
        match self {
            Self::Source(s) => Some(s),
            Self::Blocks(blocks) => blocks.into_iter().next().map(|b| b.code),
        }
        .filter(|s| !s.trim().is_empty())
    }
}
