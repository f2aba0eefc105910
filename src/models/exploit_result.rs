use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a post-scan exploit handler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploitResult {
    pub success: bool,
    /// Handler-defined evidence.
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExploitResult {
    pub fn succeeded(details: Map<String, Value>) -> Self {
        Self {
            success: true,
            details,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            details: Map::new(),
            error: Some(error.into()),
        }
    }
}
