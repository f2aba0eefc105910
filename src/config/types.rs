use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::RetryConfig;
use crate::http::HttpSettings;
use crate::scripting::ScriptLimits;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Contents of `pentoscan.yaml`. Every field is optional; unset values fall
/// back to the engine defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PentoscanConfig {
    pub http: Option<HttpConfig>,
    pub script: Option<ScriptConfig>,
    pub scan: Option<ScanSection>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub max_redirects: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScriptConfig {
    pub timeout_ms: Option<u64>,
    pub loop_iteration_limit: Option<u64>,
    pub recursion_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanSection {
    pub max_retries: Option<u32>,
    pub concurrency: Option<usize>,
    pub templates_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

/// Everything a single scan needs, resolved from defaults, file and flags.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub http: HttpSettings,
    pub script: ScriptLimits,
    pub retry: RetryConfig,
}

impl PentoscanConfig {
    pub fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::default();

        if let Some(http) = &self.http {
            if let Some(secs) = http.timeout_secs {
                config.http.timeout = Duration::from_secs(secs);
            }
            if let Some(ua) = &http.user_agent {
                config.http.user_agent = ua.clone();
            }
            if let Some(max) = http.max_redirects {
                config.http.max_redirects = max;
            }
        }

        if let Some(script) = &self.script {
            if let Some(ms) = script.timeout_ms {
                config.script.timeout = Duration::from_millis(ms);
            }
            if let Some(limit) = script.loop_iteration_limit {
                config.script.loop_iteration_limit = limit;
            }
            if let Some(limit) = script.recursion_limit {
                config.script.recursion_limit = limit;
            }
        }

        if let Some(retries) = self.scan.as_ref().and_then(|s| s.max_retries) {
            config.retry.max_retries = retries;
        }

        config
    }

    pub fn concurrency(&self) -> usize {
        self.scan
            .as_ref()
            .and_then(|s| s.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn output_dir(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.directory.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    pub fn templates_dir(&self) -> Option<&str> {
        self.scan.as_ref().and_then(|s| s.templates_dir.as_deref())
    }
}
