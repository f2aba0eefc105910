use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::PentoscanError;
use crate::models::{ExploitResult, ScanResult};

const MAX_SUFFIX: u32 = 1000;

/// What gets persisted for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub scan: ScanResult,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploit: Option<ExploitResult>,
}

impl ResultRecord {
    pub fn new(scan: ScanResult, exploit: Option<ExploitResult>) -> Self {
        Self {
            scan,
            timestamp: Utc::now(),
            exploit,
        }
    }
}

/// Writes one pretty-printed JSON file per record into an output directory.
/// Existing files are never overwritten.
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `record` as `<template_id>_<YYYYmmdd_HHMMSS_mmm>.json`,
    /// adding `_<n>` before the extension if that name is taken.
    pub async fn save(&self, record: &ResultRecord) -> Result<PathBuf, PentoscanError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(record)?;
        let stem = format!(
            "{}_{}",
            sanitize(&record.scan.template_id),
            record.timestamp.format("%Y%m%d_%H%M%S_%3f")
        );

        for attempt in 0..MAX_SUFFIX {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = self.dir.join(name);
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    file.write_all(json.as_bytes()).await?;
                    file.flush().await?;
                    info!(path = %path.display(), "Results saved");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Result file exists, trying next suffix");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PentoscanError::Internal(format!(
            "no free result file name for {} in {}",
            stem,
            self.dir.display()
        )))
    }

    pub async fn load(path: &Path) -> Result<ResultRecord, PentoscanError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Keep template ids usable as file names.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
