use std::path::Path;
use crate::errors::PentoscanError;
use super::types::PentoscanConfig;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<PentoscanConfig, PentoscanError> {
    if !path.exists() {
        return Err(PentoscanError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(PentoscanError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: PentoscanConfig = serde_yaml::from_str(&content)
        .map_err(|e| PentoscanError::Config(format!("{}: {}", path.display(), e)))?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Reject values that would make every scan fail or hang.
pub fn validate_conflicts(config: &PentoscanConfig) -> Result<(), PentoscanError> {
    if let Some(http) = &config.http {
        if http.timeout_secs == Some(0) {
            return Err(PentoscanError::Config("http.timeout_secs must be greater than 0".into()));
        }
    }

    if let Some(script) = &config.script {
        if script.timeout_ms == Some(0) {
            return Err(PentoscanError::Config("script.timeout_ms must be greater than 0".into()));
        }
        if script.loop_iteration_limit == Some(0) {
            return Err(PentoscanError::Config("script.loop_iteration_limit must be greater than 0".into()));
        }
    }

    if let Some(scan) = &config.scan {
        if scan.concurrency == Some(0) {
            return Err(PentoscanError::Config("scan.concurrency must be greater than 0".into()));
        }
        if scan.max_retries.is_some_and(|r| r > 5) {
            warn!(max_retries = ?scan.max_retries, "High retry count will multiply scan time against dead targets");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, ScanSection};
    use tempfile::TempDir;

    #[test]
    fn test_validate_conflicts_zero_timeout() {
        let config = PentoscanConfig {
            http: Some(HttpConfig {
                timeout_secs: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_zero_concurrency() {
        let config = PentoscanConfig {
            scan: Some(ScanSection {
                concurrency: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_empty_config() {
        let config = PentoscanConfig::default();
        assert!(validate_conflicts(&config).is_ok());
    }

    #[tokio::test]
    async fn test_parse_config_missing_file() {
        let err = parse_config(Path::new("/nonexistent/pentoscan.yaml")).await.unwrap_err();
        assert!(matches!(err, PentoscanError::Config(_)));
    }

    #[tokio::test]
    async fn test_parse_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pentoscan.yaml");
        std::fs::write(&path, "http:\n  timeout_secs: 5\n").unwrap();
        let config = parse_config(&path).await.unwrap();
        assert_eq!(config.http.unwrap().timeout_secs, Some(5));
    }
}
