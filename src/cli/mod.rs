pub mod commands;
pub mod list;
pub mod scan;
pub mod validate;

pub use commands::{Cli, Commands};

use std::path::{Path, PathBuf};

use crate::config::{parse_config, PentoscanConfig};
use crate::errors::PentoscanError;

const DEFAULT_CONFIG_FILE: &str = "pentoscan.yaml";

/// Load the explicit config file, or `./pentoscan.yaml` when it exists.
/// No file at all means defaults.
pub(crate) async fn load_config(explicit: Option<&str>) -> Result<PentoscanConfig, PentoscanError> {
    match explicit {
        Some(path) => parse_config(&PathBuf::from(path)).await,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => parse_config(Path::new(DEFAULT_CONFIG_FILE)).await,
        None => Ok(PentoscanConfig::default()),
    }
}
