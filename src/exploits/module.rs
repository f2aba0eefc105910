use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ModuleError;
use crate::models::ScanResult;

/// A post-scan follow-up handler known to the registry.
pub trait ExploitModule: Send + Sync {
    fn name(&self) -> &str;

    /// The run capability. A module without one is registered but cannot
    /// be dispatched.
    fn runner(&self) -> Option<&dyn ExploitRunner>;
}

#[async_trait]
pub trait ExploitRunner: Send + Sync {
    /// Follow up on a vulnerable scan result. The returned map becomes the
    /// `details` of the exploit result.
    async fn run(&self, target: &str, scan: &ScanResult) -> Result<Map<String, Value>, ModuleError>;
}
