use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{info, info_span, warn, Instrument};

use super::registry::ExploitRegistry;
use crate::errors::ModuleError;
use crate::models::{ExploitResult, ScanResult};
use crate::utils::truncation::truncate_error;

/// Runs the exploit handler named by a template after a vulnerable scan.
pub struct ExploitDispatcher {
    registry: ExploitRegistry,
}

impl Default for ExploitDispatcher {
    fn default() -> Self {
        Self::new(ExploitRegistry::with_builtin())
    }
}

impl ExploitDispatcher {
    pub fn new(registry: ExploitRegistry) -> Self {
        Self { registry }
    }

    /// `None` when the scan did not find the target vulnerable; the handler
    /// is never looked up in that case. Every other outcome, including an
    /// unknown handler or a panic inside one, comes back as an
    /// `ExploitResult`.
    pub async fn dispatch(&self, reference: &str, target: &str, scan: &ScanResult) -> Option<ExploitResult> {
        if !scan.vulnerable {
            return None;
        }
        let span = info_span!("exploit", module = %reference, template = %scan.template_id);
        Some(self.run(reference, target, scan).instrument(span).await)
    }

    async fn run(&self, reference: &str, target: &str, scan: &ScanResult) -> ExploitResult {
        let module = match self.registry.resolve(reference) {
            Ok(module) => module,
            Err(e) => return failed(e),
        };
        let name = module.name().to_string();
        let Some(runner) = module.runner() else {
            return failed(ModuleError::MissingRun(name));
        };

        info!(module = %name, target = %target, "Running exploit handler");
        match AssertUnwindSafe(runner.run(target, scan)).catch_unwind().await {
            Ok(Ok(details)) => {
                info!(module = %name, fields = details.len(), "Exploit handler finished");
                ExploitResult::succeeded(details)
            }
            Ok(Err(e)) => failed(e),
            Err(_) => failed(ModuleError::Panicked(name)),
        }
    }
}

fn failed(error: ModuleError) -> ExploitResult {
    warn!(error = %error, "Exploit handler failed");
    ExploitResult::failed(truncate_error(&error.to_string()))
}
