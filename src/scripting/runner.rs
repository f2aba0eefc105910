use std::sync::Arc;

use super::sandbox::{ScriptContext, ScriptEngine};
use crate::http::ResponseView;
use crate::models::Finding;
use crate::templates::{Extractor, ExtractorKind, Template};
use tracing::{debug, warn};

/// Runs a template's extraction script against a response and filters the
/// returned candidates through the template's extractors.
#[derive(Clone)]
pub struct ScriptRunner {
    engine: Arc<dyn ScriptEngine>,
}

impl ScriptRunner {
    pub fn new(engine: Arc<dyn ScriptEngine>) -> Self {
        Self { engine }
    }

    /// `None` when the template has no script or the script failed. Script
    /// failures are logged and never surface to the caller.
    pub async fn run(&self, template: &Template, response: &ResponseView) -> Option<Vec<Finding>> {
        let source = template.script.as_deref()?;
        let context = ScriptContext::from_response(&template.id, response);

        match self.engine.evaluate(source, &context).await {
            Ok(candidates) => {
                let findings = apply_extractors(&template.id, &candidates, &template.extractors);
                debug!(
                    template = %template.id,
                    engine = self.engine.engine_name(),
                    candidates = candidates.len(),
                    findings = findings.len(),
                    "Extraction script finished"
                );
                Some(findings)
            }
            Err(e) => {
                warn!(template = %template.id, url = %response.url, error = %e, "Extraction script failed");
                None
            }
        }
    }
}

/// One finding per (candidate, extractor pattern) pair where the pattern
/// matches at the start of the candidate.
pub fn apply_extractors(template_id: &str, candidates: &[String], extractors: &[Extractor]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for candidate in candidates {
        for extractor in extractors {
            match extractor.kind {
                ExtractorKind::Regex => {
                    for pattern in &extractor.patterns {
                        if pattern.matches_start(candidate) {
                            findings.push(Finding {
                                template_id: template_id.to_string(),
                                value: candidate.clone(),
                                pattern: pattern.as_str().to_string(),
                            });
                        }
                    }
                }
            }
        }
    }
    findings
}
