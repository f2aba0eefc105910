use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::state::{ScanState, ScanTracker};
use crate::config::ScanConfig;
use crate::errors::{with_retry, EngineError, ScanError};
use crate::http::{join_url, parse_target, RequestExecutor, ResponseView};
use crate::matchers::evaluate_step;
use crate::models::{Finding, MatchedMatcher, ScanResult};
use crate::scripting::{BoaEngine, ScriptEngine, ScriptRunner};
use crate::templates::{HttpStep, Template};

/// Runs templates against targets. Holds no per-scan state, so one
/// `Scanner` can serve any number of sequential or concurrent scans.
pub struct Scanner {
    config: ScanConfig,
    script_engine: Arc<dyn ScriptEngine>,
    cancel_token: CancellationToken,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        let script_engine: Arc<dyn ScriptEngine> = Arc::new(BoaEngine::new(config.script.clone()));
        Self {
            config,
            script_engine,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replace the scanner's cancel token with an external one (e.g. a Ctrl-C handler).
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn with_script_engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.script_engine = engine;
        self
    }

    /// Run `template` against `target`.
    ///
    /// Steps and paths are requested strictly in declaration order. The
    /// first (step, path, matcher) hit ends the scan. Failed requests are
    /// logged and skipped. Only an unusable target or cancellation ends the
    /// scan with an error, and no partial result is returned in that case.
    pub async fn scan(&self, target: &str, template: &Template) -> Result<ScanResult, EngineError> {
        let span = info_span!("scan", template = %template.id, target = %target);
        self.run(target, template).instrument(span).await
    }

    async fn run(&self, target: &str, template: &Template) -> Result<ScanResult, EngineError> {
        let started = Instant::now();
        let base = parse_target(target).map_err(|e| EngineError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
        let executor = RequestExecutor::new(&self.config.http).map_err(|e| EngineError::Setup(e.to_string()))?;
        let runner = ScriptRunner::new(self.script_engine.clone());

        let mut tracker = ScanTracker::new();
        let mut progress = Progress::new(template);
        info!(steps = template.steps.len(), requests = template.request_count(), "Scan started");

        for (step_index, step) in template.steps.iter().enumerate() {
            for (path_index, path) in step.paths.iter().enumerate() {
                if self.cancel_token.is_cancelled() {
                    return Err(self.cancelled(template));
                }
                tracker.advance(ScanState::StepIterating {
                    step: step_index,
                    path: path_index,
                });

                let Some(response) = self.request(&executor, base.as_str(), step, path, &mut progress, template).await?
                else {
                    continue;
                };

                // Extract, then match.
                if let Some(findings) = runner.run(template, &response).await {
                    progress.extracted.extend(findings);
                }
                progress.record_response(step, &response);

                if let Some(index) = evaluate_step(&step.matchers, &response) {
                    tracker.advance(ScanState::Vulnerable);
                    let matched = MatchedMatcher {
                        step: step_index,
                        path: path.clone(),
                        index,
                        matcher_type: step.matchers[index].kind(),
                    };
                    info!(
                        step = step_index,
                        path = %path,
                        matcher = index,
                        matcher_type = %matched.matcher_type,
                        status = response.status,
                        elapsed_ms = response.elapsed_ms,
                        "Template matched"
                    );
                    let result = progress.finish(target, Some((matched, response.url.clone())), started);
                    tracker.advance(ScanState::Done);
                    return Ok(result);
                }
                debug!(
                    step = step_index,
                    path = %path,
                    status = response.status,
                    elapsed_ms = response.elapsed_ms,
                    "No matcher hit"
                );
            }
        }

        tracker.advance(ScanState::Completed);
        let result = progress.finish(target, None, started);
        tracker.advance(ScanState::Done);
        info!(
            state = %tracker.state(),
            requests = result.requests_sent,
            failed = result.failed_requests,
            findings = result.extracted.len(),
            "Scan completed, not vulnerable"
        );
        Ok(result)
    }

    /// One (step, path) request. `Ok(None)` means the request failed and the
    /// scan should move on.
    async fn request(
        &self,
        executor: &RequestExecutor,
        base: &str,
        step: &HttpStep,
        path: &str,
        progress: &mut Progress,
        template: &Template,
    ) -> Result<Option<ResponseView>, EngineError> {
        progress.method = step.method.to_string();

        let url = match join_url(base, path) {
            Ok(url) => url,
            Err(e) => {
                warn!(path = %path, error = %e, "Skipping path");
                progress.failed_requests += 1;
                return Ok(None);
            }
        };

        progress.requests_sent += 1;
        let send = with_retry("request", &self.config.retry, || {
            executor.send(step.method.clone(), url.clone())
        });

        let outcome: Result<ResponseView, ScanError> = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => return Err(self.cancelled(template)),
            outcome = send => outcome,
        };

        match outcome {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                warn!(url = %url, error = %e, error_type = e.classify().error_type, "Request failed, continuing");
                progress.failed_requests += 1;
                Ok(None)
            }
        }
    }

    fn cancelled(&self, template: &Template) -> EngineError {
        info!("Scan cancelled");
        EngineError::Cancelled {
            template_id: template.id.clone(),
        }
    }
}

/// Everything accumulated while a scan runs.
struct Progress {
    template_id: String,
    template_name: Option<String>,
    severity: Option<crate::models::Severity>,
    method: String,
    status_code: Option<u16>,
    response_length: Option<usize>,
    extracted: Vec<Finding>,
    requests_sent: usize,
    failed_requests: usize,
}

impl Progress {
    fn new(template: &Template) -> Self {
        Self {
            template_id: template.id.clone(),
            template_name: template.info.name.clone(),
            severity: template.info.severity.clone(),
            method: template
                .steps
                .first()
                .map(|s| s.method.to_string())
                .unwrap_or_default(),
            status_code: None,
            response_length: None,
            extracted: Vec::new(),
            requests_sent: 0,
            failed_requests: 0,
        }
    }

    fn record_response(&mut self, step: &HttpStep, response: &ResponseView) {
        self.method = step.method.to_string();
        self.status_code = Some(response.status);
        self.response_length = Some(response.length());
    }

    fn finish(self, target: &str, matched: Option<(MatchedMatcher, String)>, started: Instant) -> ScanResult {
        let (matched, matched_url) = match matched {
            Some((m, url)) => (Some(m), Some(url)),
            None => (None, None),
        };
        ScanResult {
            template_id: self.template_id,
            template_name: self.template_name,
            severity: self.severity,
            target_url: target.to_string(),
            method: self.method,
            status_code: self.status_code,
            response_length: self.response_length,
            vulnerable: matched.is_some(),
            matched_url,
            matched,
            extracted: self.extracted,
            requests_sent: self.requests_sent,
            failed_requests: self.failed_requests,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}
