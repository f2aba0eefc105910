use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use super::orchestrator::Scanner;
use crate::errors::EngineError;
use crate::models::ScanResult;
use crate::templates::Template;

/// One (target, template) pair to scan.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub target: String,
    pub template: Arc<Template>,
}

impl ScanJob {
    pub fn new(target: impl Into<String>, template: Arc<Template>) -> Self {
        Self {
            target: target.into(),
            template,
        }
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub job: ScanJob,
    pub result: Result<ScanResult, EngineError>,
}

/// Run `jobs` with at most `concurrency` scans in flight.
///
/// Each scan is independent and owns its own HTTP client and script
/// contexts. Outcomes come back in input order. `on_done` is called as each
/// scan finishes, in completion order.
pub async fn scan_many<F>(scanner: &Scanner, jobs: Vec<ScanJob>, concurrency: usize, on_done: F) -> Vec<ScanOutcome>
where
    F: Fn(&ScanOutcome),
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    debug!(jobs = jobs.len(), concurrency, "Starting scan batch");

    let futures: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let semaphore = semaphore.clone();
            let on_done = &on_done;
            async move {
                let _permit = semaphore.acquire().await.ok();
                let result = scanner.scan(&job.target, &job.template).await;
                let outcome = ScanOutcome { job, result };
                on_done(&outcome);
                outcome
            }
        })
        .collect();

    join_all(futures).await
}
