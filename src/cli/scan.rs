use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::commands::ScanArgs;
use crate::cli::load_config;
use crate::errors::{EngineError, PentoscanError};
use crate::exploits::ExploitDispatcher;
use crate::http::parse_target;
use crate::reporting::{format_exploit_summary, format_scan_summary, ResultRecord, ResultWriter};
use crate::scanner::{scan_many, ScanJob, ScanOutcome, Scanner};
use crate::templates::{load_template, Template, TemplateLibrary};

pub async fn handle_scan(args: ScanArgs, quiet: bool, cancel: CancellationToken) -> Result<(), PentoscanError> {
    let config = load_config(args.config.as_deref()).await?;

    let mut scan_config = config.scan_config();
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(PentoscanError::Config("--timeout must be greater than 0".into()));
        }
        scan_config.http.timeout = Duration::from_secs(secs);
    }
    let concurrency = args.concurrency.unwrap_or_else(|| config.concurrency());
    if concurrency == 0 {
        return Err(PentoscanError::Config("--concurrency must be greater than 0".into()));
    }
    let output_dir = args.output.clone().unwrap_or_else(|| config.output_dir().to_string());

    let templates = load_templates(Path::new(&args.template))?;
    for target in &args.target {
        parse_target(target).map_err(|e| EngineError::InvalidTarget {
            target: target.clone(),
            reason: e.to_string(),
        })?;
    }

    let jobs: Vec<ScanJob> = args
        .target
        .iter()
        .flat_map(|target| templates.iter().map(move |t| ScanJob::new(target.clone(), t.clone())))
        .collect();
    info!(
        targets = args.target.len(),
        templates = templates.len(),
        jobs = jobs.len(),
        concurrency,
        "Starting scan"
    );

    let scanner = Scanner::new(scan_config).with_cancel_token(cancel.clone());
    let progress = (!quiet && jobs.len() > 1).then(|| progress_bar(jobs.len() as u64));
    let outcomes = scan_many(&scanner, jobs, concurrency, |outcome: &ScanOutcome| {
        if let Some(bar) = &progress {
            bar.inc(1);
            bar.set_message(format!("{} @ {}", outcome.job.template.id, outcome.job.target));
        }
    })
    .await;
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let writer = ResultWriter::new(&output_dir);
    let options = ReportOptions {
        no_exploit: args.no_exploit,
        quiet,
    };
    report_outcomes(outcomes, &ExploitDispatcher::default(), &writer, options, &cancel).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct ReportOptions {
    no_exploit: bool,
    quiet: bool,
}

/// Dispatch exploits, print and persist every finished scan. A failed scan
/// or a failed save is logged and the loop carries on; the first error is
/// returned at the end, cancellation first.
async fn report_outcomes(
    outcomes: Vec<ScanOutcome>,
    dispatcher: &ExploitDispatcher,
    writer: &ResultWriter,
    options: ReportOptions,
    cancel: &CancellationToken,
) -> Result<usize, PentoscanError> {
    let mut vulnerable = 0;
    let mut cancelled: Option<EngineError> = None;
    let mut first_error: Option<PentoscanError> = None;

    for ScanOutcome { job, result } in outcomes {
        let scan = match result {
            Ok(scan) => scan,
            Err(e @ EngineError::Cancelled { .. }) => {
                cancelled.get_or_insert(e);
                continue;
            }
            Err(e) => {
                warn!(template = %job.template.id, target = %job.target, error = %e, "Scan failed");
                first_error.get_or_insert(e.into());
                continue;
            }
        };

        if scan.vulnerable {
            vulnerable += 1;
        }
        let exploit = match (&job.template.exploit, options.no_exploit || cancel.is_cancelled()) {
            (Some(reference), false) => dispatcher.dispatch(reference, &job.target, &scan).await,
            _ => None,
        };

        if !options.quiet {
            print!("{}", format_scan_summary(&scan));
            if let Some(exploit) = &exploit {
                print!("{}", format_exploit_summary(exploit));
            }
        }
        match writer.save(&ResultRecord::new(scan, exploit)).await {
            Ok(path) if !options.quiet => println!("  saved to {}", path.display()),
            Ok(_) => {}
            Err(e) => {
                warn!(template = %job.template.id, target = %job.target, error = %e, "Failed to save result");
                first_error.get_or_insert(e);
            }
        }
    }

    info!(vulnerable, output = %writer.dir().display(), "Scan finished");

    if let Some(e) = cancelled {
        return Err(e.into());
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(vulnerable),
    }
}

/// A single template file, or every valid template under a directory.
fn load_templates(path: &Path) -> Result<Vec<Arc<Template>>, PentoscanError> {
    if !path.is_dir() {
        return Ok(vec![Arc::new(load_template(path)?)]);
    }

    let library = TemplateLibrary::load(path)?;
    for skipped in library.skipped() {
        warn!(path = %skipped.path.display(), error = %skipped.error, "Template skipped");
    }
    if library.is_empty() {
        return Err(PentoscanError::Config(format!(
            "No valid templates found in {}",
            path.display()
        )));
    }
    Ok(library.templates().cloned().map(Arc::new).collect())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("  {bar:30.cyan/dark_gray} {pos}/{len} scans | {msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanResult;
    use tempfile::TempDir;

    const TEMPLATE: &str = "id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: status, status: 200}]\n";

    #[test]
    fn test_load_single_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.yaml");
        std::fs::write(&path, TEMPLATE).unwrap();
        let templates = load_templates(&path).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "t");
    }

    #[test]
    fn test_invalid_single_template_is_template_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.yaml");
        std::fs::write(&path, "http: []\n").unwrap();
        let err = load_templates(&path).unwrap_err();
        assert!(matches!(err, PentoscanError::Template(_)));
        assert_eq!(err.exit_code(), 2);
    }

    fn outcome(id: &str) -> ScanOutcome {
        let template = Arc::new(crate::templates::parse_template(TEMPLATE).unwrap());
        let scan = ScanResult {
            template_id: id.to_string(),
            template_name: None,
            severity: None,
            target_url: "http://localhost".into(),
            method: "GET".into(),
            status_code: Some(200),
            response_length: Some(2),
            vulnerable: true,
            matched_url: None,
            matched: None,
            extracted: Vec::new(),
            requests_sent: 1,
            failed_requests: 0,
            duration_ms: 1,
        };
        ScanOutcome {
            job: ScanJob::new("http://localhost", template),
            result: Ok(scan),
        }
    }

    #[tokio::test]
    async fn test_failed_save_does_not_drop_later_results() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let options = ReportOptions {
            no_exploit: true,
            quiet: true,
        };
        let outcomes = vec![outcome(&"x".repeat(300)), outcome("short")];

        let err = report_outcomes(outcomes, &ExploitDispatcher::default(), &writer, options, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PentoscanError::Io(_)));

        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }

    #[tokio::test]
    async fn test_report_counts_vulnerable() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let options = ReportOptions {
            no_exploit: true,
            quiet: true,
        };
        let vulnerable = report_outcomes(
            vec![outcome("a"), outcome("b")],
            &ExploitDispatcher::default(),
            &writer,
            options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(vulnerable, 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_empty_directory_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = load_templates(dir.path()).unwrap_err();
        assert!(matches!(err, PentoscanError::Config(_)));
    }
}
