use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;

use crate::cli::commands::ListArgs;
use crate::cli::load_config;
use crate::errors::PentoscanError;
use crate::models::Severity;
use crate::templates::{Template, TemplateLibrary};

const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[derive(Debug, Serialize)]
struct TemplateSummary<'a> {
    id: &'a str,
    name: Option<&'a str>,
    #[serde(skip)]
    title: &'a str,
    severity: Option<&'a Severity>,
    tags: Vec<&'a str>,
    requests: usize,
    has_script: bool,
    exploit: Option<&'a str>,
    path: PathBuf,
}

impl<'a> TemplateSummary<'a> {
    fn new(path: &Path, template: &'a Template) -> Self {
        Self {
            id: &template.id,
            name: template.info.name.as_deref(),
            title: template.display_name(),
            severity: template.info.severity.as_ref(),
            tags: template.info.tags.iter().map(String::as_str).collect(),
            requests: template.request_count(),
            has_script: template.script.is_some(),
            exploit: template.exploit.as_deref(),
            path: path.to_path_buf(),
        }
    }
}

pub async fn handle_list(args: ListArgs) -> Result<(), PentoscanError> {
    let config = load_config(args.config.as_deref()).await?;
    let dir = args
        .dir
        .clone()
        .or_else(|| config.templates_dir().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TEMPLATES_DIR.to_string());

    let library = TemplateLibrary::load(Path::new(&dir))?;
    let summaries: Vec<TemplateSummary> = library
        .entries()
        .map(|(path, template)| TemplateSummary::new(path, template))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{:<32} {:<8} {:>3} req  {}",
            style(summary.id).bold(),
            summary.severity.map(Severity::as_str).unwrap_or("-"),
            summary.requests,
            summary.title
        );
    }
    for skipped in library.skipped() {
        println!(
            "{} {}: {}",
            style("skipped").yellow(),
            skipped.path.display(),
            skipped.error
        );
    }
    println!(
        "{} templates, {} skipped",
        summaries.len(),
        library.skipped().len()
    );
    Ok(())
}
