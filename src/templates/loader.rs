use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::model::Template;
use super::raw::RawTemplate;
use super::validate::validate;
use crate::errors::{PentoscanError, TemplateError};
use tracing::{debug, info, warn};

const MAX_TEMPLATE_SIZE: u64 = 1_048_576;

/// Parse and validate a template held in memory.
pub fn parse_template(content: &str) -> Result<Template, TemplateError> {
    let raw: RawTemplate = serde_yaml::from_str(content).map_err(|e| TemplateError::Parse(e.to_string()))?;
    validate(raw)
}

/// Read, parse and validate one template file.
pub fn load_template(path: &Path) -> Result<Template, TemplateError> {
    let shown = path.display().to_string();
    let metadata = std::fs::metadata(path).map_err(|_| TemplateError::NotFound(shown.clone()))?;
    if !metadata.is_file() {
        return Err(TemplateError::NotFound(shown));
    }
    if metadata.len() > MAX_TEMPLATE_SIZE {
        return Err(TemplateError::TooLarge {
            path: shown,
            limit: MAX_TEMPLATE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Parse(format!("{}: {}", shown, e)))?;
    let template = parse_template(&content)?;
    debug!(id = %template.id, path = %path.display(), steps = template.steps.len(), "Loaded template");
    Ok(template)
}

/// A template that failed to load during a batch load.
#[derive(Debug, Clone)]
pub struct SkippedTemplate {
    pub path: PathBuf,
    pub error: String,
}

/// Every loadable template in a directory, keyed by id.
pub struct TemplateLibrary {
    templates: BTreeMap<String, (PathBuf, Template)>,
    skipped: Vec<SkippedTemplate>,
}

impl TemplateLibrary {
    /// Load `*.yaml` and `*.yml` files. A broken file is logged and skipped;
    /// it never fails the batch.
    pub fn load(templates_dir: &Path) -> Result<Self, PentoscanError> {
        let mut library = Self {
            templates: BTreeMap::new(),
            skipped: Vec::new(),
        };

        if !templates_dir.is_dir() {
            return Err(PentoscanError::Config(format!(
                "Template directory not found: {}",
                templates_dir.display()
            )));
        }

        let escaped_dir = glob::Pattern::escape(&templates_dir.to_string_lossy());
        let mut paths = Vec::new();
        for ext in ["yaml", "yml"] {
            let pattern = Path::new(&escaped_dir).join(format!("**/*.{}", ext));
            let pattern_str = pattern.to_string_lossy();
            for entry in glob::glob(&pattern_str)
                .map_err(|e| PentoscanError::Config(format!("Invalid glob pattern: {}", e)))?
            {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => {
                        warn!(path = %e.path().display(), error = %e.error(), "Skipping unreadable template entry");
                        library.skipped.push(SkippedTemplate {
                            path: e.path().to_path_buf(),
                            error: e.error().to_string(),
                        });
                    }
                }
            }
        }
        paths.sort();

        for path in paths {
            match load_template(&path) {
                Ok(template) => library.insert(path, template),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping invalid template");
                    library.skipped.push(SkippedTemplate {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            loaded = library.templates.len(),
            skipped = library.skipped.len(),
            dir = %templates_dir.display(),
            "Loaded template library"
        );
        Ok(library)
    }

    fn insert(&mut self, path: PathBuf, template: Template) {
        if let Some((existing, _)) = self.templates.get(&template.id) {
            warn!(
                id = %template.id,
                path = %path.display(),
                existing = %existing.display(),
                "Duplicate template id, keeping the first"
            );
            self.skipped.push(SkippedTemplate {
                error: format!("Duplicate template id '{}'", template.id),
                path,
            });
            return;
        }
        self.templates.insert(template.id.clone(), (path, template));
    }

    /// Templates sorted by id.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values().map(|(_, t)| t)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Path, &Template)> {
        self.templates.values().map(|(p, t)| (p.as_path(), t))
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id).map(|(_, t)| t)
    }

    pub fn skipped(&self) -> &[SkippedTemplate] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
