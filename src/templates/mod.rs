pub mod model;
pub mod raw;
pub mod validate;
pub mod loader;

pub use model::{Extractor, ExtractorKind, HttpStep, Matcher, MatcherKind, Pattern, Template, TemplateInfo};
pub use raw::RawTemplate;
pub use validate::validate;
pub use loader::{load_template, parse_template, SkippedTemplate, TemplateLibrary};
