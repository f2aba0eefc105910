pub mod types;
pub mod classification;
pub mod retry;

pub use types::{EngineError, ModuleError, PentoscanError, ScanError, ScriptError, TemplateError};
pub use classification::ErrorClassification;
pub use retry::{RetryConfig, Retryable, with_retry};
