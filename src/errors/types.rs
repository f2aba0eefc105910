use thiserror::Error;

/// Structural problems in a template. Always detected before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template file not found: {0}")]
    NotFound(String),

    #[error("Template file {path} exceeds {limit} byte limit")]
    TooLarge { path: String, limit: u64 },

    #[error("Invalid YAML format: {0}")]
    Parse(String),

    #[error("Missing required field: id")]
    MissingId,

    #[error("Missing required field: http (template needs at least one step)")]
    MissingSteps,

    #[error("Missing required field: http[{step}].method")]
    MissingMethod { step: usize },

    #[error("Invalid HTTP method '{method}' in http[{step}]")]
    InvalidMethod { step: usize, method: String },

    #[error("Missing required field: http[{step}].path")]
    MissingPaths { step: usize },

    #[error("Invalid path '{path}' in http[{step}]: {reason}")]
    InvalidPath { step: usize, path: String, reason: String },

    #[error("Missing required field: http[{step}].matchers")]
    MissingMatchers { step: usize },

    #[error("Missing required field: http[{step}].matchers[{matcher}].type")]
    MissingMatcherType { step: usize, matcher: usize },

    #[error("Unknown matcher type '{kind}' in http[{step}].matchers[{matcher}]")]
    UnknownMatcherType { step: usize, matcher: usize, kind: String },

    #[error("Missing required field: http[{step}].matchers[{matcher}].{field}")]
    MissingMatcherPayload { step: usize, matcher: usize, field: &'static str },

    #[error("Unknown extractor type '{kind}' in extractors[{extractor}]")]
    UnknownExtractorType { extractor: usize, kind: String },

    #[error("Missing required field: extractors[{extractor}].regex")]
    MissingExtractorPatterns { extractor: usize },

    #[error("Invalid regex '{pattern}' at {location}: {reason}")]
    InvalidPattern { location: String, pattern: String, reason: String },
}

impl TemplateError {
    /// The template field this error is about, for user-facing reports.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::TooLarge { .. } | Self::Parse(_) => "file",
            Self::MissingId => "id",
            Self::MissingSteps => "http",
            Self::MissingMethod { .. } | Self::InvalidMethod { .. } => "method",
            Self::MissingPaths { .. } | Self::InvalidPath { .. } => "path",
            Self::MissingMatchers { .. } => "matchers",
            Self::MissingMatcherType { .. } | Self::UnknownMatcherType { .. } => "type",
            Self::MissingMatcherPayload { field, .. } => *field,
            Self::UnknownExtractorType { .. } => "type",
            Self::MissingExtractorPatterns { .. } | Self::InvalidPattern { .. } => "regex",
        }
    }
}

/// Transport failures for a single request. Recovered by the scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl ScanError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url, source }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Transport { url, source }
        }
    }
}

/// Failures inside the script sandbox. Always downgraded to "no findings".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script failed to parse: {0}")]
    Syntax(String),

    #[error("Script raised an error: {0}")]
    Runtime(String),

    #[error("Script exceeded {0}ms execution limit")]
    Timeout(u64),

    #[error("Script must return an array of strings, got {0}")]
    InvalidReturn(String),

    #[error("Script sandbox failed: {0}")]
    Sandbox(String),
}

/// Exploit handler resolution or execution failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("Invalid module reference: '{0}'")]
    InvalidReference(String),

    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Module '{0}' must provide a run operation")]
    MissingRun(String),

    #[error("Module '{name}' failed: {message}")]
    Failed { name: String, message: String },

    #[error("Module '{0}' panicked")]
    Panicked(String),
}

/// Conditions that stop a whole scan. Per-request failures never end up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Scan of '{template_id}' cancelled")]
    Cancelled { template_id: String },

    #[error("Scan setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum PentoscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
