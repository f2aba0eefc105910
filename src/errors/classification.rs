use super::types::{EngineError, PentoscanError, ScanError};

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ScanError {
    /// Timeouts and refused connections are worth another attempt; a bad URL
    /// or a broken client never is.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            ScanError::Timeout { .. } => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            ScanError::Connect { .. } => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            ScanError::Transport { .. } => ErrorClassification {
                error_type: "TransportError",
                retryable: false,
            },
            ScanError::InvalidUrl { .. } => ErrorClassification {
                error_type: "InvalidUrlError",
                retryable: false,
            },
            ScanError::Client(_) => ErrorClassification {
                error_type: "ClientError",
                retryable: false,
            },
        }
    }
}

impl PentoscanError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            PentoscanError::Scan(e) => e.classify(),

            PentoscanError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            PentoscanError::Template(_) => ErrorClassification {
                error_type: "TemplateError",
                retryable: false,
            },
            PentoscanError::Script(_) => ErrorClassification {
                error_type: "ScriptError",
                retryable: false,
            },
            PentoscanError::Module(_) => ErrorClassification {
                error_type: "ModuleError",
                retryable: false,
            },
            PentoscanError::Engine(EngineError::InvalidTarget { .. }) => ErrorClassification {
                error_type: "InvalidTargetError",
                retryable: false,
            },
            PentoscanError::Engine(EngineError::Cancelled { .. }) => ErrorClassification {
                error_type: "CancelledError",
                retryable: false,
            },
            PentoscanError::Engine(EngineError::Setup(_)) => ErrorClassification {
                error_type: "SetupError",
                retryable: false,
            },
            PentoscanError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },
            PentoscanError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            PentoscanError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            PentoscanError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            PentoscanError::Config(_) | PentoscanError::Template(_) | PentoscanError::Yaml(_) => 2,
            PentoscanError::Engine(EngineError::InvalidTarget { .. }) => 5,
            PentoscanError::Engine(EngineError::Cancelled { .. }) => 130,
            _ => 1,
        }
    }
}
