//! JavaScript sandbox for extraction scripts.
//!
//! Every evaluation gets a brand-new `boa_engine` context on a blocking
//! thread. The engine has no host bindings, so scripts see only the injected
//! `template` object: no file system, network, process or environment.

use std::time::Duration;

use async_trait::async_trait;
use boa_engine::{Context, JsValue, Script, Source};
use serde::Serialize;

use crate::errors::ScriptError;
use crate::http::ResponseView;
use tracing::debug;

/// Resource ceilings for one script run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLimits {
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
    pub timeout: Duration,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            loop_iteration_limit: 1_000_000,
            recursion_limit: 256,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Read-only data a script can see, exposed as the global `template`.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptContext {
    pub template_id: String,
    /// `Key: Value` lines joined with CRLF.
    pub http_all_headers: String,
    pub http_status_code: u16,
    pub http_body: String,
}

impl ScriptContext {
    pub fn from_response(template_id: &str, response: &ResponseView) -> Self {
        Self {
            template_id: template_id.to_string(),
            http_all_headers: response.raw_headers(),
            http_status_code: response.status,
            http_body: response.body.clone(),
        }
    }

    fn prelude(&self) -> Result<String, ScriptError> {
        let json = serde_json::to_string(self).map_err(|e| ScriptError::Sandbox(e.to_string()))?;
        Ok(format!("var template = Object.freeze({});", json))
    }
}

/// Narrow capability: given a context of fixed shape, produce strings.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    async fn evaluate(&self, source: &str, context: &ScriptContext) -> Result<Vec<String>, ScriptError>;

    /// Engine name for logging
    fn engine_name(&self) -> &str;
}

pub struct BoaEngine {
    limits: ScriptLimits,
}

impl BoaEngine {
    pub fn new(limits: ScriptLimits) -> Self {
        Self { limits }
    }
}

impl Default for BoaEngine {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

#[async_trait]
impl ScriptEngine for BoaEngine {
    async fn evaluate(&self, source: &str, context: &ScriptContext) -> Result<Vec<String>, ScriptError> {
        let prelude = context.prelude()?;
        let source = source.to_string();
        let limits = self.limits.clone();
        let timeout = limits.timeout;

        let task = tokio::task::spawn_blocking(move || run_isolated(&prelude, &source, &limits));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ScriptError::Sandbox(join_error.to_string())),
            Err(_) => Err(ScriptError::Timeout(timeout.as_millis() as u64)),
        }
    }

    fn engine_name(&self) -> &str {
        "boa"
    }
}

fn run_isolated(prelude: &str, source: &str, limits: &ScriptLimits) -> Result<Vec<String>, ScriptError> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(limits.loop_iteration_limit);
    context.runtime_limits_mut().set_recursion_limit(limits.recursion_limit);

    context
        .eval(Source::from_bytes(prelude))
        .map_err(|e| ScriptError::Sandbox(e.to_string()))?;

    let script = Script::parse(Source::from_bytes(source), None, &mut context)
        .map_err(|e| ScriptError::Syntax(e.to_string()))?;
    let value = script
        .evaluate(&mut context)
        .map_err(|e| ScriptError::Runtime(e.to_string()))?;

    let strings = into_strings(&value, &mut context)?;
    debug!(candidates = strings.len(), "Script returned candidates");
    Ok(strings)
}

fn into_strings(value: &JsValue, context: &mut Context) -> Result<Vec<String>, ScriptError> {
    if value.is_undefined() {
        return Err(ScriptError::InvalidReturn("undefined".into()));
    }
    let json = value
        .to_json(context)
        .map_err(|e| ScriptError::InvalidReturn(e.to_string()))?;

    match json {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s),
                other => Err(ScriptError::InvalidReturn(format!("array containing {}", json_type(&other)))),
            })
            .collect(),
        other => Err(ScriptError::InvalidReturn(json_type(&other).to_string())),
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOKIE_SCRIPT: &str = r#"
        var names = [];
        template.http_all_headers.split("\r\n").forEach(function (line) {
            var lower = line.toLowerCase();
            if (lower.indexOf("set-cookie:") === 0 && lower.indexOf("secure") === -1) {
                names.push(line.substring(11).trim().split("=")[0]);
            }
        });
        names;
    "#;

    fn context() -> ScriptContext {
        let response = ResponseView::new(200, "<html></html>")
            .with_header("Server", "nginx")
            .with_header("Set-Cookie", "PHPSESSID=abc; Path=/")
            .with_header("Set-Cookie", "token=1; Secure; HttpOnly");
        ScriptContext::from_response("cookies-without-secure", &response)
    }

    #[tokio::test]
    async fn test_extracts_cookie_names_from_headers() {
        let engine = BoaEngine::default();
        let names = engine.evaluate(COOKIE_SCRIPT, &context()).await.unwrap();
        assert_eq!(names, vec!["PHPSESSID".to_string()]);
    }

    #[tokio::test]
    async fn test_context_fields_visible() {
        let engine = BoaEngine::default();
        let out = engine
            .evaluate("[template.template_id, String(template.http_status_code)]", &context())
            .await
            .unwrap();
        assert_eq!(out, vec!["cookies-without-secure".to_string(), "200".to_string()]);
    }

    #[tokio::test]
    async fn test_syntax_error() {
        let engine = BoaEngine::default();
        let err = engine.evaluate("var = ;", &context()).await.unwrap_err();
        assert!(matches!(err, ScriptError::Syntax(_)));
    }

    #[tokio::test]
    async fn test_runtime_error() {
        let engine = BoaEngine::default();
        let err = engine.evaluate("throw new Error('boom')", &context()).await.unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_no_host_access() {
        let engine = BoaEngine::default();
        for source in ["require('fs')", "process.env", "fetch('http://example.test')"] {
            let err = engine.evaluate(source, &context()).await.unwrap_err();
            assert!(matches!(err, ScriptError::Runtime(_)), "{} should fail", source);
        }
    }

    #[tokio::test]
    async fn test_infinite_loop_is_bounded() {
        let engine = BoaEngine::new(ScriptLimits {
            loop_iteration_limit: 10_000,
            ..Default::default()
        });
        let err = engine.evaluate("while (true) {}", &context()).await.unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_slow_script_times_out() {
        let engine = BoaEngine::new(ScriptLimits {
            loop_iteration_limit: u64::MAX,
            timeout: Duration::from_millis(1),
            ..Default::default()
        });
        let source = "var total = 0; for (var i = 0; i < 3000000; i++) { total += i; } []";
        let err = engine.evaluate(source, &context()).await.unwrap_err();
        assert_eq!(err, ScriptError::Timeout(1));
    }

    #[tokio::test]
    async fn test_non_array_return() {
        let engine = BoaEngine::default();
        assert!(matches!(
            engine.evaluate("42", &context()).await.unwrap_err(),
            ScriptError::InvalidReturn(_)
        ));
        assert!(matches!(
            engine.evaluate("[1, 2]", &context()).await.unwrap_err(),
            ScriptError::InvalidReturn(_)
        ));
        assert!(matches!(
            engine.evaluate("var x = 1;", &context()).await.unwrap_err(),
            ScriptError::InvalidReturn(_)
        ));
    }

    #[tokio::test]
    async fn test_context_is_read_only() {
        let engine = BoaEngine::default();
        let out = engine
            .evaluate("template.http_body = 'changed'; [template.http_body]", &context())
            .await
            .unwrap();
        assert_eq!(out, vec!["<html></html>".to_string()]);
    }

    #[tokio::test]
    async fn test_no_state_between_runs() {
        let engine = BoaEngine::default();
        engine.evaluate("var leaked = 'x'; []", &context()).await.unwrap();
        let err = engine.evaluate("[leaked]", &context()).await.unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(_)));
    }
}
