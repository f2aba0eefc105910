use std::collections::BTreeSet;

use reqwest::Method;

use super::model::{Extractor, ExtractorKind, HttpStep, Matcher, MatcherKind, Pattern, Template, TemplateInfo};
use super::raw::{OneOrMany, RawExtractor, RawInfo, RawMatcher, RawScript, RawStep, RawTemplate};
use crate::errors::TemplateError;
use crate::http::join_url;

/// Base used to check that every path joins into an absolute URL.
const PLACEHOLDER_BASE: &str = "http://template.invalid";

/// Turn a parsed document into a [`Template`], or report the first structural
/// problem. Checks run in a fixed order: id, steps, then each step's method,
/// paths and matchers (with each matcher's type and payload), then extractors.
pub fn validate(raw: RawTemplate) -> Result<Template, TemplateError> {
    let id = raw
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(TemplateError::MissingId)?;

    let raw_steps = raw.http.filter(|s| !s.is_empty()).ok_or(TemplateError::MissingSteps)?;
    let steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| validate_step(i, step))
        .collect::<Result<Vec<_>, _>>()?;

    let extractors = raw
        .extractors
        .into_iter()
        .enumerate()
        .map(|(i, e)| validate_extractor(i, e))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Template {
        id,
        info: convert_info(raw.info),
        steps,
        script: raw.javascript.and_then(RawScript::into_source),
        extractors,
        exploit: raw.exploit.filter(|e| !e.trim().is_empty()),
    })
}

fn validate_step(index: usize, raw: RawStep) -> Result<HttpStep, TemplateError> {
    let method_name = raw
        .method
        .map(|m| m.trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty())
        .ok_or(TemplateError::MissingMethod { step: index })?;
    let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| TemplateError::InvalidMethod {
        step: index,
        method: method_name.clone(),
    })?;

    let paths = raw
        .path
        .map(OneOrMany::into_vec)
        .filter(|p| !p.is_empty())
        .ok_or(TemplateError::MissingPaths { step: index })?;
    for path in &paths {
        join_url(PLACEHOLDER_BASE, path).map_err(|e| TemplateError::InvalidPath {
            step: index,
            path: path.clone(),
            reason: e.to_string(),
        })?;
    }

    let raw_matchers = raw
        .matchers
        .filter(|m| !m.is_empty())
        .ok_or(TemplateError::MissingMatchers { step: index })?;
    let matchers = raw_matchers
        .into_iter()
        .enumerate()
        .map(|(j, m)| validate_matcher(index, j, m))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpStep { method, paths, matchers })
}

fn validate_matcher(step: usize, index: usize, raw: RawMatcher) -> Result<Matcher, TemplateError> {
    let kind_name = raw
        .kind
        .map(|k| k.trim().to_ascii_lowercase())
        .filter(|k| !k.is_empty())
        .ok_or(TemplateError::MissingMatcherType { step, matcher: index })?;

    let kind = match kind_name.as_str() {
        "word" => MatcherKind::Word,
        "status" => MatcherKind::Status,
        "regex" => MatcherKind::Regex,
        _ => {
            return Err(TemplateError::UnknownMatcherType {
                step,
                matcher: index,
                kind: kind_name,
            })
        }
    };
    let missing = || TemplateError::MissingMatcherPayload {
        step,
        matcher: index,
        field: kind.payload_field(),
    };

    match kind {
        MatcherKind::Word => {
            let words = non_empty(raw.words).ok_or_else(missing)?;
            Ok(Matcher::Word { words })
        }
        MatcherKind::Status => {
            let codes = non_empty(raw.status).ok_or_else(missing)?;
            Ok(Matcher::Status { codes })
        }
        MatcherKind::Regex => {
            let sources = non_empty(raw.regex).ok_or_else(missing)?;
            let location = format!("http[{}].matchers[{}]", step, index);
            let patterns = compile_all(&location, &sources)?;
            Ok(Matcher::Regex { patterns })
        }
    }
}

fn validate_extractor(index: usize, raw: RawExtractor) -> Result<Extractor, TemplateError> {
    let kind = match raw.kind.trim().to_ascii_lowercase().as_str() {
        "regex" => ExtractorKind::Regex,
        _ => {
            return Err(TemplateError::UnknownExtractorType {
                extractor: index,
                kind: raw.kind,
            })
        }
    };
    let sources = non_empty(raw.regex).ok_or(TemplateError::MissingExtractorPatterns { extractor: index })?;
    let patterns = compile_all(&format!("extractors[{}]", index), &sources)?;
    Ok(Extractor { kind, patterns })
}

fn compile_all(location: &str, sources: &[String]) -> Result<Vec<Pattern>, TemplateError> {
    sources
        .iter()
        .map(|src| {
            Pattern::new(src).map_err(|e| TemplateError::InvalidPattern {
                location: location.to_string(),
                pattern: src.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn non_empty<T>(value: Option<OneOrMany<T>>) -> Option<Vec<T>> {
    value.map(OneOrMany::into_vec).filter(|v| !v.is_empty())
}

fn convert_info(raw: RawInfo) -> TemplateInfo {
    let tags: BTreeSet<String> = raw
        .tags
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .flat_map(|t| t.split(','))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    TemplateInfo {
        name: raw.name,
        author: raw.author,
        severity: raw.severity,
        tags,
        reference: raw.reference,
        description: raw.description,
    }
}

impl From<&Template> for RawTemplate {
    fn from(template: &Template) -> Self {
        let info = &template.info;
        RawTemplate {
            id: Some(template.id.clone()),
            info: RawInfo {
                name: info.name.clone(),
                author: info.author.clone(),
                severity: info.severity.clone(),
                tags: (!info.tags.is_empty()).then(|| OneOrMany::Many(info.tags.iter().cloned().collect())),
                reference: info.reference.clone(),
                description: info.description.clone(),
            },
            http: Some(template.steps.iter().map(raw_step).collect()),
            javascript: template.script.clone().map(RawScript::Source),
            extractors: template
                .extractors
                .iter()
                .map(|e| RawExtractor {
                    kind: "regex".to_string(),
                    regex: Some(OneOrMany::Many(e.patterns.iter().map(|p| p.as_str().to_string()).collect())),
                })
                .collect(),
            exploit: template.exploit.clone(),
        }
    }
}

fn raw_step(step: &HttpStep) -> RawStep {
    RawStep {
        method: Some(step.method.as_str().to_string()),
        path: Some(OneOrMany::Many(step.paths.clone())),
        matchers: Some(step.matchers.iter().map(raw_matcher).collect()),
    }
}

fn raw_matcher(matcher: &Matcher) -> RawMatcher {
    let mut raw = RawMatcher {
        kind: Some(matcher.kind().as_str().to_string()),
        ..Default::default()
    };
    match matcher {
        Matcher::Word { words } => raw.words = Some(OneOrMany::Many(words.clone())),
        Matcher::Status { codes } => raw.status = Some(OneOrMany::Many(codes.clone())),
        Matcher::Regex { patterns } => {
            raw.regex = Some(OneOrMany::Many(patterns.iter().map(|p| p.as_str().to_string()).collect()))
        }
    }
    raw
}

impl Template {
    /// The document form of this template. Validating it yields `self` again.
    pub fn to_raw(&self) -> RawTemplate {
        RawTemplate::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> RawTemplate {
        serde_yaml::from_str(yaml).unwrap()
    }

    const VALID: &str = r#"
id: lfi-test
info:
  name: LFI check
  severity: high
  tags: lfi, linux
http:
  - method: get
    path:
      - "/?file=../../etc/passwd"
      - "/index.php?page=../../etc/passwd"
    matchers:
      - type: word
        words: ["root:"]
      - type: status
        status: 200
      - type: regex
        regex: ["root:.*:0:0"]
javascript:
  - code: "['a']"
extractors:
  - type: regex
    regex: ["^a"]
exploit_module: modules/lfi.py
"#;

    #[test]
    fn test_valid_template() {
        let t = validate(parse(VALID)).unwrap();
        assert_eq!(t.id, "lfi-test");
        assert_eq!(t.steps.len(), 1);
        assert_eq!(t.steps[0].method, Method::GET);
        assert_eq!(t.steps[0].paths.len(), 2);
        assert_eq!(t.steps[0].matchers.len(), 3);
        assert_eq!(t.info.tags.len(), 2);
        assert!(t.info.tags.contains("linux"));
        assert_eq!(t.script.as_deref(), Some("['a']"));
        assert_eq!(t.exploit.as_deref(), Some("modules/lfi.py"));
        assert_eq!(t.request_count(), 2);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let first = validate(parse(VALID)).unwrap();
        let second = validate(first.to_raw()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_id() {
        let err = validate(parse("info: {}\nhttp: []")).unwrap_err();
        assert_eq!(err, TemplateError::MissingId);
        assert_eq!(err.field(), "id");
    }

    #[test]
    fn test_blank_id_is_missing() {
        let err = validate(parse("id: '  '")).unwrap_err();
        assert_eq!(err, TemplateError::MissingId);
    }

    #[test]
    fn test_missing_and_empty_steps() {
        assert_eq!(validate(parse("id: t")).unwrap_err(), TemplateError::MissingSteps);
        assert_eq!(validate(parse("id: t\nhttp: []")).unwrap_err(), TemplateError::MissingSteps);
    }

    #[test]
    fn test_id_checked_before_steps() {
        assert_eq!(validate(RawTemplate::default()).unwrap_err(), TemplateError::MissingId);
    }

    #[test]
    fn test_missing_method() {
        let err = validate(parse("id: t\nhttp:\n  - path: ['/']\n    matchers: [{type: status, status: 200}]")).unwrap_err();
        assert_eq!(err, TemplateError::MissingMethod { step: 0 });
        assert_eq!(err.field(), "method");
    }

    #[test]
    fn test_invalid_method() {
        let err = validate(parse("id: t\nhttp:\n  - method: 'G T'\n    path: ['/']\n    matchers: [{type: status, status: 200}]"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidMethod { step: 0, .. }));
    }

    #[test]
    fn test_missing_paths() {
        let err = validate(parse("id: t\nhttp:\n  - method: GET\n    matchers: [{type: status, status: 200}]")).unwrap_err();
        assert_eq!(err, TemplateError::MissingPaths { step: 0 });
        let err = validate(parse("id: t\nhttp:\n  - method: GET\n    path: []\n    matchers: [{type: status, status: 200}]"))
            .unwrap_err();
        assert_eq!(err, TemplateError::MissingPaths { step: 0 });
    }

    #[test]
    fn test_missing_matchers_reports_step_index() {
        let yaml = "id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: status, status: 200}]\n  - method: GET\n    path: ['/b']";
        assert_eq!(validate(parse(yaml)).unwrap_err(), TemplateError::MissingMatchers { step: 1 });
    }

    #[test]
    fn test_method_checked_before_paths() {
        let err = validate(parse("id: t\nhttp:\n  - {}")).unwrap_err();
        assert_eq!(err, TemplateError::MissingMethod { step: 0 });
    }

    #[test]
    fn test_missing_matcher_type() {
        let err = validate(parse("id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{words: [a]}]")).unwrap_err();
        assert_eq!(err, TemplateError::MissingMatcherType { step: 0, matcher: 0 });
    }

    #[test]
    fn test_missing_type_specific_payload() {
        let cases = [
            ("{type: word, status: 200}", "words"),
            ("{type: status, words: [a]}", "status"),
            ("{type: regex, words: [a]}", "regex"),
        ];
        for (matcher, field) in cases {
            let yaml = format!("id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{}]", matcher);
            let err = validate(parse(&yaml)).unwrap_err();
            assert_eq!(err, TemplateError::MissingMatcherPayload { step: 0, matcher: 0, field });
            assert_eq!(err.field(), field);
            assert!(err.to_string().contains(field));
        }
    }

    #[test]
    fn test_unknown_matcher_type() {
        let err = validate(parse("id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: dsl}]")).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownMatcherType { .. }));
    }

    #[test]
    fn test_invalid_regex_is_load_error() {
        let err = validate(parse("id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: regex, regex: ['(']}]"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPattern { .. }));
    }

    #[test]
    fn test_extractor_requires_patterns() {
        let yaml = "id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: status, status: 200}]\nextractors:\n  - type: regex";
        assert_eq!(
            validate(parse(yaml)).unwrap_err(),
            TemplateError::MissingExtractorPatterns { extractor: 0 }
        );
    }

    #[test]
    fn test_unknown_extractor_type() {
        let yaml = "id: t\nhttp:\n  - method: GET\n    path: ['/']\n    matchers: [{type: status, status: 200}]\nextractors:\n  - type: kval\n    regex: [a]";
        assert!(matches!(
            validate(parse(yaml)).unwrap_err(),
            TemplateError::UnknownExtractorType { extractor: 0, .. }
        ));
    }
}
