//! Response matchers.
//!
//! A step matches when *any* of its matchers matches: one indicator of a
//! vulnerability is enough. Matchers run in declaration order and the first
//! hit is reported as the trigger.

use crate::http::ResponseView;
use crate::templates::Matcher;

/// Evaluate one matcher against a response. Pure.
pub fn evaluate(matcher: &Matcher, response: &ResponseView) -> bool {
    match matcher {
        Matcher::Word { words } => words.iter().any(|w| response.body.contains(w.as_str())),
        Matcher::Status { codes } => codes.contains(&response.status),
        Matcher::Regex { patterns } => patterns.iter().any(|p| p.is_match(&response.body)),
    }
}

/// OR-combine a step's matchers. Returns the index of the first matcher that
/// evaluates true, without evaluating the rest.
pub fn evaluate_step(matchers: &[Matcher], response: &ResponseView) -> Option<usize> {
    matchers.iter().position(|m| evaluate(m, response))
}
