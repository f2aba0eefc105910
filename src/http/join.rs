use url::Url;

use crate::errors::ScanError;

/// Prefix some template authors put in front of paths.
const BASE_URL_PLACEHOLDER: &str = "{{BaseURL}}";

/// Parse a scan target into an absolute base URL.
pub fn parse_target(target: &str) -> Result<Url, ScanError> {
    let url = Url::parse(target.trim()).map_err(|e| ScanError::InvalidUrl {
        url: target.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ScanError::InvalidUrl {
            url: target.to_string(),
            reason: "target must be an absolute http(s) URL".into(),
        });
    }
    Ok(url)
}

/// Join a template path onto a target base.
///
/// The path is appended below the base path instead of replacing it. Query
/// strings from both sides are kept (base first), and the path's fragment
/// wins over the base fragment. Dot segments in the path part are resolved
/// by the URL parser; payloads that must reach the server verbatim belong in
/// the query.
pub fn join_url(base: &str, path: &str) -> Result<Url, ScanError> {
    let mut url = parse_target(base)?;

    let path = path.trim();
    let path = path.strip_prefix(BASE_URL_PLACEHOLDER).unwrap_or(path);
    let (rest, fragment) = match path.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (path, None),
    };
    let (path_part, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };

    if !path_part.is_empty() {
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path_part.trim_start_matches('/')
        );
        url.set_path(&joined);
    }

    let base_query = url.query().map(str::to_string);
    let parts: Vec<&str> = [base_query.as_deref(), query]
        .into_iter()
        .flatten()
        .filter(|q| !q.is_empty())
        .collect();
    if parts.is_empty() {
        url.set_query(base_query.as_deref().or(query));
    } else {
        url.set_query(Some(&parts.join("&")));
    }

    if let Some(fragment) = fragment {
        url.set_fragment(Some(fragment));
    }

    Ok(url)
}
