use std::time::{Duration, Instant};

use reqwest::{redirect, Client, Method};
use url::Url;

use crate::errors::ScanError;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    /// Upper bound for one request/response cycle, body included.
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("pentoscan/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Issues single requests against a target.
///
/// TLS certificate validation is disabled so self-signed and internal targets
/// can be scanned. Do not reuse this client for anything that needs
/// authenticated TLS. Failed requests are never retried here.
pub struct RequestExecutor {
    client: Client,
}

impl RequestExecutor {
    pub fn new(settings: &HttpSettings) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .user_agent(&settings.user_agent)
            .build()
            .map_err(ScanError::Client)?;

        Ok(Self { client })
    }

    pub async fn send(&self, method: Method, url: Url) -> Result<ResponseView, ScanError> {
        let started = Instant::now();
        debug!(method = %method, url = %url, "Sending request");

        let response = self
            .client
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| ScanError::from_reqwest(url.as_str(), e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    canonical_header_name(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScanError::from_reqwest(url.as_str(), e))?;

        Ok(ResponseView {
            url: url.to_string(),
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// `set-cookie` -> `Set-Cookie`. The HTTP stack lower-cases names; scripts
/// written against real traffic expect the conventional form.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalized view of one HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseView {
    pub url: String,
    pub status: u16,
    /// In received order; repeated headers appear once per value.
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ResponseView {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            status,
            headers: Vec::new(),
            body: body.into(),
            elapsed_ms: 0,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Body length in bytes.
    pub fn length(&self) -> usize {
        self.body.len()
    }

    /// All headers as `Key: Value` lines joined with CRLF.
    pub fn raw_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
