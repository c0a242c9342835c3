// src/core/net.rs
//! Fetch collaborator. Sources only see the `Fetcher` trait: `get(url) -> text`
//! plus `last_url()` (where the last request actually landed after redirects).
//! Requests are blocking and issued one at a time.

use std::{collections::HashMap, thread, time::Duration};

use thiserror::Error;

use crate::config::options::FetchOptions;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("no page for {0}")]
    NotFound(String),
    #[error("all candidate urls failed: {0:?}")]
    Exhausted(Vec<String>),
}

pub trait Fetcher {
    fn get(&mut self, url: &str) -> Result<String, FetchError>;

    /// Final URL of the most recent successful `get`.
    fn last_url(&self) -> Option<&str>;
}

/// Try candidate URLs in order; first success wins. Returns body and the URL
/// the fetcher landed on.
pub fn get_first<S: AsRef<str>>(
    fetcher: &mut dyn Fetcher,
    candidates: &[S],
) -> Result<(String, String), FetchError> {
    let mut tried = Vec::with_capacity(candidates.len());
    for url in candidates {
        let url = url.as_ref();
        match fetcher.get(url) {
            Ok(body) => {
                let landed = fetcher.last_url().unwrap_or(url).to_string();
                return Ok((body, landed));
            }
            Err(e) => {
                logd!("Net: candidate {} failed: {}", url, e);
                tried.push(url.to_string());
            }
        }
    }
    Err(FetchError::Exhausted(tried))
}

/// Resolve `href` against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> Result<String, FetchError> {
    let base = url::Url::parse(base).map_err(|_| FetchError::InvalidUrl(base.to_string()))?;
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|_| FetchError::InvalidUrl(href.to_string()))
}

/* ---------------- HTTP ---------------- */

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    retries: u32,
    backoff: Duration,
    last_url: Option<String>,
}

impl HttpFetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(Duration::from_secs(opts.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .build()
            .map_err(|source| FetchError::Http { url: s!(), source })?;

        Ok(Self {
            client,
            retries: opts.retries,
            backoff: Duration::from_millis(opts.backoff_ms),
            last_url: None,
        })
    }

    fn get_once(&self, url: &str) -> Result<(String, String), FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Http { url: url.to_string(), source })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let landed = resp.url().to_string();
        let body = resp
            .text()
            .map_err(|source| FetchError::Http { url: url.to_string(), source })?;
        Ok((body, landed))
    }
}

impl Fetcher for HttpFetcher {
    fn get(&mut self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.get_once(url) {
                Ok((body, landed)) => {
                    if landed != url {
                        logd!("Net: {} redirected to {}", url, landed);
                    }
                    self.last_url = Some(landed);
                    return Ok(body);
                }
                // A missing page will not appear on retry.
                Err(e @ FetchError::NotFound(_)) => return Err(e),
                Err(e) if attempt >= self.retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let pause = self.backoff * attempt;
                    logw!("Net: {} (attempt {}/{}), retrying in {:?}", e, attempt, self.retries, pause);
                    thread::sleep(pause);
                }
            }
        }
    }

    fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

/* ---------------- Static (offline files, tests) ---------------- */

/// Serves bodies from memory. Unknown URLs are `NotFound`.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    last_url: Option<String>,
    requests: Vec<String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// `from` lands on `to` (which must be a registered page).
    pub fn with_redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Fetcher for StaticFetcher {
    fn get(&mut self, url: &str) -> Result<String, FetchError> {
        self.requests.push(url.to_string());
        let landed = self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        let body = self
            .pages
            .get(&landed)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;
        self.last_url = Some(landed);
        Ok(body)
    }

    fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_first_falls_through_to_the_first_live_candidate() {
        let mut f = StaticFetcher::new().with_page("https://x.test/b", "B");
        let (body, landed) = get_first(&mut f, &["https://x.test/a", "https://x.test/b"]).unwrap();
        assert_eq!(body, "B");
        assert_eq!(landed, "https://x.test/b");
        assert_eq!(f.requests(), ["https://x.test/a", "https://x.test/b"]);
    }

    #[test]
    fn get_first_reports_every_failed_candidate() {
        let mut f = StaticFetcher::new();
        let err = get_first(&mut f, &["https://x.test/a"]).unwrap_err();
        assert!(matches!(err, FetchError::Exhausted(v) if v == ["https://x.test/a"]));
    }

    #[test]
    fn static_redirect_updates_last_url() {
        let mut f = StaticFetcher::new()
            .with_page("https://x.test/final", "ok")
            .with_redirect("https://x.test/start", "https://x.test/final");
        assert_eq!(f.get("https://x.test/start").unwrap(), "ok");
        assert_eq!(f.last_url(), Some("https://x.test/final"));
    }

    #[test]
    fn resolve_relative_links() {
        assert_eq!(
            resolve_url("https://x.test/c/1/standings?page=1", "?page=2").unwrap(),
            "https://x.test/c/1/standings?page=2"
        );
        assert_eq!(resolve_url("https://x.test/a/b", "/z").unwrap(), "https://x.test/z");
        assert!(resolve_url("not a url", "/z").is_err());
    }
}
