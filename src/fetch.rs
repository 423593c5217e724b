//! Blocking retrieval of external markup
//!
//! A [`Fetcher`] performs one blocking request and reports failures as
//! errors. [`SyncFetcher`] is what the directives use: it resolves locators
//! against the configured base URL and turns every failure into a logged
//! diagnostic plus empty content, so a missing fragment never aborts a
//! document.
//!
//! # Fetchers
//!
//! - [`HttpFetcher`] - `reqwest` blocking client, plus `file://` URLs
//! - [`MemoryFetcher`] - fixed route table, for offline bundling and tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};

/// Blocking source of markup
pub trait Fetcher {
    /// Fetch the body of `url`
    ///
    /// Anything but a 200 response is an [`Error::FetchStatus`].
    fn fetch(&self, url: &str) -> Result<String>;
}

impl<F: Fetcher + ?Sized> Fetcher for Rc<F> {
    fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url)
    }
}

/// HTTP(S) and `file://` fetcher
///
/// Requests have no timeout: a hung server blocks the caller, which keeps
/// included content in document order.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(concat!("html-include/", env!("CARGO_PKG_VERSION")))
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| Error::http_owned(e.to_string()))?;
        Ok(Self { client })
    }

    fn fetch_file(&self, url: &str) -> Result<String> {
        let path = Url::parse(url)?
            .to_file_path()
            .map_err(|_| Error::http_owned(format!("'{}' is not a local file path", url)))?;
        Ok(std::fs::read_to_string(path)?)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        if url.starts_with("file://") {
            return self.fetch_file(url);
        }

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::http_owned(e.to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        response.text().map_err(|e| Error::http_owned(e.to_string()))
    }
}

#[derive(Debug, Clone)]
enum Route {
    Body(String),
    Status(u16, String),
}

/// In-memory fetcher answering from a fixed route table
///
/// Unknown URLs answer `404 Not Found`. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, Route>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    /// Answer `url` with a failure status
    pub fn with_status(
        mut self,
        url: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
    ) -> Self {
        self.routes
            .insert(url.into(), Route::Status(status, status_text.into()));
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.routes.insert(url.into(), Route::Body(body.into()));
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        match self.routes.get(url) {
            Some(Route::Body(body)) => Ok(body.clone()),
            Some(Route::Status(status, status_text)) => Err(Error::FetchStatus {
                url: url.to_string(),
                status: *status,
                status_text: status_text.clone(),
            }),
            None => Err(Error::FetchStatus {
                url: url.to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            }),
        }
    }
}

/// Fetcher used by the directives
///
/// Never fails: errors are logged and yield an empty string.
pub struct SyncFetcher {
    fetcher: Box<dyn Fetcher>,
    base_url: Option<Url>,
}

impl std::fmt::Debug for SyncFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFetcher")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SyncFetcher {
    pub fn new<F: Fetcher + 'static>(fetcher: F) -> Self {
        Self::from_boxed(Box::new(fetcher))
    }

    pub(crate) fn from_boxed(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Resolve a locator against the base URL, if one is configured
    pub fn resolve(&self, url: &str) -> Result<String> {
        match &self.base_url {
            Some(base) => Ok(base.join(url)?.to_string()),
            None => Ok(url.to_string()),
        }
    }

    /// Fetch `url`, degrading every failure to empty content
    pub fn fetch_sync(&self, url: &str, diagnostics: &mut Diagnostics) -> String {
        let resolved = match self.resolve(url) {
            Ok(resolved) => resolved,
            Err(err) => {
                diagnostics.error(format!("Failed to fetch template src {}: {}", url, err));
                return String::new();
            }
        };
        debug!("fetching {}", resolved);
        match self.fetcher.fetch(&resolved) {
            Ok(text) => text,
            Err(err @ Error::FetchStatus { .. }) => {
                diagnostics.error(err.to_string());
                String::new()
            }
            Err(err) => {
                diagnostics.error(format!("Failed to fetch template src {}: {}", resolved, err));
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fetcher_routes() {
        let fetcher = MemoryFetcher::new()
            .with_page("/a.html", "<p>a</p>")
            .with_status("/gone.html", 410, "Gone");

        assert_eq!(fetcher.fetch("/a.html").unwrap(), "<p>a</p>");
        let err = fetcher.fetch("/gone.html").unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch template src /gone.html: 410 Gone");
        let err = fetcher.fetch("/missing.html").unwrap_err();
        assert!(matches!(err, Error::FetchStatus { status: 404, .. }));
        assert_eq!(fetcher.requests(), vec!["/a.html", "/gone.html", "/missing.html"]);
    }

    #[test]
    fn test_sync_fetch_degrades_to_empty() {
        let fetcher = SyncFetcher::new(MemoryFetcher::new());
        let mut diagnostics = Diagnostics::new();
        assert_eq!(fetcher.fetch_sync("/frag.html", &mut diagnostics), "");
        assert_eq!(
            diagnostics.entries()[0].message,
            "Failed to fetch template src /frag.html: 404 Not Found"
        );
    }

    #[test]
    fn test_sync_fetch_resolves_against_base() {
        let memory = Rc::new(MemoryFetcher::new().with_page("https://example.test/parts/nav.html", "<nav></nav>"));
        let fetcher = SyncFetcher::new(memory.clone())
            .with_base_url("https://example.test/pages/index.html")
            .unwrap();
        let mut diagnostics = Diagnostics::new();

        assert_eq!(fetcher.fetch_sync("../parts/nav.html", &mut diagnostics), "<nav></nav>");
        assert!(diagnostics.entries().is_empty());
        assert_eq!(memory.requests(), vec!["https://example.test/parts/nav.html"]);
    }

    #[test]
    fn test_relative_without_base_passes_through() {
        let fetcher = SyncFetcher::new(MemoryFetcher::new());
        assert_eq!(fetcher.resolve("/x.html").unwrap(), "/x.html");
    }

    #[test]
    fn test_unparseable_file_url() {
        let fetcher = HttpFetcher::new().unwrap();
        let mut diagnostics = Diagnostics::new();
        let text = SyncFetcher::new(fetcher).fetch_sync("file://remote-host/x.html", &mut diagnostics);
        assert_eq!(text, "");
        assert_eq!(diagnostics.errors().count(), 1);
    }
}
