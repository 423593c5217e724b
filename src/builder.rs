//! Builder pattern API for assembling a [`Polyfill`]
//!
//! ```rust,ignore
//! use html_include::{MemoryFetcher, Polyfill};
//!
//! let polyfill = Polyfill::builder()
//!     .with_template_tag("my-template")
//!     .with_base_url("https://example.com/")
//!     .with_fetcher(MemoryFetcher::new().with_page("https://example.com/a.html", "<p>a</p>"))
//!     .build()?;
//! ```
//!
//! Without an explicit fetcher the polyfill fetches over HTTP with the
//! configured user agent.

use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher, SyncFetcher};
use crate::polyfill::Polyfill;
use crate::types::PolyfillConfig;

#[derive(Default)]
pub struct PolyfillBuilder {
    config: PolyfillConfig,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl PolyfillBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: PolyfillConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fetcher<F: Fetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn with_include_tag(mut self, tag: impl Into<String>) -> Self {
        self.config = self.config.with_include_tag(tag);
        self
    }

    pub fn with_include_relation(mut self, relation: impl Into<String>) -> Self {
        self.config = self.config.with_include_relation(relation);
        self
    }

    pub fn with_template_tag(mut self, tag: impl Into<String>) -> Self {
        self.config = self.config.with_template_tag(tag);
        self
    }

    pub fn build(self) -> Result<Polyfill> {
        self.config.validate()?;

        let fetcher: Box<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(HttpFetcher::with_user_agent(&self.config.user_agent)?),
        };
        let mut sync_fetcher = SyncFetcher::from_boxed(fetcher);
        if let Some(base_url) = &self.config.base_url {
            sync_fetcher = sync_fetcher.with_base_url(base_url)?;
        }
        Ok(Polyfill::from_parts(self.config, sync_fetcher))
    }
}
