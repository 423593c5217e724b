//! Error handling for html-include
//!
//! This module provides the error type shared by the document model, the
//! fetchers and the directive elements.
//!
//! # Error Types
//!
//! - [`Error::ConfigConflict`] - a template declares both `inlined` and a shadow root mode
//! - [`Error::ShadowHostConflict`] - a host already carries a declarative shadow root
//! - [`Error::FetchStatus`] - a fetch answered with a status other than 200
//! - [`Error::HttpError`] - the request itself failed
//! - [`Error::DomError`] - invalid tree manipulation
//! - [`Error::ParseError`] - markup could not be imported
//! - [`Error::InvalidState`] - a directive element was connected twice
//! - [`Error::ConfigError`] - invalid polyfill configuration
//!
//! Only [`Error::ConfigConflict`] is fatal for a document. The other
//! conditions are contained by the directive that hit them: fetch failures
//! degrade to empty content and shadow host conflicts are logged and skipped.
//!
//! # Usage
//!
//! ```rust,ignore
//! use html_include::{Error, Polyfill};
//!
//! match polyfill.run(&mut document) {
//!     Ok(()) => {}
//!     Err(Error::ConfigConflict(msg)) => eprintln!("fix the markup: {}", msg),
//!     Err(err) => eprintln!("expansion failed: {}", err),
//! }
//! ```

use std::borrow::Cow;
use thiserror::Error;

/// Error type for all html-include operations
#[derive(Error, Debug)]
pub enum Error {
    /// Conflicting directive attributes
    ///
    /// Raised when a template declares both `inlined` and a recognized
    /// `shadowrootmode`. The element is left untouched.
    #[error("Configuration conflict: {0}")]
    ConfigConflict(Cow<'static, str>),

    /// A second declarative shadow root was requested for one host
    #[error("Shadow host conflict: {0}")]
    ShadowHostConflict(Cow<'static, str>),

    /// The server answered with a non-success status
    #[error("Failed to fetch template src {url}: {status} {status_text}")]
    FetchStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    /// HTTP client and networking errors
    #[error("HTTP error: {0}")]
    HttpError(Cow<'static, str>),

    /// DOM manipulation and traversal errors
    #[error("DOM error: {0}")]
    DomError(Cow<'static, str>),

    /// Markup parsing and import errors
    #[error("Parse error: {0}")]
    ParseError(Cow<'static, str>),

    /// A directive element was driven through a transition it already made
    #[error("Invalid state: {0}")]
    InvalidState(Cow<'static, str>),

    /// Invalid polyfill configuration
    #[error("Config error: {0}")]
    ConfigError(Cow<'static, str>),

    /// JSON parsing errors, raised when loading a configuration
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL resolution errors
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// File system and I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration conflict with a static string
    pub fn conflict_static(msg: &'static str) -> Self {
        Error::ConfigConflict(Cow::Borrowed(msg))
    }

    /// Create a shadow host conflict with a static string
    pub fn shadow_host_static(msg: &'static str) -> Self {
        Error::ShadowHostConflict(Cow::Borrowed(msg))
    }

    /// Create an HTTP error with an owned string
    pub fn http_owned(msg: String) -> Self {
        Error::HttpError(Cow::Owned(msg))
    }

    /// Create a DOM error with a static string
    ///
    /// Use this for compile-time known error messages to avoid allocations.
    pub fn dom_static(msg: &'static str) -> Self {
        Error::DomError(Cow::Borrowed(msg))
    }

    /// Create a DOM error with an owned string
    pub fn dom_owned(msg: String) -> Self {
        Error::DomError(Cow::Owned(msg))
    }

    /// Create a parse error with a static string
    pub fn parse_static(msg: &'static str) -> Self {
        Error::ParseError(Cow::Borrowed(msg))
    }

    /// Create an invalid state error with a static string
    pub fn state_static(msg: &'static str) -> Self {
        Error::InvalidState(Cow::Borrowed(msg))
    }

    /// Create a configuration error with an owned string
    pub fn config_owned(msg: String) -> Self {
        Error::ConfigError(Cow::Owned(msg))
    }

    /// Whether this error must abort document processing
    ///
    /// Everything else is handled locally by the directive that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigConflict(_))
    }
}

/// Result type alias for html-include operations
pub type Result<T> = std::result::Result<T, Error>;
