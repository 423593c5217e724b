//! Core configuration and directive types
//!
//! This module contains the polyfill configuration and the per-element
//! configuration records that directive elements read once when they are
//! connected.
//!
//! # Key Types
//!
//! - [`PolyfillConfig`] - tag names, include relation and fetch settings
//! - [`ShadowRootMode`] - the two recognized shadow attachment modes
//! - [`TemplateAttributes`] / [`TemplateMode`] - validated template configuration
//! - [`IncludeAttributes`] - include directive configuration
//!
//! ```rust,ignore
//! use html_include::PolyfillConfig;
//!
//! let config = PolyfillConfig::default()
//!     .with_template_tag("my-template")
//!     .with_base_url("https://example.com/pages/");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

pub const REL_ATTR: &str = "rel";
pub const HREF_ATTR: &str = "href";
pub const SRC_ATTR: &str = "src";
pub const INLINED_ATTR: &str = "inlined";
pub const SHADOW_ROOT_MODE_ATTR: &str = "shadowrootmode";

/// Configuration for the polyfill
///
/// Every field has a default, so a JSON configuration only needs to name
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyfillConfig {
    /// Tag name of the include directive
    pub include_tag: String,
    /// `rel` token that turns an include element into a directive
    pub include_relation: String,
    /// Tag name of the extended template directive
    pub template_tag: String,
    /// Base URL that relative `href`/`src` locators are resolved against
    pub base_url: Option<String>,
    /// User agent sent by the HTTP fetcher
    pub user_agent: String,
}

impl Default for PolyfillConfig {
    fn default() -> Self {
        Self {
            include_tag: "x-link".to_string(),
            include_relation: "include".to_string(),
            template_tag: "x-template".to_string(),
            base_url: None,
            user_agent: concat!("html-include/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PolyfillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_include_tag(mut self, tag: impl Into<String>) -> Self {
        self.include_tag = tag.into().to_ascii_lowercase();
        self
    }

    pub fn with_include_relation(mut self, relation: impl Into<String>) -> Self {
        self.include_relation = relation.into();
        self
    }

    pub fn with_template_tag(mut self, tag: impl Into<String>) -> Self {
        self.template_tag = tag.into().to_ascii_lowercase();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check that the configuration describes two distinct directives
    pub fn validate(&self) -> Result<()> {
        if self.include_tag.is_empty() || self.template_tag.is_empty() {
            return Err(Error::config_owned(
                "directive tag names must not be empty".to_string(),
            ));
        }
        if self.include_tag.eq_ignore_ascii_case(&self.template_tag) {
            return Err(Error::config_owned(format!(
                "include and template directives share the tag name '{}'",
                self.include_tag
            )));
        }
        if let Some(base) = &self.base_url {
            url::Url::parse(base)?;
        }
        Ok(())
    }
}

/// Mode of an attached shadow root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    /// Parse an attribute value, ignoring ASCII case
    ///
    /// Values other than `open` and `closed` are not recognized.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("open") {
            Some(ShadowRootMode::Open)
        } else if value.eq_ignore_ascii_case("closed") {
            Some(ShadowRootMode::Closed)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

impl fmt::Display for ShadowRootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Include directive attributes, read once at attach time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeAttributes {
    pub relation: String,
    pub href: Option<String>,
}

impl IncludeAttributes {
    pub fn read(document: &Document, element: NodeId) -> Self {
        Self {
            relation: document.attr(element, REL_ATTR).unwrap_or_default().to_string(),
            href: document
                .attr(element, HREF_ATTR)
                .filter(|href| !href.is_empty())
                .map(str::to_string),
        }
    }

    /// Whether the element is an include directive for the given token
    pub fn is_include(&self, relation: &str) -> bool {
        self.relation == relation
    }
}

/// Template directive attributes, read once at attach time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAttributes {
    pub src: Option<String>,
    pub shadow_mode: Option<ShadowRootMode>,
    pub inlined: bool,
}

/// The single expansion branch a template takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    /// Splice content in place of the element
    Inline,
    /// Attach content as a shadow root of the parent
    ShadowRoot(ShadowRootMode),
    /// Keep content unexpanded in the internal template
    Inert,
}

impl TemplateAttributes {
    pub fn read(document: &Document, element: NodeId) -> Self {
        Self {
            src: document
                .attr(element, SRC_ATTR)
                .filter(|src| !src.is_empty())
                .map(str::to_string),
            shadow_mode: document
                .attr(element, SHADOW_ROOT_MODE_ATTR)
                .and_then(ShadowRootMode::parse),
            inlined: document.has_attr(element, INLINED_ATTR),
        }
    }

    /// Select the expansion branch
    ///
    /// `inlined` takes precedence over the shadow root mode, and declaring
    /// both is rejected.
    pub fn mode(&self) -> Result<TemplateMode> {
        match (self.inlined, self.shadow_mode) {
            (true, Some(_)) => Err(Error::conflict_static(
                "a template cannot declare both shadowrootmode and inlined",
            )),
            (true, None) => Ok(TemplateMode::Inline),
            (false, Some(mode)) => Ok(TemplateMode::ShadowRoot(mode)),
            (false, None) => Ok(TemplateMode::Inert),
        }
    }
}

/// Lifecycle of an include directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeState {
    Declared,
    Upgraded,
    Expanding,
    Removed,
    /// The `rel` token did not match; the element stays a plain element
    Inert,
    /// Expansion stopped on an error; the error was logged
    Failed,
}

/// Lifecycle of a template directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateState {
    Declared,
    Expanded,
    /// Expansion was abandoned: conflicting attributes or an occupied shadow host
    Failed,
}
