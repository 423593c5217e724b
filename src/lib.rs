//! HTML include and extended template expansion
//!
//! This crate expands two kinds of directive elements in an HTML document:
//!
//! - `<x-link rel="include" href="...">` is replaced by the fetched markup
//! - `<x-template>` either splices its content in place (`inlined`), attaches
//!   it as a declarative shadow root of its parent (`shadowrootmode`), or keeps
//!   it unexpanded in an internal template
//!
//! Fetches are blocking so that included content, and the scripts inside it,
//! take effect in document order. Scripts in fetched markup are recreated
//! before insertion so that each one runs exactly once.
//!
//! # Examples
//!
//! ```rust,ignore
//! use html_include::{Document, MemoryFetcher, Polyfill};
//!
//! let mut document = Document::parse(r#"
//!     <body>
//!         <x-link rel="include" href="/header.html"></x-link>
//!         <div><x-template shadowrootmode="open" src="/card.html"></x-template></div>
//!     </body>
//! "#)?;
//!
//! let fetcher = MemoryFetcher::new()
//!     .with_page("/header.html", "<header>Site</header>")
//!     .with_page("/card.html", "<b>hi</b>");
//!
//! let mut polyfill = Polyfill::builder().with_fetcher(fetcher).build()?;
//! polyfill.load(&mut document)?;
//! println!("{}", document.to_html());
//! ```

pub mod error;
pub mod types;
pub mod dom;
mod node_ext;
mod parser;
mod serializer;
pub mod script;
pub mod fetch;
pub mod diagnostics;
mod expander;
pub mod scheduler;
pub mod include;
pub mod template;
pub mod polyfill;
pub mod builder;
pub mod test_utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{
    IncludeState, PolyfillConfig, ShadowRootMode, TemplateAttributes, TemplateMode,
    TemplateState,
};
pub use dom::{Document, NodeId, ScriptState};
pub use script::ScriptRunner;
pub use fetch::{Fetcher, HttpFetcher, MemoryFetcher, SyncFetcher};
pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use polyfill::Polyfill;
pub use builder::PolyfillBuilder;

/// Expand every directive of a document and serialize the result
///
/// Deferred work is run before serializing, as if one frame had passed.
pub fn expand_html<F: Fetcher + 'static>(html: &str, fetcher: F) -> Result<String> {
    let mut document = Document::parse(html)?;
    let mut polyfill = Polyfill::builder().with_fetcher(fetcher).build()?;
    polyfill.load(&mut document)?;
    Ok(document.to_html())
}
