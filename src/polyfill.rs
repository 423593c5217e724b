//! Directive registry and document driver
//!
//! A [`Polyfill`] plays the part of the browser's custom element registry
//! and parser for one [`Document`]: [`Polyfill::run`] walks the document in
//! tree order, running parser-inserted scripts and connecting directive
//! elements as it reaches them, and [`Polyfill::run_frame`] runs the work
//! the directives deferred to the next frame.
//!
//! ```rust,ignore
//! use html_include::{Document, MemoryFetcher, Polyfill};
//!
//! let mut document = Document::parse(r#"<x-link rel="include" href="/nav.html"></x-link>"#)?;
//! let mut polyfill = Polyfill::builder()
//!     .with_fetcher(MemoryFetcher::new().with_page("/nav.html", "<nav></nav>"))
//!     .build()?;
//! polyfill.load(&mut document)?;
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::builder::PolyfillBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dom::{Document, NodeId, ScriptState};
use crate::error::{Error, Result};
use crate::fetch::SyncFetcher;
use crate::include::IncludeElement;
use crate::scheduler::FrameQueue;
use crate::template::TemplateElement;
use crate::types::{IncludeState, PolyfillConfig, TemplateState};

/// Directive elements seen so far, keyed by node
#[derive(Debug, Default)]
pub(crate) struct Registry {
    includes: HashMap<NodeId, IncludeElement>,
    templates: HashMap<NodeId, TemplateElement>,
}

/// What a directive needs while it is being connected
pub(crate) struct Context<'a> {
    pub(crate) document: &'a mut Document,
    pub(crate) frames: &'a mut FrameQueue,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) config: &'a PolyfillConfig,
    registry: &'a mut Registry,
    fetcher: &'a SyncFetcher,
}

impl<'a> Context<'a> {
    pub(crate) fn fetch(&mut self, url: &str) -> String {
        self.fetcher.fetch_sync(url, self.diagnostics)
    }

    /// Run pending scripts and connect new directives under `root`
    ///
    /// Works in tree order and stops as soon as `root` leaves the document.
    /// Errors stay with the directive that raised them: they are logged and
    /// the directive is marked failed. Only fatal errors are returned.
    pub(crate) fn upgrade(&mut self, root: NodeId) -> Result<()> {
        while let Some(step) = self.next_step(root) {
            match step {
                Step::Script(script) => self.document.execute_script(script),
                Step::Directive(element) => match self.connect(element) {
                    Err(err) if !err.is_fatal() => {
                        self.diagnostics.error(err.to_string());
                    }
                    result => result?,
                },
            }
        }
        Ok(())
    }

    /// Next pending script or unconnected directive under `root`
    ///
    /// Shadow trees are visited before the host's children. The children of
    /// a template directive are its content and are never visited.
    fn next_step(&self, root: NodeId) -> Option<Step> {
        if !self.document.is_connected(root) {
            return None;
        }
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(tag) = self.document.tag_name(node) {
                if self.document.script_state(node) == Some(ScriptState::ParserInserted) {
                    return Some(Step::Script(node));
                }
                if tag == self.config.include_tag && !self.registry.includes.contains_key(&node) {
                    return Some(Step::Directive(node));
                }
                if tag == self.config.template_tag {
                    if !self.registry.templates.contains_key(&node) {
                        return Some(Step::Directive(node));
                    }
                    continue;
                }
            }
            stack.extend(self.document.children(node).iter().rev().copied());
            if let Some(shadow_root) = self.document.shadow_root(node) {
                stack.push(shadow_root);
            }
        }
        None
    }

    /// Connect one directive element, registering it on first sight
    ///
    /// The directive is taken out of the registry while it runs so that its
    /// expansion can connect the directives it brings in.
    fn connect(&mut self, element: NodeId) -> Result<()> {
        let tag = self
            .document
            .tag_name(element)
            .map(str::to_string)
            .ok_or_else(|| Error::dom_static("only elements can be directives"))?;

        if tag == self.config.include_tag {
            let mut include = self
                .registry
                .includes
                .remove(&element)
                .unwrap_or_else(|| IncludeElement::new(element));
            let result = include.connected(self);
            self.registry.includes.insert(element, include);
            result
        } else if tag == self.config.template_tag {
            let mut template = match self.registry.templates.remove(&element) {
                Some(template) => template,
                None => TemplateElement::new(self.document, element),
            };
            let result = template.connected(self);
            self.registry.templates.insert(element, template);
            result
        } else {
            Err(Error::dom_owned(format!("<{}> is not a directive element", tag)))
        }
    }
}

enum Step {
    Script(NodeId),
    Directive(NodeId),
}

/// Expands include and template directives of one document
#[derive(Debug)]
pub struct Polyfill {
    config: PolyfillConfig,
    fetcher: SyncFetcher,
    frames: FrameQueue,
    diagnostics: Diagnostics,
    registry: Registry,
}

impl Polyfill {
    /// Create a polyfill that fetches over HTTP
    pub fn new(config: PolyfillConfig) -> Result<Self> {
        PolyfillBuilder::new().with_config(config).build()
    }

    pub fn builder() -> PolyfillBuilder {
        PolyfillBuilder::new()
    }

    pub(crate) fn from_parts(config: PolyfillConfig, fetcher: SyncFetcher) -> Self {
        Self {
            config,
            fetcher,
            frames: FrameQueue::new(),
            diagnostics: Diagnostics::new(),
            registry: Registry::default(),
        }
    }

    pub fn config(&self) -> &PolyfillConfig {
        &self.config
    }

    pub(crate) fn context<'a>(&'a mut self, document: &'a mut Document) -> Context<'a> {
        Context {
            document,
            frames: &mut self.frames,
            diagnostics: &mut self.diagnostics,
            config: &self.config,
            registry: &mut self.registry,
            fetcher: &self.fetcher,
        }
    }

    /// Process the document the way the parser would
    ///
    /// Parser-inserted scripts run and directives connect in tree order,
    /// including directives brought in by earlier expansions. A directive
    /// that fails is logged and skipped, except for a template declaring
    /// both `inlined` and `shadowrootmode`, which stops the pass with
    /// [`Error::ConfigConflict`].
    pub fn run(&mut self, document: &mut Document) -> Result<()> {
        let root = document.root();
        self.context(document).upgrade(root)
    }

    /// Run the callbacks deferred to the next frame
    pub fn run_frame(&mut self, document: &mut Document) -> Result<()> {
        debug!("running {} frame callbacks", self.frames.len());
        self.frames.run(document)
    }

    /// [`run`](Self::run) followed by [`run_frame`](Self::run_frame)
    pub fn load(&mut self, document: &mut Document) -> Result<()> {
        self.run(document)?;
        self.run_frame(document)
    }

    /// Connect a single directive element
    ///
    /// Each directive connects once; connecting it again is an
    /// [`Error::InvalidState`] and changes nothing. Errors of this element
    /// are returned rather than logged.
    pub fn connect(&mut self, document: &mut Document, element: NodeId) -> Result<()> {
        self.context(document).connect(element)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    pub fn clear_diagnostics(&mut self) {
        self.diagnostics.clear();
    }

    /// Content fragment of a template directive's internal template
    pub fn template_content(&self, document: &Document, element: NodeId) -> Option<NodeId> {
        self.registry
            .templates
            .get(&element)
            .and_then(|template| template.content(document))
    }

    pub fn include_state(&self, element: NodeId) -> Option<IncludeState> {
        self.registry.includes.get(&element).map(IncludeElement::state)
    }

    pub fn template_state(&self, element: NodeId) -> Option<TemplateState> {
        self.registry.templates.get(&element).map(TemplateElement::state)
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }
}
