//! The include directive
//!
//! `<x-link rel="include" href="/nav.html">` is replaced by the markup its
//! `href` points at. The element leaves the tree before anything is fetched,
//! so neither inserted scripts nor nested directives ever see it; a comment
//! anchor holds its position while content is inserted and is removed last.

use tracing::debug;

use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::expander;
use crate::polyfill::Context;
use crate::types::{IncludeAttributes, IncludeState};

/// Text of the comment that marks the insertion point during expansion
pub const INCLUDE_ANCHOR: &str = "html-include-insertion-point";

#[derive(Debug)]
pub struct IncludeElement {
    node: NodeId,
    state: IncludeState,
}

impl IncludeElement {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            state: IncludeState::Declared,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> IncludeState {
        self.state
    }

    pub(crate) fn connected(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if self.state != IncludeState::Declared {
            return Err(Error::state_static("include directive was already connected"));
        }
        let result = self.expand(ctx);
        if result.is_err() {
            self.state = IncludeState::Failed;
        }
        result
    }

    fn expand(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let attrs = IncludeAttributes::read(ctx.document, self.node);
        if !attrs.is_include(&ctx.config.include_relation) {
            debug!(
                "element {:?} has rel '{}', not an include directive",
                self.node, attrs.relation
            );
            self.state = IncludeState::Inert;
            return Ok(());
        }

        let parent = ctx
            .document
            .parent(self.node)
            .ok_or_else(|| Error::dom_static("include directive is not attached"))?;
        self.state = IncludeState::Upgraded;

        let anchor = ctx.document.create_comment(INCLUDE_ANCHOR);
        ctx.document.insert_before(parent, anchor, Some(self.node))?;
        ctx.document.remove(self.node);
        self.state = IncludeState::Expanding;

        if let Some(href) = &attrs.href {
            let markup = ctx.fetch(href);
            expander::expand(ctx, &markup, anchor)?;
        }

        ctx.document.remove(anchor);
        self.state = IncludeState::Removed;
        Ok(())
    }
}
