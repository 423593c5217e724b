//! The extended template directive
//!
//! `<x-template>` wraps a private `<template>` container and takes exactly
//! one of three branches when connected:
//!
//! - `inlined`: content is spliced in place of the element
//! - `shadowrootmode="open|closed"`: content becomes a shadow root of the parent
//! - neither: content is stored, unexpanded, in the internal template
//!
//! Content comes from `src` when present. Otherwise inline mode uses the
//! element's own markup right away, while shadow root and inert modes copy
//! it on the next frame, once the parse pass that authored it has finished.

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::expander;
use crate::polyfill::Context;
use crate::types::{ShadowRootMode, TemplateAttributes, TemplateMode, TemplateState};

pub const TEMPLATE_ANCHOR: &str = "html-template-insertion-point";

#[derive(Debug)]
pub struct TemplateElement {
    node: NodeId,
    container: NodeId,
    state: TemplateState,
}

impl TemplateElement {
    pub(crate) fn new(document: &mut Document, node: NodeId) -> Self {
        Self {
            node,
            container: document.create_element("template"),
            state: TemplateState::Declared,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> TemplateState {
        self.state
    }

    /// The internal template's content fragment
    pub fn content(&self, document: &Document) -> Option<NodeId> {
        document.template_contents(self.container)
    }

    pub(crate) fn connected(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if self.state != TemplateState::Declared {
            return Err(Error::state_static("template directive was already connected"));
        }

        let attrs = TemplateAttributes::read(ctx.document, self.node);
        let mode = match attrs.mode() {
            Ok(mode) => mode,
            Err(err) => {
                self.state = TemplateState::Failed;
                ctx.diagnostics.error(err.to_string());
                return Err(err);
            }
        };

        let src = attrs.src.as_deref();
        let expanded = match mode {
            TemplateMode::Inline => self.expand_inline(ctx, src).map(|()| true),
            TemplateMode::ShadowRoot(mode) => self.attach_shadow_root(ctx, mode, src),
            TemplateMode::Inert => self.store_inert(ctx, src).map(|()| true),
        };
        self.state = match expanded {
            Ok(true) => TemplateState::Expanded,
            Ok(false) | Err(_) => TemplateState::Failed,
        };
        expanded.map(|_| ())
    }

    fn expand_inline(&mut self, ctx: &mut Context<'_>, src: Option<&str>) -> Result<()> {
        let parent = ctx
            .document
            .parent(self.node)
            .ok_or_else(|| Error::dom_static("template directive is not attached"))?;
        let anchor = ctx.document.create_comment(TEMPLATE_ANCHOR);
        ctx.document.insert_before(parent, anchor, Some(self.node))?;
        ctx.document.remove(self.node);

        let markup = match src {
            Some(src) => ctx.fetch(src),
            None => ctx.document.inner_html(self.node),
        };
        ctx.document.set_inner_html(self.container, &markup)?;
        let content = self
            .content(ctx.document)
            .ok_or_else(|| Error::dom_static("template container has no content fragment"))?;
        expander::drain(ctx, content, anchor)?;

        ctx.document.remove(anchor);
        Ok(())
    }

    /// Returns `false` when no shadow root could be attached to the parent
    fn attach_shadow_root(
        &mut self,
        ctx: &mut Context<'_>,
        mode: ShadowRootMode,
        src: Option<&str>,
    ) -> Result<bool> {
        let host = ctx
            .document
            .parent(self.node)
            .ok_or_else(|| Error::dom_static("template directive is not attached"))?;
        ctx.document.remove(self.node);

        ctx.diagnostics
            .info(format!("Attaching shadow root with mode {}", mode));
        let shadow_root = match ctx.document.attach_shadow(host, mode) {
            Ok(shadow_root) => shadow_root,
            Err(err) if !err.is_fatal() => {
                ctx.diagnostics.error(err.to_string());
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match src {
            Some(src) => {
                let markup = ctx.fetch(src);
                ctx.document.set_inner_html(shadow_root, &markup)?;
                ctx.upgrade(shadow_root)?;
            }
            None => {
                let template = self.node;
                ctx.frames.schedule(move |document| {
                    if !document.is_connected(host) {
                        debug!("shadow host {:?} left the document, skipping", host);
                        return Ok(());
                    }
                    let markup = document.inner_html(template);
                    document.set_inner_html(shadow_root, &markup)
                });
            }
        }
        Ok(true)
    }

    fn store_inert(&mut self, ctx: &mut Context<'_>, src: Option<&str>) -> Result<()> {
        match src {
            Some(src) => {
                let markup = ctx.fetch(src);
                ctx.document.set_inner_html(self.container, &markup)?;
            }
            None => {
                let template = self.node;
                let container = self.container;
                ctx.frames.schedule(move |document| {
                    if !document.is_connected(template) {
                        debug!("template {:?} left the document, skipping", template);
                        return Ok(());
                    }
                    let markup = document.inner_html(template);
                    document.set_inner_html(container, &markup)
                });
            }
        }
        Ok(())
    }
}
