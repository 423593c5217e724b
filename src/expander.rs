//! Fragment expansion
//!
//! Expansion drains a detached fragment one child at a time, promoting
//! scripts, and inserts each child immediately before an anchor node. The
//! anchor stays put while content piles up in front of it, so the inserted
//! nodes keep their source order and each promoted script runs as soon as it
//! lands, after everything that precedes it. Directives inside a node are
//! connected before the next node is inserted.

use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::polyfill::Context;
use crate::script;

/// Parse `markup` into a detached template and expand it before `anchor`
pub(crate) fn expand(ctx: &mut Context<'_>, markup: &str, anchor: NodeId) -> Result<()> {
    let container = ctx.document.create_element("template");
    ctx.document.set_inner_html(container, markup)?;
    let content = ctx
        .document
        .template_contents(container)
        .ok_or_else(|| Error::dom_static("template element has no content fragment"))?;
    drain(ctx, content, anchor)
}

/// Move every child of `fragment` in front of `anchor`, in order
///
/// Returns only once the fragment is empty.
pub(crate) fn drain(ctx: &mut Context<'_>, fragment: NodeId, anchor: NodeId) -> Result<()> {
    let parent = ctx
        .document
        .parent(anchor)
        .ok_or_else(|| Error::dom_static("insertion anchor is not attached"))?;
    let config = ctx.config;
    while let Some(first) = ctx.document.first_child(fragment) {
        let node = script::promote(ctx.document, first, &config.template_tag)?;
        ctx.document.insert_before(parent, node, Some(anchor))?;
        ctx.upgrade(node)?;
    }
    Ok(())
}
