//! Script execution and promotion
//!
//! Script elements produced by markup assignment never run, even after they
//! are moved into the live document. [`promote`] swaps them for freshly
//! created script elements carrying the same text, which run once when
//! inserted.

use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Executes script text on behalf of a [`Document`]
///
/// The runner sees the document as it stands when the script runs, so it can
/// observe content inserted before the script.
pub trait ScriptRunner {
    fn run(&mut self, source: &str, document: &Document);
}

impl<F> ScriptRunner for F
where
    F: FnMut(&str, &Document),
{
    fn run(&mut self, source: &str, document: &Document) {
        self(source, document)
    }
}

/// Return a node whose scripts will run once it is connected
///
/// A script element is replaced by a new script element with the same text
/// and removed from its parent; the new element is returned. Scripts nested
/// inside any other node are replaced in place and the node itself is
/// returned. Elements named `inert_tag` hold template content, so neither
/// they nor anything below them is touched.
pub fn promote(document: &mut Document, node: NodeId, inert_tag: &str) -> Result<NodeId> {
    let tag = document.tag_name(node).map(str::to_string);
    match tag.as_deref() {
        Some("script") => {
            let script = recreate(document, node)?;
            document.remove(node);
            return Ok(script);
        }
        Some(tag) if tag == inert_tag => return Ok(node),
        _ => {}
    }

    for original in nested_scripts(document, node, inert_tag) {
        let script = recreate(document, original)?;
        if let Some(parent) = document.parent(original) {
            document.insert_before(parent, script, Some(original))?;
        }
        document.remove(original);
    }
    Ok(node)
}

/// Scripts below `node` in tree order, skipping `inert_tag` subtrees
fn nested_scripts(document: &Document, node: NodeId, inert_tag: &str) -> Vec<NodeId> {
    let mut scripts = Vec::new();
    let mut stack: Vec<NodeId> = document.children(node).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        match document.tag_name(id) {
            Some("script") => scripts.push(id),
            Some(tag) if tag == inert_tag => {}
            _ => stack.extend(document.children(id).iter().rev().copied()),
        }
    }
    scripts
}

fn recreate(document: &mut Document, original: NodeId) -> Result<NodeId> {
    let text = document.text_content(original);
    let script = document.create_element("script");
    document.set_text_content(script, &text)?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ScriptState;

    #[test]
    fn test_promote_script() {
        let mut document = Document::new();
        let fragment = document.create_fragment();
        let template = document.create_element("template");
        document.set_inner_html(template, "<script type=\"module\">go()</script>").unwrap();
        let content = document.template_contents(template).unwrap();
        let original = document.children(content)[0];
        document.append_child(fragment, original).unwrap();

        let promoted = promote(&mut document, original, "x-template").unwrap();
        assert_ne!(promoted, original);
        assert_eq!(document.script_state(promoted), Some(ScriptState::Fresh));
        assert_eq!(document.text_content(promoted), "go()");
        assert_eq!(document.parent(original), None);
        assert!(document.children(fragment).is_empty());
    }

    #[test]
    fn test_promote_leaves_other_nodes() {
        let mut document = Document::new();
        let p = document.create_element("p");
        assert_eq!(promote(&mut document, p, "x-template").unwrap(), p);

        let text = document.create_text("plain");
        assert_eq!(promote(&mut document, text, "x-template").unwrap(), text);
    }

    #[test]
    fn test_promote_nested_scripts_in_place() {
        let mut document = Document::new();
        let div = document.create_element("div");
        document
            .set_inner_html(div, "<b>a</b><script>one()</script><i>c</i>")
            .unwrap();
        let inert = document.children(div)[1];
        assert_eq!(document.script_state(inert), Some(ScriptState::Inert));

        assert_eq!(promote(&mut document, div, "x-template").unwrap(), div);
        let replaced = document.children(div)[1];
        assert_ne!(replaced, inert);
        assert_eq!(document.script_state(replaced), Some(ScriptState::Fresh));
        assert_eq!(document.inner_html(div), "<b>a</b><script>one()</script><i>c</i>");
    }

    #[test]
    fn test_promote_skips_template_directive_content() {
        let mut document = Document::new();
        let div = document.create_element("div");
        document
            .set_inner_html(
                div,
                "<x-template><script>stored()</script></x-template><p><script>two()</script></p>",
            )
            .unwrap();
        let directive = document.children(div)[0];
        let stored = document.children(directive)[0];
        let p = document.children(div)[1];
        let nested = document.children(p)[0];

        assert_eq!(promote(&mut document, div, "x-template").unwrap(), div);
        assert_eq!(document.children(directive), &[stored]);
        assert_eq!(document.script_state(stored), Some(ScriptState::Inert));
        assert_ne!(document.children(p)[0], nested);

        assert_eq!(promote(&mut document, directive, "x-template").unwrap(), directive);
        assert_eq!(document.script_state(stored), Some(ScriptState::Inert));
    }
}
