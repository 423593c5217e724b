//! HTML serialization of arena nodes
//!
//! Follows the HTML fragment serialization rules closely enough for the
//! markup this crate produces: void elements have no end tag, raw text
//! elements are written unescaped, and template elements serialize their
//! content fragment. Shadow roots are not written out with their host.

use crate::dom::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub(crate) fn serialize_node(document: &Document, id: NodeId, out: &mut String) {
    match document.data(id) {
        NodeData::Document | NodeData::Fragment | NodeData::ShadowRoot { .. } => {
            serialize_children(document, id, out);
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&element.name.as_str()) {
                return;
            }
            let container = element.template_contents.unwrap_or(id);
            serialize_children(document, container, out);
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
        NodeData::Text(text) => {
            let raw = document
                .parent(id)
                .and_then(|parent| document.tag_name(parent))
                .map(|name| RAW_TEXT_ELEMENTS.contains(&name))
                .unwrap_or(false);
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

pub(crate) fn serialize_children(document: &Document, id: NodeId, out: &mut String) {
    for &child in document.children(id) {
        serialize_node(document, child, out);
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
