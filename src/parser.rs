use dom_query::{Document as HtmlDocument, Node};
use indexmap::IndexMap;

use crate::dom::{Document, NodeId, ScriptState};
use crate::error::{Error, Result};
use crate::node_ext::{NodeExt, ParsedNode};

/// Bridge from the html5ever-backed `dom_query` parser into the arena document
pub(crate) struct Parser {
    document: HtmlDocument,
}

impl Parser {
    pub fn new(html: &str) -> Self {
        Self {
            document: HtmlDocument::from(html),
        }
    }

    /// Parse markup the way `template.innerHTML = markup` does
    pub fn fragment(markup: &str) -> Self {
        Self::new(&format!("<template>{}</template>", markup))
    }

    /// Import the parsed `<html>` element as the child of the document root
    pub fn import_document(&self, target: &mut Document) -> Result<()> {
        let html = self.document.select("html");
        let html_node = html
            .nodes()
            .first()
            .ok_or_else(|| Error::parse_static("No html element found"))?;

        let root = target.root();
        let mut importer = Importer {
            target,
            scripts: ScriptState::ParserInserted,
        };
        if let Some(id) = importer.import(html_node) {
            importer.target.append_raw(root, id);
        }
        Ok(())
    }

    /// Import the wrapper template's content as detached nodes
    ///
    /// Scripts produced this way are inert.
    pub fn import_fragment(&self, target: &mut Document) -> Result<Vec<NodeId>> {
        let templates = self.document.select("template");
        let template_node = templates
            .nodes()
            .first()
            .ok_or_else(|| Error::parse_static("No template element found"))?;
        let contents = template_node
            .template_content()
            .ok_or_else(|| Error::parse_static("Template element has no content"))?;

        let mut importer = Importer {
            target,
            scripts: ScriptState::Inert,
        };
        Ok(contents
            .children()
            .iter()
            .filter_map(|child| importer.import(child))
            .collect())
    }
}

struct Importer<'d> {
    target: &'d mut Document,
    scripts: ScriptState,
}

impl<'d> Importer<'d> {
    fn import(&mut self, node: &Node) -> Option<NodeId> {
        match node.parsed() {
            ParsedNode::Element { name, attrs } => {
                let attrs: IndexMap<String, String> = attrs.into_iter().collect();
                let id = self.target.create_element_with(&name, attrs, self.scripts);
                let (container, children) = match node.template_content() {
                    Some(contents) => (self.target.template_contents(id)?, contents.children()),
                    None => (id, node.children()),
                };
                for child in &children {
                    if let Some(child_id) = self.import(child) {
                        self.target.append_raw(container, child_id);
                    }
                }
                Some(id)
            }
            ParsedNode::Text(text) => Some(self.target.create_text(&text)),
            ParsedNode::Comment(text) => Some(self.target.create_comment(&text)),
            ParsedNode::Other => None,
        }
    }
}
