use dom_query::{Node, NodeData};

/// What a parsed `dom_query` node carries, detached from the parser's tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    /// Doctypes and processing instructions are dropped on import
    Other,
}

/// Extension trait for dom_query::Node to read nodes out of the parser's tree
pub(crate) trait NodeExt<'a> {
    fn parsed(&self) -> ParsedNode;
    fn template_content(&self) -> Option<Node<'a>>;
}

impl<'a> NodeExt<'a> for Node<'a> {
    fn parsed(&self) -> ParsedNode {
        self.query(|node| match &node.data {
            NodeData::Element(element) => ParsedNode::Element {
                name: element.name.local.to_string(),
                attrs: element
                    .attrs
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect(),
            },
            NodeData::Text { contents } => ParsedNode::Text(contents.to_string()),
            NodeData::Comment { contents } => ParsedNode::Comment(contents.to_string()),
            _ => ParsedNode::Other,
        })
        .unwrap_or(ParsedNode::Other)
    }

    fn template_content(&self) -> Option<Node<'a>> {
        // Template children live in a separate fragment, not in the child list
        self.query(|node| node.as_element().and_then(|elem| elem.template_contents))
            .flatten()
            .map(|contents_id| Node::new(contents_id, self.tree))
    }
}
