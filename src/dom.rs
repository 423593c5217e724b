//! Arena document model
//!
//! [`Document`] is the live tree the directives mutate. Nodes are addressed by
//! [`NodeId`] handles that stay valid for the lifetime of the document; a
//! removed node is only detached, never freed, so anchors and detached
//! directive elements can still be inspected after expansion.
//!
//! Besides plain tree manipulation the document models the pieces of the
//! platform that expansion depends on:
//!
//! - `<template>` elements own a content fragment that is not part of their
//!   child list
//! - hosts carry at most one shadow root
//! - script elements track whether they may run ([`ScriptState`]) and run
//!   through a pluggable [`ScriptRunner`] when they become connected

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::script::ScriptRunner;
use crate::serializer;
use crate::types::ShadowRootMode;

/// Handle to a node of a [`Document`]
///
/// Handles are only meaningful for the document that created them. Use
/// [`Document::contains`] to check a handle of unknown origin.
///
/// # Panics
///
/// Document methods taking a `NodeId` panic when the handle is out of range
/// for that document, as slice indexing does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Execution state of a script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    /// Created imperatively; runs as soon as it is connected
    Fresh,
    /// Part of the parsed document; runs when the parse pass reaches it
    ParserInserted,
    /// Produced by markup assignment; never runs
    Inert,
    /// Already ran
    Started,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub template_contents: Option<NodeId>,
    pub shadow_root: Option<NodeId>,
    pub script_state: ScriptState,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Fragment,
    ShadowRoot { mode: ShadowRootMode, host: NodeId },
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeData {
    fn is_container(&self) -> bool {
        !matches!(self, NodeData::Text(_) | NodeData::Comment(_))
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A live HTML document
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    runner: Option<Box<dyn ScriptRunner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("script_runner", &self.runner.is_some())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
            runner: None,
        }
    }

    /// Parse a complete HTML document
    ///
    /// Scripts in the markup are parser-inserted: they run when
    /// [`Polyfill::run`](crate::Polyfill::run) reaches them.
    pub fn parse(html: &str) -> Result<Self> {
        let mut document = Self::new();
        Parser::new(html).import_document(&mut document)?;
        Ok(document)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` addresses a node of this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Install the runner that executes scripts
    ///
    /// Without a runner, scripts are still marked as started when they
    /// would have run.
    pub fn set_script_runner<R: ScriptRunner + 'static>(&mut self, runner: R) {
        self.runner = Some(Box::new(runner));
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_with(name, IndexMap::new(), ScriptState::Fresh)
    }

    pub(crate) fn create_element_with(
        &mut self,
        name: &str,
        attrs: IndexMap<String, String>,
        script_state: ScriptState,
    ) -> NodeId {
        let name = name.to_ascii_lowercase();
        let template_contents = if name == "template" {
            Some(self.create_fragment())
        } else {
            None
        };
        self.push(NodeData::Element(ElementData {
            name,
            attrs,
            template_contents,
            shadow_root: None,
            script_state,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&child| child == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|previous| self.children(parent).get(previous).copied())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attrs(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element(id).map(|element| &element.attrs)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(id)
            .ok_or_else(|| Error::dom_static("attributes can only be set on elements"))?;
        element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.shift_remove(name);
        }
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.nodes[id.0].data {
            NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
            NodeData::Document => String::new(),
            _ => {
                let mut out = String::new();
                for node in self.descendants(id) {
                    if let NodeData::Text(text) = &self.nodes[node.0].data {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    /// Replace the children of a node with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        match &mut self.nodes[id.0].data {
            NodeData::Text(data) | NodeData::Comment(data) => {
                *data = text.to_string();
                return Ok(());
            }
            NodeData::Document => {
                return Err(Error::dom_static("cannot set the text of a document"));
            }
            _ => {}
        }
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.insert_before(id, node, None)?;
        }
        Ok(())
    }

    /// Descendants in tree order
    ///
    /// Template contents and shadow trees are separate trees and are not
    /// visited.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Whether the node belongs to the document, directly or through shadow hosts
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            match &self.nodes[current.0].data {
                NodeData::Document => return current == self.root,
                NodeData::ShadowRoot { host, .. } => current = *host,
                _ => match self.parent(current) {
                    Some(parent) => current = parent,
                    None => return false,
                },
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.index_in_parent(id) {
            self.nodes[parent.0].children.remove(index);
        }
        self.nodes[id.0].parent = None;
    }

    /// Remove a node from its parent; a detached node is left as is
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.insert_before(parent, node, None)
    }

    /// Insert `node` into `parent` before `reference`, or last when `reference` is `None`
    ///
    /// The node is moved out of its current parent first. Inserting a
    /// fragment moves its children instead. When the insertion connects
    /// fresh script elements, they run in tree order before this returns.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if !self.nodes[parent.0].data.is_container() {
            return Err(Error::dom_static("text and comment nodes cannot have children"));
        }
        let data = &self.nodes[node.0].data;
        if matches!(data, NodeData::Document | NodeData::ShadowRoot { .. }) {
            return Err(Error::dom_static("documents and shadow roots cannot be inserted"));
        }
        if matches!(data, NodeData::Fragment) {
            for child in self.children(node).to_vec() {
                self.insert_before(parent, child, reference)?;
            }
            return Ok(());
        }
        if self.is_inclusive_ancestor(node, parent) {
            return Err(Error::dom_static("a node cannot be inserted into itself"));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(Error::dom_static("reference node is not a child of the parent"));
            }
        }
        let reference = match reference {
            Some(reference) if reference == node => self.next_sibling(node),
            other => other,
        };

        self.detach(node);
        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|&child| child == reference)
                .ok_or_else(|| Error::dom_static("reference node is not a child of the parent"))?,
            None => self.children(parent).len(),
        };
        self.nodes[parent.0].children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);

        if self.is_connected(parent) {
            self.run_connected_scripts(parent, node);
        }
        Ok(())
    }

    /// Append without running scripts, used while importing parsed markup
    pub(crate) fn append_raw(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        self.nodes[parent.0].children.push(node);
        self.nodes[node.0].parent = Some(parent);
    }

    fn run_connected_scripts(&mut self, parent: NodeId, node: NodeId) {
        // a fresh script that gains children while connected runs as well
        if self.script_state(parent) == Some(ScriptState::Fresh) {
            self.execute_script(parent);
            return;
        }
        let mut subtree = vec![node];
        subtree.extend(self.descendants(node));
        for id in subtree {
            if self.script_state(id) == Some(ScriptState::Fresh) {
                self.execute_script(id);
            }
        }
    }

    /// Execution state of a script element; `None` for anything else
    pub fn script_state(&self, id: NodeId) -> Option<ScriptState> {
        self.element(id)
            .filter(|element| element.name == "script")
            .map(|element| element.script_state)
    }

    /// Run a script element once
    pub(crate) fn execute_script(&mut self, id: NodeId) {
        let source = self.text_content(id);
        match self.element_mut(id) {
            Some(element) if element.script_state != ScriptState::Started => {
                element.script_state = ScriptState::Started;
            }
            _ => return,
        }
        match self.runner.take() {
            Some(mut runner) => {
                runner.run(&source, self);
                self.runner = Some(runner);
            }
            None => debug!("no script runner installed, skipping script {:?}", id),
        }
    }

    /// Content fragment of a `<template>` element
    pub fn template_contents(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).and_then(|element| element.template_contents)
    }

    /// Attach a shadow root to `host`
    ///
    /// A host carries at most one shadow root; a second attachment fails
    /// with [`Error::ShadowHostConflict`] and leaves the first one intact.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId> {
        match self.element(host) {
            None => return Err(Error::dom_static("shadow roots can only be attached to elements")),
            Some(element) if element.shadow_root.is_some() => {
                return Err(Error::shadow_host_static(
                    "host element already has a declarative shadow root",
                ));
            }
            Some(_) => {}
        }
        let shadow_root = self.push(NodeData::ShadowRoot { mode, host });
        if let Some(element) = self.element_mut(host) {
            element.shadow_root = Some(shadow_root);
        }
        Ok(shadow_root)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host).and_then(|element| element.shadow_root)
    }

    pub fn shadow_root_mode(&self, shadow_root: NodeId) -> Option<ShadowRootMode> {
        match &self.nodes[shadow_root.0].data {
            NodeData::ShadowRoot { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    pub fn shadow_host(&self, shadow_root: NodeId) -> Option<NodeId> {
        match &self.nodes[shadow_root.0].data {
            NodeData::ShadowRoot { host, .. } => Some(*host),
            _ => None,
        }
    }

    /// Replace the content of a node with parsed markup
    ///
    /// For `<template>` elements the content fragment is replaced. Scripts
    /// produced this way are inert and never run.
    pub fn set_inner_html(&mut self, target: NodeId, markup: &str) -> Result<()> {
        let container = self.template_contents(target).unwrap_or(target);
        if !self.nodes[container.0].data.is_container() {
            return Err(Error::dom_static("text and comment nodes have no inner HTML"));
        }
        let nodes = Parser::fragment(markup).import_fragment(self)?;
        for child in self.children(container).to_vec() {
            self.detach(child);
        }
        for node in nodes {
            self.insert_before(container, node, None)?;
        }
        Ok(())
    }

    /// Serialized content of a node
    ///
    /// Template elements serialize their content fragment.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let container = self.template_contents(id).unwrap_or(id);
        serializer::serialize_children(self, container, &mut out);
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serializer::serialize_node(self, id, &mut out);
        out
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.outer_html(self.root)
    }

    /// First element in tree order with the given `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&node| self.attr(node, "id") == Some(id))
    }

    /// Elements with the given tag name, in tree order
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        let name = name.to_ascii_lowercase();
        self.descendants(self.root)
            .into_iter()
            .filter(|&node| self.tag_name(node) == Some(name.as_str()))
            .collect()
    }
}
