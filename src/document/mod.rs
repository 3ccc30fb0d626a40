//! In-memory document - a render target with DOM semantics.
//!
//! Nodes are shared handles ([`DomNode`]); equality is identity. Elements keep
//! string attributes, boolean presence flags and non-serialized properties
//! (values, handlers). Every mutation made through an adapter is counted in
//! [`HostStats`], which is how tests observe that an update touched only what
//! it had to.
//!
//! Two adapters are provided:
//! - [`HtmlHost`] - HTML elements; switches to [`SvgHost`] under `<svg>`
//! - [`SvgHost`] - SVG elements; switches back under `<foreignObject>`
//!
//! ```text
//! Document ── stats (shared by every adapter built from it)
//!    │
//!    └─ DomNode <body> ─┬─ DomNode <p> ── DomNode "text"
//!                       └─ DomNode <svg ns=svg> ── ...
//! ```

mod host;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::types::Value;

pub use host::{BoolAttrs, HtmlHost, SvgHost};

// =============================================================================
// Namespaces
// =============================================================================

/// Element namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
        }
    }
}

// =============================================================================
// Nodes
// =============================================================================

struct ElementData {
    tag: String,
    namespace: Namespace,
    attributes: RefCell<BTreeMap<String, String>>,
    flags: Cell<BoolAttrs>,
    properties: RefCell<BTreeMap<String, Value>>,
}

enum NodeKind {
    Element(ElementData),
    Text(RefCell<String>),
}

struct NodeData {
    kind: NodeKind,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<DomNode>>,
}

/// Handle to an element or text node.
#[derive(Clone)]
pub struct DomNode(Rc<NodeData>);

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DomNode {}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Element(el) => write!(f, "<{}>", el.tag),
            NodeKind::Text(text) => write!(f, "{:?}", text.borrow()),
        }
    }
}

impl DomNode {
    fn new(kind: NodeKind) -> Self {
        DomNode(Rc::new(NodeData {
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    pub(crate) fn element(tag: &str, namespace: Namespace) -> Self {
        Self::new(NodeKind::Element(ElementData {
            tag: tag.to_owned(),
            namespace,
            attributes: RefCell::new(BTreeMap::new()),
            flags: Cell::new(BoolAttrs::empty()),
            properties: RefCell::new(BTreeMap::new()),
        }))
    }

    pub(crate) fn text_node(text: &str) -> Self {
        Self::new(NodeKind::Text(RefCell::new(text.to_owned())))
    }

    fn element_data(&self) -> Option<&ElementData> {
        match &self.0.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.kind, NodeKind::Text(_))
    }

    /// Tag name, `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        self.element_data().map(|el| el.tag.as_str())
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.element_data().map(|el| el.namespace)
    }

    /// Text of a text node, `None` for elements.
    pub fn text(&self) -> Option<String> {
        match &self.0.kind {
            NodeKind::Text(text) => Some(text.borrow().clone()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn children(&self) -> Vec<DomNode> {
        self.0.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<DomNode> {
        self.0.parent.borrow().upgrade().map(DomNode)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.element_data()
            .and_then(|el| el.attributes.borrow().get(name).cloned())
    }

    pub fn has_flag(&self, flag: BoolAttrs) -> bool {
        self.element_data()
            .is_some_and(|el| el.flags.get().contains(flag))
    }

    pub fn flags(&self) -> BoolAttrs {
        self.element_data()
            .map_or(BoolAttrs::empty(), |el| el.flags.get())
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.element_data()
            .and_then(|el| el.properties.borrow().get(name).cloned())
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text(text) => out.push_str(&text.borrow()),
            NodeKind::Element(_) => {
                for child in self.0.children.borrow().iter() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Outer HTML of this node.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text(text) => escape_into(&text.borrow(), false, out),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                for name in el.flags.get().names() {
                    out.push(' ');
                    out.push_str(name);
                }
                out.push('>');
                for child in self.0.children.borrow().iter() {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    // =========================================================================
    // Mutations (used by the adapters)
    // =========================================================================

    fn is_ancestor_of(&self, node: &DomNode) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n == *self {
                return true;
            }
            current = n.parent();
        }
        false
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.0.children.borrow_mut().retain(|c| c != self);
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    pub(crate) fn insert_before(&self, child: &DomNode, before: Option<&DomNode>) -> Result<()> {
        if self.is_text() {
            return Err(Error::host("insert_before", "text nodes cannot have children"));
        }
        if child.is_ancestor_of(self) {
            return Err(Error::host("insert_before", "cannot insert a node into itself"));
        }
        if let Some(before) = before {
            if before.parent().as_ref() != Some(self) {
                return Err(Error::host("insert_before", "reference node is not a child of parent"));
            }
            if before == child {
                return Ok(());
            }
        }

        child.detach();
        let mut children = self.0.children.borrow_mut();
        let at = before
            .and_then(|b| children.iter().position(|c| c == b))
            .unwrap_or(children.len());
        children.insert(at, child.clone());
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        Ok(())
    }

    pub(crate) fn remove_child(&self, child: &DomNode) -> Result<()> {
        if child.parent().as_ref() != Some(self) {
            return Err(Error::host("remove_child", "node is not a child of parent"));
        }
        child.detach();
        Ok(())
    }

    pub(crate) fn set_text(&self, text: &str) -> Result<()> {
        match &self.0.kind {
            NodeKind::Text(current) => {
                *current.borrow_mut() = text.to_owned();
                Ok(())
            }
            NodeKind::Element(_) => Err(Error::host("set_text_content", "not a text node")),
        }
    }

    fn require_element(&self, op: &'static str) -> Result<&ElementData> {
        self.element_data()
            .ok_or_else(|| Error::host(op, "text nodes have no properties"))
    }

    pub(crate) fn set_attribute(&self, name: &str, value: Option<String>) -> Result<()> {
        let el = self.require_element("set_property")?;
        let mut attributes = el.attributes.borrow_mut();
        match value {
            Some(value) => attributes.insert(name.to_owned(), value),
            None => attributes.remove(name),
        };
        Ok(())
    }

    pub(crate) fn set_flag(&self, flag: BoolAttrs, on: bool) -> Result<()> {
        let el = self.require_element("set_property")?;
        let mut flags = el.flags.get();
        flags.set(flag, on);
        el.flags.set(flags);
        Ok(())
    }

    pub(crate) fn set_js_property(&self, name: &str, value: &Value) -> Result<()> {
        let el = self.require_element("set_property")?;
        let mut properties = el.properties.borrow_mut();
        if value.is_null() {
            properties.remove(name);
        } else {
            properties.insert(name.to_owned(), value.clone());
        }
        Ok(())
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// Counts of mutations performed through adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub elements_created: usize,
    pub texts_created: usize,
    pub inserts: usize,
    pub removals: usize,
    pub property_sets: usize,
    pub text_updates: usize,
}

impl HostStats {
    /// Every counted call.
    pub fn total(&self) -> usize {
        self.elements_created
            + self.texts_created
            + self.inserts
            + self.removals
            + self.property_sets
            + self.text_updates
    }
}

/// Owner of the operation counters. Cloning shares them.
#[derive(Clone, Default)]
pub struct Document {
    stats: Rc<Cell<HostStats>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("stats", &self.stats()).finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A detached HTML element to render into. Not counted.
    pub fn create_root(&self, tag: &str) -> DomNode {
        DomNode::element(tag, Namespace::Html)
    }

    pub fn stats(&self) -> HostStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(HostStats::default());
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut HostStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}
