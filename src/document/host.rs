//! HTML and SVG adapters for the in-memory document.
//!
//! # Property convention
//!
//! | value / name                         | effect                                   |
//! |--------------------------------------|------------------------------------------|
//! | handler                              | property under the lower-cased name      |
//! | `value` (both namespaces)            | property                                 |
//! | `className` (HTML)                   | `class` attribute                        |
//! | boolean names (`checked`, ...)       | presence flag, set iff the value is truthy |
//! | `Null`                               | attribute removed                        |
//! | anything else                        | string attribute                         |

use std::rc::Rc;

use tracing::trace;

use crate::error::Result;
use crate::reconciler::HostAdapter;
use crate::types::Value;

use super::{Document, DomNode, Namespace};

// =============================================================================
// Boolean attributes
// =============================================================================

bitflags::bitflags! {
    /// Attributes whose presence is the value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BoolAttrs: u16 {
        const CHECKED = 1 << 0;
        const DISABLED = 1 << 1;
        const HIDDEN = 1 << 2;
        const SELECTED = 1 << 3;
        const READONLY = 1 << 4;
        const REQUIRED = 1 << 5;
        const MULTIPLE = 1 << 6;
        const AUTOFOCUS = 1 << 7;
        const OPEN = 1 << 8;
    }
}

const BOOL_ATTR_NAMES: [(BoolAttrs, &str); 9] = [
    (BoolAttrs::CHECKED, "checked"),
    (BoolAttrs::DISABLED, "disabled"),
    (BoolAttrs::HIDDEN, "hidden"),
    (BoolAttrs::SELECTED, "selected"),
    (BoolAttrs::READONLY, "readonly"),
    (BoolAttrs::REQUIRED, "required"),
    (BoolAttrs::MULTIPLE, "multiple"),
    (BoolAttrs::AUTOFOCUS, "autofocus"),
    (BoolAttrs::OPEN, "open"),
];

impl BoolAttrs {
    /// Flag for a property name, case-insensitive (`readOnly`, `autoFocus`).
    pub fn from_attr_name(name: &str) -> Option<Self> {
        BOOL_ATTR_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(flag, _)| *flag)
    }

    /// Attribute names of the set flags, in declaration order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        BOOL_ATTR_NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

// =============================================================================
// Shared adapter behaviour
// =============================================================================

fn set_property(node: &DomNode, name: &str, value: &Value, namespace: Namespace) -> Result<()> {
    if let Value::Handler(_) = value {
        return node.set_js_property(&name.to_ascii_lowercase(), value);
    }
    if name == "value" {
        return node.set_js_property(name, value);
    }
    if let Some(flag) = BoolAttrs::from_attr_name(name) {
        return node.set_flag(flag, value.is_truthy());
    }
    let attribute = match (namespace, name) {
        (Namespace::Html, "className") => "class",
        _ => name,
    };
    node.set_attribute(attribute, value.to_attribute())
}

fn insert_before(doc: &Document, parent: &DomNode, child: &DomNode, before: Option<&DomNode>) -> Result<()> {
    parent.insert_before(child, before)?;
    doc.record(|s| s.inserts += 1);
    Ok(())
}

fn remove_child(doc: &Document, parent: &DomNode, child: &DomNode) -> Result<()> {
    parent.remove_child(child)?;
    doc.record(|s| s.removals += 1);
    Ok(())
}

fn create_text_node(doc: &Document, text: &str) -> Result<DomNode> {
    doc.record(|s| s.texts_created += 1);
    Ok(DomNode::text_node(text))
}

fn set_text_content(doc: &Document, node: &DomNode, text: &str) -> Result<()> {
    node.set_text(text)?;
    doc.record(|s| s.text_updates += 1);
    Ok(())
}

// =============================================================================
// HTML
// =============================================================================

/// Adapter creating HTML elements.
#[derive(Debug, Clone)]
pub struct HtmlHost {
    doc: Document,
}

impl HtmlHost {
    pub fn new(doc: &Document) -> Self {
        Self { doc: doc.clone() }
    }
}

impl HostAdapter<DomNode> for HtmlHost {
    fn create_element(&self, tag: &str) -> Result<DomNode> {
        let namespace = if tag == "svg" { Namespace::Svg } else { Namespace::Html };
        self.doc.record(|s| s.elements_created += 1);
        Ok(DomNode::element(tag, namespace))
    }

    fn create_text_node(&self, text: &str) -> Result<DomNode> {
        create_text_node(&self.doc, text)
    }

    fn insert_before(&self, parent: &DomNode, child: &DomNode, before: Option<&DomNode>) -> Result<()> {
        insert_before(&self.doc, parent, child, before)
    }

    fn remove_child(&self, parent: &DomNode, child: &DomNode) -> Result<()> {
        remove_child(&self.doc, parent, child)
    }

    fn set_property(&self, node: &DomNode, name: &str, value: &Value) -> Result<()> {
        let namespace = node.namespace().unwrap_or_default();
        set_property(node, name, value, namespace)?;
        self.doc.record(|s| s.property_sets += 1);
        Ok(())
    }

    fn set_text_content(&self, node: &DomNode, text: &str) -> Result<()> {
        set_text_content(&self.doc, node, text)
    }

    fn child_host_context(&self, tag: &str) -> Option<Rc<dyn HostAdapter<DomNode>>> {
        if tag == "svg" {
            trace!("entering svg namespace");
            Some(Rc::new(SvgHost::new(&self.doc)))
        } else {
            None
        }
    }
}

// =============================================================================
// SVG
// =============================================================================

/// Adapter creating SVG elements.
#[derive(Debug, Clone)]
pub struct SvgHost {
    doc: Document,
}

impl SvgHost {
    pub fn new(doc: &Document) -> Self {
        Self { doc: doc.clone() }
    }
}

impl HostAdapter<DomNode> for SvgHost {
    fn create_element(&self, tag: &str) -> Result<DomNode> {
        self.doc.record(|s| s.elements_created += 1);
        Ok(DomNode::element(tag, Namespace::Svg))
    }

    fn create_text_node(&self, text: &str) -> Result<DomNode> {
        create_text_node(&self.doc, text)
    }

    fn insert_before(&self, parent: &DomNode, child: &DomNode, before: Option<&DomNode>) -> Result<()> {
        insert_before(&self.doc, parent, child, before)
    }

    fn remove_child(&self, parent: &DomNode, child: &DomNode) -> Result<()> {
        remove_child(&self.doc, parent, child)
    }

    fn set_property(&self, node: &DomNode, name: &str, value: &Value) -> Result<()> {
        set_property(node, name, value, Namespace::Svg)?;
        self.doc.record(|s| s.property_sets += 1);
        Ok(())
    }

    fn set_text_content(&self, node: &DomNode, text: &str) -> Result<()> {
        set_text_content(&self.doc, node, text)
    }

    fn child_host_context(&self, tag: &str) -> Option<Rc<dyn HostAdapter<DomNode>>> {
        if tag.eq_ignore_ascii_case("foreignObject") {
            trace!("leaving svg namespace");
            Some(Rc::new(HtmlHost::new(&self.doc)))
        } else {
            None
        }
    }
}
