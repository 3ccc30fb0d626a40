//! Core types for spark-reconciler.
//!
//! These types define what a UI *is* before it is mounted: immutable
//! descriptions, the closed set of child shapes, list identities and host
//! property values. Mount points consume them; nothing here touches a host.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::primitives::Props;
use crate::reactive::{Reactive, SequenceSource};

// =============================================================================
// Key (list identity)
// =============================================================================

/// Identity used to match list entries across sequence snapshots.
///
/// Keyed lists get their keys from the caller. Plain `Vec<Child>` lists are
/// keyed by what each child is ([`Key::Identity`]), so the same description
/// moved to another slot is moved, not rebuilt. Keys must be unique within
/// one snapshot; when they are not, the first occurrence wins and later
/// duplicates are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
    /// Identity of an unkeyed child and which occurrence of it this is.
    Identity(ChildIdentity, u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
            Key::Identity(id, nth) => write!(f, "{id:?}#{nth}"),
        }
    }
}

/// What an unkeyed child is: its value for text and numbers, its allocation
/// for descriptions, cells and lists.
///
/// Pointer identities stay valid while the child is alive, and a mounted
/// list entry keeps its child alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildIdentity {
    Empty,
    Text(Rc<str>),
    /// `f64::to_bits` of the number.
    Number(u64),
    Node(usize),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value.into())
    }
}

impl From<Rc<str>> for Key {
    fn from(value: Rc<str>) -> Self {
        Key::Str(value)
    }
}

// =============================================================================
// Value (host property values)
// =============================================================================

/// Event/callback handler stored as a host property.
///
/// The argument is whatever the render target passes (an event object,
/// usually); handlers downcast it themselves.
pub type Handler = Rc<dyn Fn(&dyn Any)>;

/// A property value handed to [`HostAdapter::set_property`](crate::HostAdapter::set_property).
///
/// `Null` asks the host to remove the property.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Handler(Handler),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used for presence/absence flags such as `checked`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Handler(_) => true,
        }
    }

    /// String form for attribute-style hosts. `None` for `Null` and handlers.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Value::Null | Value::Handler(_) => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_number(*f)),
            Value::Str(s) => Some(s.to_string()),
        }
    }

    pub fn handler(f: impl Fn(&dyn Any) + 'static) -> Self {
        Value::Handler(Rc::new(f))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Render a number the way text content expects it (`1` rather than `1.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else {
        n.to_string()
    }
}

// =============================================================================
// Description (element factory output)
// =============================================================================

/// A component: a function from props to the child it renders.
pub type Component = Rc<dyn Fn(&Props) -> Child>;

/// What a description realizes: a host tag or a component invocation.
#[derive(Clone)]
pub enum Kind {
    Tag(Rc<str>),
    Component(Component),
}

impl Kind {
    pub fn component(f: impl Fn(&Props) -> Child + 'static) -> Self {
        Kind::Component(Rc::new(f))
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Tag(tag) => write!(f, "Tag({tag:?})"),
            Kind::Component(_) => f.write_str("Component(..)"),
        }
    }
}

impl From<&str> for Kind {
    fn from(tag: &str) -> Self {
        Kind::Tag(tag.into())
    }
}

impl From<String> for Kind {
    fn from(tag: String) -> Self {
        Kind::Tag(tag.into())
    }
}

/// Immutable description of a host node or component invocation.
///
/// Cheap to clone. Two descriptions are equal only if they are the same
/// value (identity, not structure): objects are replaced, never field-diffed.
#[derive(Clone)]
pub struct Description {
    inner: Rc<DescriptionInner>,
}

struct DescriptionInner {
    kind: Kind,
    props: Props,
}

impl Description {
    pub(crate) fn new(kind: Kind, props: Props) -> Self {
        Self {
            inner: Rc::new(DescriptionInner { kind, props }),
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    /// The host tag, if this describes a host node.
    pub fn tag(&self) -> Option<&str> {
        match &self.inner.kind {
            Kind::Tag(tag) => Some(tag),
            Kind::Component(_) => None,
        }
    }
}

impl PartialEq for Description {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Description")
            .field("kind", &self.inner.kind)
            .field("props", &self.inner.props)
            .finish()
    }
}

// =============================================================================
// Child
// =============================================================================

/// Anything that can appear as a child.
///
/// The shape is resolved once when a mount point is built for it.
/// `Empty` covers booleans, `None` and `()`: they render nothing.
#[derive(Clone, Default)]
pub enum Child {
    #[default]
    Empty,
    Text(Rc<str>),
    Number(f64),
    Element(Description),
    Cell(Reactive<Child>),
    List(ChildList),
}

impl Child {
    /// A reactive child recomputed from a getter.
    pub fn cell(read: impl Fn() -> Child + 'static) -> Self {
        Child::Cell(Reactive::from_fn(read))
    }

    /// Text for text/number children, `None` for everything else.
    pub fn primitive_text(&self) -> Option<String> {
        match self {
            Child::Text(s) => Some(s.to_string()),
            Child::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }

    /// Identity used to key this child in an unkeyed list.
    pub fn identity(&self) -> ChildIdentity {
        match self {
            Child::Empty => ChildIdentity::Empty,
            Child::Text(s) => ChildIdentity::Text(s.clone()),
            Child::Number(n) => ChildIdentity::Number(n.to_bits()),
            Child::Element(d) => ChildIdentity::Node(Rc::as_ptr(&d.inner) as *const () as usize),
            Child::Cell(cell) => ChildIdentity::Node(cell.addr()),
            Child::List(ChildList::Items(items)) => {
                ChildIdentity::Node(Rc::as_ptr(items) as *const () as usize)
            }
            Child::List(ChildList::Observable(source)) => {
                ChildIdentity::Node(Rc::as_ptr(source) as *const () as usize)
            }
        }
    }
}

impl PartialEq for Child {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Child::Empty, Child::Empty) => true,
            (Child::Text(a), Child::Text(b)) => a == b,
            (Child::Number(a), Child::Number(b)) => a == b,
            (Child::Element(a), Child::Element(b)) => a == b,
            (Child::Cell(a), Child::Cell(b)) => a == b,
            (Child::List(a), Child::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Text(s) => write!(f, "Text({s:?})"),
            Child::Number(n) => write!(f, "Number({n})"),
            Child::Element(d) => write!(f, "Element({:?})", d.kind()),
            Child::Cell(_) => f.write_str("Cell(..)"),
            Child::List(list) => write!(f, "List({list:?})"),
        }
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value.into())
    }
}

impl From<Rc<str>> for Child {
    fn from(value: Rc<str>) -> Self {
        Child::Text(value)
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Number(value.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Number(value as f64)
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Number(value as f64)
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Number(value)
    }
}

impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Empty
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl From<Description> for Child {
    fn from(value: Description) -> Self {
        Child::Element(value)
    }
}

impl From<Reactive<Child>> for Child {
    fn from(value: Reactive<Child>) -> Self {
        Child::Cell(value)
    }
}

impl From<spark_signals::Signal<Child>> for Child {
    fn from(value: spark_signals::Signal<Child>) -> Self {
        Child::Cell(value.into())
    }
}

impl From<ChildList> for Child {
    fn from(value: ChildList) -> Self {
        Child::List(value)
    }
}

impl From<Vec<Child>> for Child {
    fn from(value: Vec<Child>) -> Self {
        Child::List(ChildList::unkeyed(value))
    }
}

// =============================================================================
// Child lists
// =============================================================================

/// One entry of a child sequence: its identity and what it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub key: Key,
    pub child: Child,
}

impl ListItem {
    pub fn new(key: impl Into<Key>, child: impl Into<Child>) -> Self {
        Self {
            key: key.into(),
            child: child.into(),
        }
    }
}

/// A sequence of children: a fixed snapshot or an observable source.
#[derive(Clone)]
pub enum ChildList {
    Items(Rc<[ListItem]>),
    Observable(Rc<dyn SequenceSource>),
}

impl ChildList {
    /// A list keyed by child identity.
    ///
    /// Equal text, equal numbers and the same description (or cell, or list)
    /// keep their entry across snapshots wherever they move; repeats are told
    /// apart by occurrence.
    pub fn unkeyed(children: impl IntoIterator<Item = Child>) -> Self {
        let mut seen: HashMap<ChildIdentity, u32> = HashMap::new();
        Self::from_items(children.into_iter().map(|child| {
            let identity = child.identity();
            let nth = seen.entry(identity.clone()).or_insert(0);
            let key = Key::Identity(identity, *nth);
            *nth += 1;
            ListItem { key, child }
        }))
    }

    /// A list keyed by a caller-supplied key extraction.
    pub fn keyed<T, K>(
        items: impl IntoIterator<Item = T>,
        key_fn: impl Fn(&T) -> K,
        render: impl Fn(T) -> Child,
    ) -> Self
    where
        K: Into<Key>,
    {
        Self::from_items(items.into_iter().map(|item| ListItem {
            key: key_fn(&item).into(),
            child: render(item),
        }))
    }

    pub fn from_items(items: impl IntoIterator<Item = ListItem>) -> Self {
        ChildList::Items(items.into_iter().collect::<Vec<_>>().into())
    }

    /// A list backed by an observable sequence; mutations are reconciled.
    pub fn observable(source: impl SequenceSource + 'static) -> Self {
        ChildList::Observable(Rc::new(source))
    }

    /// Current items (a copy for observable sources).
    pub fn snapshot(&self) -> Vec<ListItem> {
        match self {
            ChildList::Items(items) => items.to_vec(),
            ChildList::Observable(source) => source.snapshot(),
        }
    }

    pub fn is_observable(&self) -> bool {
        matches!(self, ChildList::Observable(_))
    }
}

impl Default for ChildList {
    fn default() -> Self {
        ChildList::Items(Rc::from(Vec::new()))
    }
}

impl PartialEq for ChildList {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChildList::Items(a), ChildList::Items(b)) => Rc::ptr_eq(a, b) || a[..] == b[..],
            (ChildList::Observable(a), ChildList::Observable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ChildList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildList::Items(items) => f.debug_list().entries(items.iter()).finish(),
            ChildList::Observable(_) => f.write_str("Observable(..)"),
        }
    }
}

impl From<Vec<Child>> for ChildList {
    fn from(children: Vec<Child>) -> Self {
        ChildList::unkeyed(children)
    }
}

impl From<Vec<ListItem>> for ChildList {
    fn from(items: Vec<ListItem>) -> Self {
        ChildList::from_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_conversions() {
        assert_eq!(Child::from("hi"), Child::Text("hi".into()));
        assert_eq!(Child::from(3), Child::Number(3.0));
        assert_eq!(Child::from(true), Child::Empty, "booleans render nothing");
        assert_eq!(Child::from(None::<&str>), Child::Empty);
        assert_eq!(Child::from(Some("x")), Child::Text("x".into()));
    }

    #[test]
    fn test_primitive_text_formats_numbers() {
        assert_eq!(Child::from(1).primitive_text().as_deref(), Some("1"));
        assert_eq!(Child::from(1.5).primitive_text().as_deref(), Some("1.5"));
        assert_eq!(Child::Empty.primitive_text(), None);
    }

    #[test]
    fn test_unkeyed_list_keys_by_identity() {
        let list = ChildList::unkeyed(vec!["a".into(), "b".into(), "a".into()]);
        let keys: Vec<Key> = list.snapshot().into_iter().map(|item| item.key).collect();
        let text = |s: &str| ChildIdentity::Text(s.into());
        assert_eq!(
            keys,
            vec![
                Key::Identity(text("a"), 0),
                Key::Identity(text("b"), 0),
                Key::Identity(text("a"), 1),
            ],
            "repeats are told apart by occurrence"
        );
    }

    #[test]
    fn test_same_description_keeps_its_key_when_moved() {
        let a: Child = Description::new("a".into(), Props::new()).into();
        let b: Child = Description::new("b".into(), Props::new()).into();
        let first = ChildList::unkeyed(vec![a.clone(), b.clone()]).snapshot();
        let second = ChildList::unkeyed(vec![b, a]).snapshot();
        assert_eq!(first[0].key, second[1].key);
        assert_eq!(first[1].key, second[0].key);
        assert_ne!(first[0].key, first[1].key, "distinct descriptions, distinct keys");
    }

    #[test]
    fn test_keyed_list_uses_key_fn() {
        let list = ChildList::keyed(vec![(7, "seven"), (9, "nine")], |(id, _)| *id, |(_, s)| s.into());
        let items = list.snapshot();
        assert_eq!(items[0], ListItem::new(7, "seven"));
        assert_eq!(items[1].key, Key::Int(9));
    }

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from("checked").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(1).is_truthy());
    }

    #[test]
    fn test_value_to_attribute() {
        assert_eq!(Value::from(2.0).to_attribute().as_deref(), Some("2"));
        assert_eq!(Value::from("x").to_attribute().as_deref(), Some("x"));
        assert_eq!(Value::Null.to_attribute(), None);
    }
}
