//! Primitive types - Props, refs and cleanup.
//!
//! These types define the interface a description carries to its host node.
//! Props support static values, signals, and getters for reactivity.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::reactive::Reactive;
use crate::types::{ChildList, Value};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function held by subscriptions.
///
/// Call this to stop the underlying effect and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Host mount points apply `Static` once and re-apply `Signal`/`Getter`
/// values on every change without recreating the node.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (for immediate reads).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }

    pub fn is_static(&self) -> bool {
        matches!(self, PropValue::Static(_))
    }

    /// View as a reactive cell. `None` for static values.
    pub fn to_reactive(&self) -> Option<Reactive<T>> {
        match self {
            PropValue::Static(_) => None,
            PropValue::Signal(s) => Some(Reactive::from(s.clone())),
            PropValue::Getter(f) => {
                let f = f.clone();
                Some(Reactive::from_fn(move || f()))
            }
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for PropValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Static(v) => write!(f, "Static({v:?})"),
            PropValue::Signal(_) => f.write_str("Signal(..)"),
            PropValue::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl From<Value> for PropValue<Value> {
    fn from(value: Value) -> Self {
        PropValue::Static(value)
    }
}

impl From<Signal<Value>> for PropValue<Value> {
    fn from(signal: Signal<Value>) -> Self {
        PropValue::Signal(signal)
    }
}

impl From<&str> for PropValue<Value> {
    fn from(value: &str) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<String> for PropValue<Value> {
    fn from(value: String) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<bool> for PropValue<Value> {
    fn from(value: bool) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<i32> for PropValue<Value> {
    fn from(value: i32) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<i64> for PropValue<Value> {
    fn from(value: i64) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<f64> for PropValue<Value> {
    fn from(value: f64) -> Self {
        PropValue::Static(value.into())
    }
}

// =============================================================================
// Node Refs
// =============================================================================

/// A realized host node, type-erased so refs work for any render target.
#[derive(Clone)]
pub struct AnyNode(Rc<dyn Any>);

impl AnyNode {
    pub fn new<N: Clone + 'static>(node: N) -> Self {
        AnyNode(Rc::new(node))
    }

    pub fn downcast<N: Clone + 'static>(&self) -> Option<N> {
        self.0.downcast_ref::<N>().cloned()
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.0
    }
}

impl PartialEq for AnyNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AnyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnyNode(..)")
    }
}

/// Observable slot receiving the host node of the element it is attached to.
///
/// Reading it inside an effect tracks it, so code can react to the node
/// appearing or going away.
#[derive(Clone)]
pub struct NodeRef {
    slot: Signal<Option<AnyNode>>,
}

impl NodeRef {
    /// The current node, if set and of type `N`.
    pub fn get<N: Clone + 'static>(&self) -> Option<N> {
        self.slot.get().and_then(|node| node.downcast())
    }

    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    pub(crate) fn set(&self, node: Option<AnyNode>) {
        self.slot.set(node);
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef").finish_non_exhaustive()
    }
}

/// Create an empty [`NodeRef`].
pub fn create_ref() -> NodeRef {
    NodeRef {
        slot: signal(None),
    }
}

/// How an element hands out its host node.
#[derive(Clone)]
pub enum Ref {
    /// Observable slot, set on first mount and cleared on dispose.
    Object(NodeRef),
    /// Called with the node on first mount and with `None` on dispose.
    Callback(Rc<dyn Fn(Option<&AnyNode>)>),
}

impl Ref {
    pub fn callback(f: impl Fn(Option<&AnyNode>) + 'static) -> Self {
        Ref::Callback(Rc::new(f))
    }

    pub(crate) fn assign(&self, node: Option<AnyNode>) {
        match self {
            Ref::Object(slot) => slot.set(node),
            Ref::Callback(f) => f(node.as_ref()),
        }
    }
}

impl From<NodeRef> for Ref {
    fn from(value: NodeRef) -> Self {
        Ref::Object(value)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Object(r) => write!(f, "Object({r:?})"),
            Ref::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Properties of a description.
///
/// Entries keep insertion order, which is the order a host node receives
/// them. Setting a name twice replaces the earlier value.
///
/// # Example
///
/// ```ignore
/// use spark_reconciler::{h, Props, Value};
/// use spark_signals::signal;
///
/// let class = signal(Value::from("idle"));
/// let button = h("button", Props::new().with("class", class.clone()), vec!["Go".into()]);
///
/// // Later: only the attribute changes, the node stays
/// class.set(Value::from("busy"));
/// ```
#[derive(Clone, Default)]
pub struct Props {
    entries: Vec<(Rc<str>, PropValue<Value>)>,
    node_ref: Option<Ref>,
    children: Option<ChildList>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue<Value>>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a property computed from a getter.
    pub fn with_getter(self, name: impl Into<Rc<str>>, f: impl Fn() -> Value + 'static) -> Self {
        self.with(name, PropValue::getter(f))
    }

    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue<Value>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn node_ref(mut self, r: impl Into<Ref>) -> Self {
        self.node_ref = Some(r.into());
        self
    }

    pub fn children(mut self, children: impl Into<ChildList>) -> Self {
        self.children = Some(children.into());
        self
    }

    pub(crate) fn set_children(&mut self, children: ChildList) {
        self.children = Some(children);
    }

    pub fn get(&self, name: &str) -> Option<&PropValue<Value>> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Current value of a property (`Value::Null` when absent).
    pub fn value(&self, name: &str) -> Value {
        self.get(name).map(PropValue::get).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<Value>)> {
        self.entries.iter().map(|(n, v)| (&**n, v))
    }

    pub fn get_ref(&self) -> Option<&Ref> {
        self.node_ref.as_ref()
    }

    pub fn child_list(&self) -> Option<&ChildList> {
        self.children.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(n, v)| (n, v)))
            .finish()
    }
}
