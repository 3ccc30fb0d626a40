//! Mount Points - the stateful side of a rendered tree.
//!
//! Every child that is rendered gets a mount point. Mount points own their
//! host nodes and subscriptions and move through one lifecycle:
//!
//! ```text
//! Unmounted ──mount──► Mounted ──unmount──► Unmounted
//!     │                                         │
//!     └──────────────── dispose ◄───────────────┘   (Disposed is terminal)
//! ```
//!
//! There are four kinds:
//! - [`DynamicMountPoint`]: wraps any [`Child`], re-resolving it when a cell
//!   emits; patches text and lists in place where it can
//! - [`HostMountPoint`]: one element, its properties and its children
//! - [`TextMountPoint`]: one text node
//! - [`ListMountPoint`]: a keyed sequence, reordered with minimal moves
//!
//! # Placement
//!
//! A mounted point knows its parent host node, how to find the node to insert
//! before (resolved at insertion time, since siblings come and go), and whom
//! to tell when its first host node changes. That triple is a [`Placement`].
//!
//! # Borrowing
//!
//! Points are `Rc` handles. Calls into children and callbacks are always made
//! with no `RefCell` borrow held, because they can re-enter the caller through
//! the placement callbacks.

mod dynamic;
mod host;
mod list;
mod text;

use std::fmt;
use std::rc::Rc;

use spark_signals::untrack;

use crate::error::Result;
use crate::reconciler::{HostNode, Reconciler};
use crate::types::{Child, Kind};

pub use dynamic::DynamicMountPoint;
pub use host::HostMountPoint;
pub use list::ListMountPoint;
pub use text::TextMountPoint;

// =============================================================================
// Shared types
// =============================================================================

/// Called with a point's first host node whenever it changes (`None` when the
/// point no longer has one in the host tree).
pub type DomCallback<N> = Rc<dyn Fn(Option<N>)>;

/// Resolves the host node to insert before (`None`: append).
pub type Anchor<N> = Rc<dyn Fn() -> Option<N>>;

/// Lifecycle state of a mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted,
    Disposed,
}

/// Where a mounted point lives in the host tree.
pub struct Placement<N> {
    pub parent: N,
    pub anchor: Anchor<N>,
    pub notify: DomCallback<N>,
}

impl<N: Clone> Clone for Placement<N> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            anchor: self.anchor.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<N: HostNode> Placement<N> {
    pub fn new(
        parent: N,
        anchor: impl Fn() -> Option<N> + 'static,
        notify: impl Fn(Option<N>) + 'static,
    ) -> Self {
        Self {
            parent,
            anchor: Rc::new(anchor),
            notify: Rc::new(notify),
        }
    }

    /// Placement at the end of `parent`, reporting to nobody.
    pub fn append_to(parent: N) -> Self {
        Self::new(parent, || None, |_| {})
    }

    pub(crate) fn before(&self) -> Option<N> {
        (self.anchor)()
    }
}

impl<N> fmt::Debug for Placement<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placement").finish_non_exhaustive()
    }
}

// =============================================================================
// ChildMount - the closed set of point kinds
// =============================================================================

/// A built mount point of any kind.
pub enum ChildMount<N> {
    Dynamic(DynamicMountPoint<N>),
    Host(HostMountPoint<N>),
    Text(TextMountPoint<N>),
    List(ListMountPoint<N>),
}

impl<N> Clone for ChildMount<N> {
    fn clone(&self) -> Self {
        match self {
            ChildMount::Dynamic(p) => ChildMount::Dynamic(p.clone()),
            ChildMount::Host(p) => ChildMount::Host(p.clone()),
            ChildMount::Text(p) => ChildMount::Text(p.clone()),
            ChildMount::List(p) => ChildMount::List(p.clone()),
        }
    }
}

impl<N> fmt::Debug for ChildMount<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildMount::Dynamic(_) => f.write_str("Dynamic"),
            ChildMount::Host(_) => f.write_str("Host"),
            ChildMount::Text(_) => f.write_str("Text"),
            ChildMount::List(_) => f.write_str("List"),
        }
    }
}

impl<N: HostNode> ChildMount<N> {
    /// Build the point for `child`. `Empty` builds nothing.
    ///
    /// Components are invoked here, untracked, exactly once per build.
    pub fn build(rec: &Reconciler<N>, child: Child) -> Result<Option<Self>> {
        let point = match child {
            Child::Empty => return Ok(None),
            Child::Text(_) | Child::Number(_) => {
                let text = child.primitive_text().unwrap_or_default();
                ChildMount::Text(TextMountPoint::new(rec.clone(), &text)?)
            }
            Child::Element(description) => match description.kind() {
                Kind::Tag(_) => ChildMount::Host(HostMountPoint::new(rec.clone(), &description)?),
                Kind::Component(component) => {
                    let component = component.clone();
                    let rendered = untrack(|| component(description.props()));
                    ChildMount::Dynamic(DynamicMountPoint::new(rec.clone(), rendered)?)
                }
            },
            Child::Cell(_) => ChildMount::Dynamic(DynamicMountPoint::new(rec.clone(), child)?),
            Child::List(list) => ChildMount::List(ListMountPoint::new(rec.clone(), &list)?),
        };
        Ok(Some(point))
    }

    pub fn mount(&self, placement: Placement<N>) -> Result<()> {
        match self {
            ChildMount::Dynamic(p) => p.mount(placement),
            ChildMount::Host(p) => p.mount(placement),
            ChildMount::Text(p) => p.mount(placement),
            ChildMount::List(p) => p.mount(placement),
        }
    }

    pub fn unmount(&self) -> Result<()> {
        match self {
            ChildMount::Dynamic(p) => p.unmount(),
            ChildMount::Host(p) => p.unmount(),
            ChildMount::Text(p) => p.unmount(),
            ChildMount::List(p) => p.unmount(),
        }
    }

    pub fn dispose(&self) {
        match self {
            ChildMount::Dynamic(p) => p.dispose(),
            ChildMount::Host(p) => p.dispose(),
            ChildMount::Text(p) => p.dispose(),
            ChildMount::List(p) => p.dispose(),
        }
    }

    pub fn state(&self) -> MountState {
        match self {
            ChildMount::Dynamic(p) => p.state(),
            ChildMount::Host(p) => p.state(),
            ChildMount::Text(p) => p.state(),
            ChildMount::List(p) => p.state(),
        }
    }
}
