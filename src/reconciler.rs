//! Reconciler - binds the mount point engine to a render target.
//!
//! A render target implements [`HostAdapter`]. The [`Reconciler`] carries the
//! adapter (switching it for subtrees through
//! [`HostAdapter::child_host_context`]) and the queue of errors raised inside
//! reactive notifications, where there is no caller to return them to.
//!
//! # Example
//!
//! ```ignore
//! use spark_reconciler::{h, Props, Reconciler};
//! use spark_reconciler::document::{Document, HtmlHost};
//!
//! let doc = Document::new();
//! let root = doc.create_root("body");
//! let reconciler = Reconciler::new(HtmlHost::new(&doc));
//!
//! let handle = reconciler.render(h("p", Props::new(), vec!["hi".into()]), root.clone(), None)?;
//! assert_eq!(root.to_html(), "<body><p>hi</p></body>");
//! handle.dispose()?;
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::mount::{DynamicMountPoint, MountState, Placement};
use crate::reactive::{Reactive, SubscribeOptions, Subscription};
use crate::types::{Child, Value};

// =============================================================================
// Host adapter
// =============================================================================

/// Operations a render target provides.
///
/// Every operation may fail; failures propagate to the mount or update call
/// that triggered them. Adapters never retry.
pub trait HostAdapter<N> {
    /// Create a detached element for `tag`.
    fn create_element(&self, tag: &str) -> Result<N>;

    /// Create a detached text node.
    fn create_text_node(&self, text: &str) -> Result<N>;

    /// Insert `child` into `parent` before `before`, or at the end for `None`.
    /// A child that is already attached somewhere is moved.
    fn insert_before(&self, parent: &N, child: &N, before: Option<&N>) -> Result<()>;

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: &N, child: &N) -> Result<()>;

    /// Set a property. [`Value::Null`] removes it.
    fn set_property(&self, node: &N, name: &str, value: &Value) -> Result<()>;

    /// Replace the text of a text node.
    fn set_text_content(&self, node: &N, text: &str) -> Result<()>;

    /// Adapter to use for the children of an element with `tag`.
    ///
    /// `None` keeps the current adapter. Targets with namespaces use this to
    /// switch, e.g. HTML to SVG at `<svg>`.
    fn child_host_context(&self, _tag: &str) -> Option<Rc<dyn HostAdapter<N>>> {
        None
    }
}

/// Host node handle requirements: cheap clones and identity comparison.
pub trait HostNode: Clone + PartialEq + 'static {}

impl<T: Clone + PartialEq + 'static> HostNode for T {}

// =============================================================================
// Reconciler
// =============================================================================

/// Entry point for rendering children into a host container.
///
/// Cloning is cheap; clones share the adapter and the error queue.
pub struct Reconciler<N> {
    host: Rc<dyn HostAdapter<N>>,
    errors: Rc<RefCell<Vec<Error>>>,
}

impl<N> Clone for Reconciler<N> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<N> fmt::Debug for Reconciler<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("pending_errors", &self.errors.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<N: HostNode> Reconciler<N> {
    pub fn new(host: impl HostAdapter<N> + 'static) -> Self {
        Self::from_shared(Rc::new(host))
    }

    pub fn from_shared(host: Rc<dyn HostAdapter<N>>) -> Self {
        Self {
            host,
            errors: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn host(&self) -> &Rc<dyn HostAdapter<N>> {
        &self.host
    }

    /// Reconciler for the children of an element with `tag`.
    pub(crate) fn child_context(&self, tag: &str) -> Self {
        match self.host.child_host_context(tag) {
            Some(host) => {
                debug!(tag, "switching host context");
                Self {
                    host,
                    errors: self.errors.clone(),
                }
            }
            None => self.clone(),
        }
    }

    /// Record an error that has no caller to propagate to.
    pub(crate) fn report(&self, err: Error) {
        error!(%err, "update failed during reactive notification");
        self.errors.borrow_mut().push(err);
    }

    /// Drain errors raised inside reactive notifications since the last call.
    pub fn take_errors(&self) -> Vec<Error> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    /// Subscribe with immediate delivery.
    ///
    /// An error from the first delivery is returned (and the subscription
    /// cancelled); errors from later deliveries are reported.
    pub(crate) fn subscribe_now<T: Clone + PartialEq + 'static>(
        &self,
        cell: &Reactive<T>,
        mut on_value: impl FnMut(T) -> Result<()> + 'static,
    ) -> Result<Subscription> {
        let first_fire = Rc::new(Cell::new(true));
        let first_error: Rc<RefCell<Option<Error>>> = Rc::new(RefCell::new(None));

        let sink = self.clone();
        let (first_fire_cb, first_error_cb) = (first_fire.clone(), first_error.clone());
        let subscription = cell.subscribe(
            move |value| {
                if let Err(err) = on_value(value) {
                    if first_fire_cb.get() {
                        *first_error_cb.borrow_mut() = Some(err);
                    } else {
                        sink.report(err);
                    }
                }
            },
            SubscribeOptions::immediate(),
        );
        first_fire.set(false);

        match first_error.borrow_mut().take() {
            Some(err) => {
                subscription.cancel();
                Err(err)
            }
            None => Ok(subscription),
        }
    }

    /// Mount `child` into `container`, before `before` (or at the end).
    ///
    /// On failure the partially built tree is disposed and the error returned.
    pub fn render(
        &self,
        child: impl Into<Child>,
        container: N,
        before: Option<N>,
    ) -> Result<RenderHandle<N>> {
        let root = DynamicMountPoint::new(self.clone(), child.into())?;
        let placement = Placement::new(container, move || before.clone(), |_| {});
        if let Err(err) = root.mount(placement) {
            root.dispose();
            return Err(err);
        }
        Ok(RenderHandle { root })
    }
}

// =============================================================================
// Render handle
// =============================================================================

/// A mounted tree returned by [`Reconciler::render`].
pub struct RenderHandle<N> {
    root: DynamicMountPoint<N>,
}

impl<N: HostNode> RenderHandle<N> {
    pub fn state(&self) -> MountState {
        self.root.state()
    }

    /// Unmount the tree from its container, then dispose it.
    ///
    /// The tree is disposed even if unmounting fails.
    pub fn dispose(self) -> Result<()> {
        let result = self.root.unmount();
        self.root.dispose();
        result
    }
}

impl<N> fmt::Debug for RenderHandle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle").finish_non_exhaustive()
    }
}
