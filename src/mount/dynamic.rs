//! Dynamic mount point - any child, possibly changing over time.
//!
//! A dynamic point resolves its child's shape and owns whatever point that
//! shape needs. When the child is a cell, it subscribes with immediate
//! delivery and re-resolves on every emission:
//!
//! - text → text: patch the existing text node
//! - list → list: reconcile the existing list point
//! - anything else: unmount and dispose the old point, build the new one,
//!   mount it if this point is mounted
//!
//! A dynamic point has no host node of its own. Its child is mounted with the
//! dynamic point's own placement, so the child's first node is reported
//! straight to whoever placed the dynamic point.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::{Error, Result};
use crate::reactive::Subscription;
use crate::reconciler::{HostNode, Reconciler};
use crate::types::Child;

use super::{ChildMount, MountState, Placement};

/// Mount point for a child of any shape.
pub struct DynamicMountPoint<N> {
    inner: Rc<DynamicInner<N>>,
}

struct DynamicInner<N> {
    rec: Reconciler<N>,
    /// Last resolved (non-cell, unless nested) value.
    value: RefCell<Option<Child>>,
    current: RefCell<Option<ChildMount<N>>>,
    subscription: RefCell<Option<Subscription>>,
    placement: RefCell<Option<Placement<N>>>,
    state: Cell<MountState>,
}

impl<N> Clone for DynamicMountPoint<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<N: HostNode> DynamicMountPoint<N> {
    /// Build (but do not mount) the point for `child`.
    pub fn new(rec: Reconciler<N>, child: Child) -> Result<Self> {
        let point = Self {
            inner: Rc::new(DynamicInner {
                rec,
                value: RefCell::new(None),
                current: RefCell::new(None),
                subscription: RefCell::new(None),
                placement: RefCell::new(None),
                state: Cell::new(MountState::Unmounted),
            }),
        };
        if let Err(err) = point.bind(child) {
            point.dispose();
            return Err(err);
        }
        Ok(point)
    }

    fn from_weak(weak: &Weak<DynamicInner<N>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn state(&self) -> MountState {
        self.inner.state.get()
    }

    /// The point currently realizing the child, if any.
    pub fn current(&self) -> Option<ChildMount<N>> {
        self.inner.current.borrow().clone()
    }

    fn bind(&self, child: Child) -> Result<()> {
        match child {
            Child::Cell(cell) => {
                let weak = Rc::downgrade(&self.inner);
                let subscription = self.inner.rec.subscribe_now(&cell, move |value| {
                    match Self::from_weak(&weak) {
                        Some(point) => point.update(value),
                        None => Ok(()),
                    }
                })?;
                *self.inner.subscription.borrow_mut() = Some(subscription);
                Ok(())
            }
            other => self.update(other),
        }
    }

    /// Rebind to a different child, dropping any cell subscription.
    pub fn replace(&self, child: Child) -> Result<()> {
        if self.state() == MountState::Disposed {
            return Ok(());
        }
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        self.bind(child)
    }

    /// Re-resolve the point with a new value.
    pub fn update(&self, value: Child) -> Result<()> {
        if self.state() == MountState::Disposed {
            return Ok(());
        }
        if self.inner.value.borrow().as_ref() == Some(&value) {
            return Ok(());
        }

        let current = self.current();
        match (&current, &value) {
            (Some(ChildMount::Text(text)), Child::Text(_) | Child::Number(_)) => {
                text.set_text(&value.primitive_text().unwrap_or_default())?;
                *self.inner.value.borrow_mut() = Some(value);
                return Ok(());
            }
            (Some(ChildMount::List(list)), Child::List(items)) => {
                list.update_from(items)?;
                *self.inner.value.borrow_mut() = Some(value);
                return Ok(());
            }
            _ => {}
        }

        let old = self.inner.current.borrow_mut().take();
        if let Some(old) = old {
            let unmounted = old.unmount();
            old.dispose();
            unmounted?;
        }
        *self.inner.value.borrow_mut() = Some(value.clone());

        let Some(next) = ChildMount::build(&self.inner.rec, value)? else {
            return Ok(());
        };
        *self.inner.current.borrow_mut() = Some(next.clone());

        let placement = self.inner.placement.borrow().clone();
        if let (MountState::Mounted, Some(placement)) = (self.state(), placement) {
            next.mount(placement)?;
        }
        Ok(())
    }

    pub fn mount(&self, placement: Placement<N>) -> Result<()> {
        match self.state() {
            MountState::Disposed => return Err(Error::Disposed),
            MountState::Mounted => self.unmount()?,
            MountState::Unmounted => {}
        }
        *self.inner.placement.borrow_mut() = Some(placement.clone());
        self.inner.state.set(MountState::Mounted);
        trace!("dynamic mounted");
        match self.current() {
            Some(current) => current.mount(placement),
            None => Ok(()),
        }
    }

    pub fn unmount(&self) -> Result<()> {
        if self.state() != MountState::Mounted {
            return Ok(());
        }
        self.inner.state.set(MountState::Unmounted);
        self.inner.placement.borrow_mut().take();
        trace!("dynamic unmounted");
        match self.current() {
            Some(current) => current.unmount(),
            None => Ok(()),
        }
    }

    /// Cancel the subscription and dispose the child point. Idempotent.
    pub fn dispose(&self) {
        if self.state() == MountState::Disposed {
            return;
        }
        self.inner.state.set(MountState::Disposed);
        self.inner.placement.borrow_mut().take();
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        let current = self.inner.current.borrow_mut().take();
        if let Some(current) = current {
            current.dispose();
        }
    }
}
