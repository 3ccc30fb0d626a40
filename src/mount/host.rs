//! Host mount point - one element, its properties and its children.
//!
//! The element is created once. Static properties are applied once; signal
//! and getter properties are applied on subscribe and again on every change,
//! always to the same node. Children form a nested [`ListMountPoint`] that is
//! mounted into the element right away, with the adapter the element's tag
//! selects for its subtree.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::primitives::{AnyNode, Ref};
use crate::reactive::Subscription;
use crate::reconciler::{HostNode, Reconciler};
use crate::types::Description;

use super::{ListMountPoint, MountState, Placement};

/// Owns one host element.
pub struct HostMountPoint<N> {
    inner: Rc<HostInner<N>>,
}

struct HostInner<N> {
    rec: Reconciler<N>,
    node: N,
    tag: Rc<str>,
    props: RefCell<Vec<Subscription>>,
    children: Option<ListMountPoint<N>>,
    node_ref: Option<Ref>,
    ref_applied: Cell<bool>,
    placement: RefCell<Option<Placement<N>>>,
    state: Cell<MountState>,
}

impl<N> Clone for HostMountPoint<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<N: HostNode> HostMountPoint<N> {
    /// Create the element, bind its properties and build its children.
    pub fn new(rec: Reconciler<N>, description: &Description) -> Result<Self> {
        let tag: Rc<str> = description.tag().unwrap_or_default().into();
        let host = rec.host().clone();
        let node = host.create_element(&tag)?;
        let props = description.props();

        let mut subscriptions = Vec::new();
        for (name, value) in props.iter() {
            match value.to_reactive() {
                None => host.set_property(&node, name, &value.get())?,
                Some(cell) => {
                    let (host, node, name) = (host.clone(), node.clone(), name.to_owned());
                    let subscription = rec.subscribe_now(&cell, move |v| host.set_property(&node, &name, &v));
                    match subscription {
                        Ok(s) => subscriptions.push(s),
                        Err(err) => {
                            subscriptions.into_iter().for_each(Subscription::cancel);
                            return Err(err);
                        }
                    }
                }
            }
        }

        let children = match props.child_list() {
            Some(list) => {
                let built = ListMountPoint::new(rec.child_context(&tag), list)
                    .and_then(|children| {
                        children.mount(Placement::append_to(node.clone()))?;
                        Ok(children)
                    });
                match built {
                    Ok(children) => Some(children),
                    Err(err) => {
                        subscriptions.into_iter().for_each(Subscription::cancel);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        trace!(tag = %tag, "element created");
        Ok(Self {
            inner: Rc::new(HostInner {
                rec,
                node,
                tag,
                props: RefCell::new(subscriptions),
                children,
                node_ref: props.get_ref().cloned(),
                ref_applied: Cell::new(false),
                placement: RefCell::new(None),
                state: Cell::new(MountState::Unmounted),
            }),
        })
    }

    pub fn node(&self) -> &N {
        &self.inner.node
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn state(&self) -> MountState {
        self.inner.state.get()
    }

    pub fn mount(&self, placement: Placement<N>) -> Result<()> {
        match self.state() {
            MountState::Disposed => return Err(Error::Disposed),
            MountState::Mounted => self.unmount()?,
            MountState::Unmounted => {}
        }
        let before = placement.before();
        self.inner
            .rec
            .host()
            .insert_before(&placement.parent, &self.inner.node, before.as_ref())?;
        trace!(tag = %self.inner.tag, "element mounted");

        let notify = placement.notify.clone();
        *self.inner.placement.borrow_mut() = Some(placement);
        self.inner.state.set(MountState::Mounted);

        if !self.inner.ref_applied.get() {
            if let Some(node_ref) = &self.inner.node_ref {
                node_ref.assign(Some(AnyNode::new(self.inner.node.clone())));
            }
            self.inner.ref_applied.set(true);
        }

        notify(Some(self.inner.node.clone()));
        Ok(())
    }

    pub fn unmount(&self) -> Result<()> {
        if self.state() != MountState::Mounted {
            return Ok(());
        }
        let Some(placement) = self.inner.placement.borrow().clone() else {
            return Ok(());
        };
        self.inner
            .rec
            .host()
            .remove_child(&placement.parent, &self.inner.node)?;
        trace!(tag = %self.inner.tag, "element unmounted");
        self.inner.placement.borrow_mut().take();
        self.inner.state.set(MountState::Unmounted);
        (placement.notify)(None);
        Ok(())
    }

    /// Cancel property subscriptions, dispose children, clear the ref.
    ///
    /// The node is left wherever it is; detaching is `unmount`'s job.
    pub fn dispose(&self) {
        if self.state() == MountState::Disposed {
            return;
        }
        self.inner.state.set(MountState::Disposed);
        self.inner.placement.borrow_mut().take();

        let subscriptions = std::mem::take(&mut *self.inner.props.borrow_mut());
        subscriptions.into_iter().for_each(Subscription::cancel);

        if let Some(children) = &self.inner.children {
            children.dispose();
        }
        if self.inner.ref_applied.get() {
            if let Some(node_ref) = &self.inner.node_ref {
                node_ref.assign(None);
            }
        }
        trace!(tag = %self.inner.tag, "element disposed");
    }
}
