//! Text mount point - a single text node.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::reconciler::{HostNode, Reconciler};

use super::{MountState, Placement};

/// Owns one host text node. Text changes patch the node in place.
pub struct TextMountPoint<N> {
    inner: Rc<TextInner<N>>,
}

struct TextInner<N> {
    rec: Reconciler<N>,
    node: N,
    placement: RefCell<Option<Placement<N>>>,
    state: Cell<MountState>,
}

impl<N> Clone for TextMountPoint<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<N: HostNode> TextMountPoint<N> {
    pub fn new(rec: Reconciler<N>, text: &str) -> Result<Self> {
        let node = rec.host().create_text_node(text)?;
        Ok(Self {
            inner: Rc::new(TextInner {
                rec,
                node,
                placement: RefCell::new(None),
                state: Cell::new(MountState::Unmounted),
            }),
        })
    }

    pub fn node(&self) -> &N {
        &self.inner.node
    }

    pub fn state(&self) -> MountState {
        self.inner.state.get()
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        self.inner.rec.host().set_text_content(&self.inner.node, text)
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
        trace!("text mounted");
        let notify = placement.notify.clone();
        *self.inner.placement.borrow_mut() = Some(placement);
        self.inner.state.set(MountState::Mounted);
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
        trace!("text unmounted");
        self.inner.placement.borrow_mut().take();
        self.inner.state.set(MountState::Unmounted);
        (placement.notify)(None);
        Ok(())
    }

    pub fn dispose(&self) {
        if self.state() == MountState::Disposed {
            return;
        }
        self.inner.placement.borrow_mut().take();
        self.inner.state.set(MountState::Disposed);
    }
}
