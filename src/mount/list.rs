//! List mount point - a keyed sequence of children.
//!
//! Each entry is a [`DynamicMountPoint`] plus the key it was created for and
//! its current position (`mount index`). Two structures keep the host order
//! equal to the logical order:
//!
//! - `doms[i]`: first host node of entry `i`, as last reported by the entry
//! - `live`: an [`OrderedLiveSet`] with bit `i` set iff `doms[i]` is `Some`
//!
//! Entry `i` is inserted before `doms[live.query(i + 1)]`, or before the
//! list's own anchor when no later entry is live. During a bulk operation the
//! live set is dropped, entries only record their nodes, and the set is
//! rebuilt once at the end.
//!
//! # Update
//!
//! ```text
//! old:   [A, B, C, D]          keys → old index, leftmost occurrence wins
//! new:   [B, D, A, C, E]
//! order: [1, 3, 0, 2]          keep_set → B, D stay; A, C move; E is new
//!
//! 1. unmount every mounted entry not kept (A, C, and removed keys)
//! 2. reassign indices, create entries for new keys (E)
//! 3. rebuild the live set from the kept entries' nodes
//! 4. mount moved and new entries in order (A, C, E)
//! 5. dispose entries whose key is gone
//! ```
//!
//! Kept entries whose child value changed are rebound in place afterwards;
//! moved ones are rebound before they are mounted again.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::engine::{keep_set, LisScratch, OrderedLiveSet};
use crate::error::{Error, Result};
use crate::reactive::{SequenceSource, Subscription};
use crate::reconciler::{HostNode, Reconciler};
use crate::types::{Child, ChildList, Key, ListItem};

use super::{DynamicMountPoint, MountState, Placement};

/// Mount point for a keyed child sequence.
pub struct ListMountPoint<N> {
    inner: Rc<ListInner<N>>,
}

struct Entry<N> {
    key: Key,
    child: Child,
    point: DynamicMountPoint<N>,
    index: Rc<Cell<usize>>,
}

impl<N> Clone for Entry<N> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            child: self.child.clone(),
            point: self.point.clone(),
            index: self.index.clone(),
        }
    }
}

struct ListInner<N> {
    rec: Reconciler<N>,
    entries: RefCell<Vec<Entry<N>>>,
    doms: RefCell<Vec<Option<N>>>,
    live: RefCell<Option<OrderedLiveSet>>,
    updating: Cell<bool>,
    /// First node last reported to the placement.
    first_dom: RefCell<Option<N>>,
    placement: RefCell<Option<Placement<N>>>,
    source: RefCell<Option<Rc<dyn SequenceSource>>>,
    observer: RefCell<Option<Subscription>>,
    scratch: RefCell<LisScratch>,
    state: Cell<MountState>,
}

impl<N> Clone for ListMountPoint<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Drop later occurrences of a key.
fn dedupe(items: Vec<ListItem>) -> Vec<ListItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| {
            let first = seen.insert(item.key.clone());
            if !first {
                warn!(key = %item.key, "duplicate list key skipped, first occurrence wins");
            }
            first
        })
        .collect()
}

impl<N: HostNode> ListMountPoint<N> {
    /// Build entries for `list` without mounting anything.
    ///
    /// Observable lists start observing here; mutations are reconciled even
    /// while the list is unmounted.
    pub fn new(rec: Reconciler<N>, list: &ChildList) -> Result<Self> {
        let point = Self {
            inner: Rc::new(ListInner {
                rec,
                entries: RefCell::new(Vec::new()),
                doms: RefCell::new(Vec::new()),
                live: RefCell::new(None),
                updating: Cell::new(false),
                first_dom: RefCell::new(None),
                placement: RefCell::new(None),
                source: RefCell::new(None),
                observer: RefCell::new(None),
                scratch: RefCell::new(LisScratch::new()),
                state: Cell::new(MountState::Unmounted),
            }),
        };

        let items = dedupe(list.snapshot());
        let mut entries = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match DynamicMountPoint::new(point.inner.rec.clone(), item.child.clone()) {
                Ok(child_point) => entries.push(Entry {
                    key: item.key,
                    child: item.child,
                    point: child_point,
                    index: Rc::new(Cell::new(i)),
                }),
                Err(err) => {
                    entries.iter().for_each(|e: &Entry<N>| e.point.dispose());
                    return Err(err);
                }
            }
        }
        *point.inner.doms.borrow_mut() = vec![None; entries.len()];
        *point.inner.entries.borrow_mut() = entries;

        if let ChildList::Observable(source) = list {
            point.observe(source.clone());
        }
        Ok(point)
    }

    fn from_weak(weak: &Weak<ListInner<N>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn state(&self) -> MountState {
        self.inner.state.get()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Keys in current order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|e| e.key.clone())
            .collect()
    }

    /// First host node of the list, if any entry is realized.
    pub fn first_node(&self) -> Option<N> {
        self.inner.first_dom.borrow().clone()
    }

    fn observe(&self, source: Rc<dyn SequenceSource>) {
        let weak = Rc::downgrade(&self.inner);
        let subscription = source.observe(Box::new(move || {
            let Some(list) = Self::from_weak(&weak) else {
                return;
            };
            let source = list.inner.source.borrow().clone();
            if let Some(source) = source {
                if let Err(err) = list.update(source.snapshot()) {
                    list.inner.rec.report(err);
                }
            }
        }));
        *self.inner.source.borrow_mut() = Some(source);
        let previous = self.inner.observer.borrow_mut().replace(subscription);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn stop_observing(&self) {
        self.inner.source.borrow_mut().take();
        let observer = self.inner.observer.borrow_mut().take();
        if let Some(observer) = observer {
            observer.cancel();
        }
    }

    // =========================================================================
    // Anchors and node tracking
    // =========================================================================

    /// Node to insert entry `index` before.
    fn anchor_for(&self, index: usize) -> Option<N> {
        let later = {
            let live = self.inner.live.borrow();
            live.as_ref().and_then(|live| live.query(index + 1))
        };
        if let Some(j) = later {
            if let Some(node) = self.inner.doms.borrow().get(j).cloned().flatten() {
                return Some(node);
            }
        }
        let placement = self.inner.placement.borrow().clone();
        placement.and_then(|p| p.before())
    }

    fn on_child_dom_changed(&self, index: usize, dom: Option<N>) {
        {
            let mut doms = self.inner.doms.borrow_mut();
            if let Some(slot) = doms.get_mut(index) {
                *slot = dom.clone();
            }
        }
        if let Some(live) = self.inner.live.borrow_mut().as_mut() {
            if dom.is_some() {
                live.set(index);
            } else {
                live.unset(index);
            }
        }
        if !self.inner.updating.get() {
            self.update_first_dom();
        }
    }

    /// Report the list's first node to the placement if it changed.
    fn update_first_dom(&self) {
        if self.state() != MountState::Mounted {
            return;
        }
        let first = {
            let live = self.inner.live.borrow();
            let doms = self.inner.doms.borrow();
            live.as_ref()
                .and_then(OrderedLiveSet::first)
                .and_then(|i| doms.get(i).cloned().flatten())
        };
        if *self.inner.first_dom.borrow() == first {
            return;
        }
        *self.inner.first_dom.borrow_mut() = first.clone();
        let notify = self.inner.placement.borrow().as_ref().map(|p| p.notify.clone());
        if let Some(notify) = notify {
            notify(first);
        }
    }

    fn rebuild_live(&self) {
        let live = {
            let doms = self.inner.doms.borrow();
            OrderedLiveSet::from_flags(doms.len(), doms.iter().map(Option::is_some))
        };
        *self.inner.live.borrow_mut() = Some(live);
    }

    /// Placement for the entry whose position is tracked by `index`.
    fn child_placement(&self, index: Rc<Cell<usize>>) -> Option<Placement<N>> {
        let parent = self.inner.placement.borrow().as_ref()?.parent.clone();
        let weak_anchor = Rc::downgrade(&self.inner);
        let weak_notify = weak_anchor.clone();
        let index_notify = index.clone();
        Some(Placement {
            parent,
            anchor: Rc::new(move || {
                Self::from_weak(&weak_anchor).and_then(|list| list.anchor_for(index.get()))
            }),
            notify: Rc::new(move |dom| {
                if let Some(list) = Self::from_weak(&weak_notify) {
                    list.on_child_dom_changed(index_notify.get(), dom);
                }
            }),
        })
    }

    fn mount_entry(&self, position: usize) -> Result<()> {
        let entry = self.inner.entries.borrow().get(position).cloned();
        let Some(entry) = entry else {
            return Ok(());
        };
        match self.child_placement(entry.index.clone()) {
            Some(placement) => entry.point.mount(placement),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn mount(&self, placement: Placement<N>) -> Result<()> {
        match self.state() {
            MountState::Disposed => return Err(Error::Disposed),
            MountState::Mounted => self.unmount()?,
            MountState::Unmounted => {}
        }
        *self.inner.placement.borrow_mut() = Some(placement);
        self.inner.state.set(MountState::Mounted);
        trace!(len = self.len(), "list mounted");

        // Mounting in order with no live set: every entry lands before the
        // list's own anchor, after the ones mounted so far.
        self.inner.live.borrow_mut().take();
        self.inner.updating.set(true);
        let result = (0..self.len()).try_for_each(|i| self.mount_entry(i));
        self.inner.updating.set(false);
        self.rebuild_live();
        self.update_first_dom();
        result
    }

    pub fn unmount(&self) -> Result<()> {
        if self.state() != MountState::Mounted {
            return Ok(());
        }
        let entries = self.inner.entries.borrow().clone();
        self.inner.updating.set(true);
        let result = entries.iter().try_for_each(|e| e.point.unmount());
        self.inner.updating.set(false);
        self.update_first_dom();

        self.inner.state.set(MountState::Unmounted);
        self.inner.placement.borrow_mut().take();
        self.inner.first_dom.borrow_mut().take();
        trace!("list unmounted");
        result
    }

    /// Stop observing and dispose every entry. Idempotent.
    pub fn dispose(&self) {
        if self.state() == MountState::Disposed {
            return;
        }
        self.inner.state.set(MountState::Disposed);
        self.stop_observing();
        let entries = std::mem::take(&mut *self.inner.entries.borrow_mut());
        for entry in &entries {
            entry.point.dispose();
        }
        self.inner.doms.borrow_mut().clear();
        self.inner.live.borrow_mut().take();
        self.inner.placement.borrow_mut().take();
        self.inner.first_dom.borrow_mut().take();
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Reconcile against `list`, switching observed sources if it changed.
    pub fn update_from(&self, list: &ChildList) -> Result<()> {
        match list {
            ChildList::Items(items) => {
                if self.inner.source.borrow().is_some() {
                    self.stop_observing();
                }
                self.update(items.to_vec())
            }
            ChildList::Observable(source) => {
                let same = self
                    .inner
                    .source
                    .borrow()
                    .as_ref()
                    .is_some_and(|current| Rc::ptr_eq(current, source));
                if !same {
                    self.observe(source.clone());
                }
                self.update(source.snapshot())
            }
        }
    }

    /// Reconcile the mounted entries against a new snapshot.
    pub fn update(&self, items: Vec<ListItem>) -> Result<()> {
        if self.state() == MountState::Disposed {
            return Ok(());
        }
        self.inner.updating.set(true);
        let applied = self.apply(dedupe(items));
        self.inner.updating.set(false);
        let rebinds = applied?;

        self.update_first_dom();
        for (point, child) in rebinds {
            point.replace(child)?;
        }
        Ok(())
    }

    fn apply(&self, items: Vec<ListItem>) -> Result<Vec<(DynamicMountPoint<N>, Child)>> {
        let mounted = self.state() == MountState::Mounted;
        let old = self.inner.entries.borrow().clone();
        let old_doms = self.inner.doms.borrow().clone();

        let old_index: HashMap<&Key, usize> = old
            .iter()
            .enumerate()
            .map(|(i, entry)| (&entry.key, i))
            .collect();
        let sources: Vec<Option<usize>> = items
            .iter()
            .map(|item| old_index.get(&item.key).copied())
            .collect();
        let order: Vec<usize> = sources.iter().flatten().copied().collect();
        let keep = keep_set(&order, old.len(), &mut self.inner.scratch.borrow_mut());

        if mounted {
            for (i, entry) in old.iter().enumerate() {
                if !keep[i] {
                    entry.point.unmount()?;
                }
            }
        }

        let mut entries = Vec::with_capacity(items.len());
        let mut doms = Vec::with_capacity(items.len());
        let mut to_mount = Vec::new();
        let mut rebinds = Vec::new();
        let mut reused = vec![false; old.len()];
        let mut kept = 0usize;

        for (position, (item, source)) in items.into_iter().zip(sources).enumerate() {
            match source {
                Some(i) => {
                    let mut entry = old[i].clone();
                    reused[i] = true;
                    entry.index.set(position);
                    let changed = entry.child != item.child;
                    if keep[i] {
                        kept += 1;
                        doms.push(old_doms.get(i).cloned().flatten());
                        if changed {
                            rebinds.push((entry.point.clone(), item.child.clone()));
                        }
                    } else {
                        doms.push(None);
                        if changed {
                            entry.point.replace(item.child.clone())?;
                        }
                        to_mount.push(position);
                    }
                    entry.child = item.child;
                    entries.push(entry);
                }
                None => {
                    let point = DynamicMountPoint::new(self.inner.rec.clone(), item.child.clone())?;
                    doms.push(None);
                    to_mount.push(position);
                    entries.push(Entry {
                        key: item.key,
                        child: item.child,
                        point,
                        index: Rc::new(Cell::new(position)),
                    });
                }
            }
        }

        let created = entries.len() - order.len();
        let moved = to_mount.len() - created;
        *self.inner.entries.borrow_mut() = entries;
        *self.inner.doms.borrow_mut() = doms;
        self.rebuild_live();

        if mounted {
            for position in to_mount {
                self.mount_entry(position)?;
            }
        }

        let mut removed = 0usize;
        for (i, entry) in old.iter().enumerate() {
            if !reused[i] {
                entry.point.dispose();
                removed += 1;
            }
        }

        debug!(kept, moved, created, removed, "list updated");
        Ok(rebinds)
    }
}
