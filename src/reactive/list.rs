//! Observable sequences.
//!
//! A list mount point bound to a [`SequenceSource`] re-reads the snapshot
//! whenever the source reports a change and reconciles it against what is
//! mounted. [`ReactiveList`] is the in-crate source: a keyed vector that bumps
//! a revision signal on every mutation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::types::{Child, Key, ListItem};

use super::cell::{Reactive, SubscribeOptions, Subscription};

/// A sequence of keyed children that can be observed for changes.
pub trait SequenceSource {
    /// Current items in order.
    fn snapshot(&self) -> Vec<ListItem>;

    /// Call `on_change` after every mutation until the returned
    /// subscription is cancelled. Not called for the current state.
    fn observe(&self, on_change: Box<dyn FnMut()>) -> Subscription;
}

/// Keyed, observable child vector.
///
/// Cloning yields another handle to the same list.
///
/// # Example
///
/// ```ignore
/// use spark_reconciler::{h, ChildList, Props, ReactiveList};
///
/// let todos = ReactiveList::new();
/// todos.push("a", "Write code");
/// let ul = h("ul", Props::new().children(ChildList::observable(todos.clone())), Vec::new());
///
/// todos.push("b", "Ship it"); // one new <li>, nothing else touched
/// ```
#[derive(Clone)]
pub struct ReactiveList {
    items: Rc<RefCell<Vec<ListItem>>>,
    revision: Signal<u64>,
    counter: Rc<Cell<u64>>,
}

impl Default for ReactiveList {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveList {
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    pub fn from_items(items: impl IntoIterator<Item = ListItem>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items.into_iter().collect())),
            revision: signal(0),
            counter: Rc::new(Cell::new(0)),
        }
    }

    fn changed(&self) {
        let next = self.counter.get() + 1;
        self.counter.set(next);
        self.revision.set(next);
    }

    /// Number of mutations so far. Reading it inside an effect tracks the list.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn push(&self, key: impl Into<Key>, child: impl Into<Child>) {
        self.items.borrow_mut().push(ListItem::new(key, child));
        self.changed();
    }

    /// Insert at `index`, clamped to the length.
    pub fn insert(&self, index: usize, key: impl Into<Key>, child: impl Into<Child>) {
        {
            let mut items = self.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, ListItem::new(key, child));
        }
        self.changed();
    }

    pub fn remove(&self, index: usize) -> Option<ListItem> {
        let removed = {
            let mut items = self.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.changed();
        }
        removed
    }

    /// Remove the first item with `key`.
    pub fn remove_key(&self, key: &Key) -> Option<ListItem> {
        let position = self.items.borrow().iter().position(|item| &item.key == key);
        position.and_then(|i| self.remove(i))
    }

    /// Move the item at `from` so it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) {
        {
            let mut items = self.items.borrow_mut();
            if from >= items.len() || from == to {
                return;
            }
            let item = items.remove(from);
            let to = to.min(items.len());
            items.insert(to, item);
        }
        self.changed();
    }

    pub fn swap(&self, a: usize, b: usize) {
        {
            let mut items = self.items.borrow_mut();
            if a >= items.len() || b >= items.len() || a == b {
                return;
            }
            items.swap(a, b);
        }
        self.changed();
    }

    /// Replace the child of the item with `key`, keeping its position.
    pub fn set(&self, key: &Key, child: impl Into<Child>) -> bool {
        let found = {
            let mut items = self.items.borrow_mut();
            match items.iter_mut().find(|item| &item.key == key) {
                Some(item) => {
                    item.child = child.into();
                    true
                }
                None => false,
            }
        };
        if found {
            self.changed();
        }
        found
    }

    pub fn retain(&self, mut keep: impl FnMut(&ListItem) -> bool) {
        let changed = {
            let mut items = self.items.borrow_mut();
            let before = items.len();
            items.retain(|item| keep(item));
            items.len() != before
        };
        if changed {
            self.changed();
        }
    }

    pub fn clear(&self) {
        let was_empty = {
            let mut items = self.items.borrow_mut();
            let was_empty = items.is_empty();
            items.clear();
            was_empty
        };
        if !was_empty {
            self.changed();
        }
    }

    /// Replace the whole contents.
    pub fn replace(&self, items: impl IntoIterator<Item = ListItem>) {
        *self.items.borrow_mut() = items.into_iter().collect();
        self.changed();
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ListItem> {
        self.items.borrow().get(index).cloned()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.items.borrow().iter().map(|item| item.key.clone()).collect()
    }
}

impl SequenceSource for ReactiveList {
    fn snapshot(&self) -> Vec<ListItem> {
        self.items.borrow().clone()
    }

    fn observe(&self, mut on_change: Box<dyn FnMut()>) -> Subscription {
        Reactive::from(self.revision.clone())
            .subscribe(move |_| on_change(), SubscribeOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutations_reorder_items() {
        let list = ReactiveList::new();
        list.push("a", "A");
        list.push("b", "B");
        list.push("c", "C");
        list.move_item(0, 2);
        assert_eq!(list.keys(), vec![Key::from("b"), Key::from("c"), Key::from("a")]);
        list.swap(0, 1);
        assert_eq!(list.keys(), vec![Key::from("c"), Key::from("b"), Key::from("a")]);
        list.insert(10, "d", "D");
        assert_eq!(list.len(), 4, "insert index is clamped");
        assert_eq!(list.remove_key(&Key::from("b")).map(|i| i.key), Some(Key::from("b")));
        list.retain(|item| item.key != Key::from("a"));
        assert_eq!(list.keys(), vec![Key::from("c"), Key::from("d")]);
    }

    #[test]
    fn test_observe_reports_each_mutation() {
        let list = ReactiveList::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let sub = list.observe(Box::new(move || count_clone.set(count_clone.get() + 1)));

        assert_eq!(count.get(), 0, "observe does not fire for the current state");
        list.push(1, "one");
        list.push(2, "two");
        list.clear();
        assert_eq!(count.get(), 3);

        list.clear();
        assert_eq!(count.get(), 3, "clearing an empty list is not a change");
        sub.cancel();
        list.push(3, "three");
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_out_of_range_mutations_are_ignored() {
        let list = ReactiveList::from_items(vec![ListItem::new(1, "x")]);
        let before = list.revision();
        assert!(list.remove(5).is_none());
        list.swap(0, 3);
        list.move_item(4, 0);
        assert_eq!(list.revision(), before, "no revision bump without a change");
    }
}
