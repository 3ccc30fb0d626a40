//! Control Flow Primitives - Conditional and list rendering.
//!
//! This module provides control flow primitives for dynamic children:
//! - [`show`] - Conditional rendering based on a reactive condition
//! - [`each`] - Keyed list rendering with fine-grained item updates
//!
//! # Pattern: Cells of children
//!
//! Both primitives return a [`Child::Cell`]. The mount point that receives it
//! subscribes to the cell, so the primitive itself owns no effect and needs
//! no cleanup: disposing the mount point stops everything.
//!
//! Branch and item renderers run untracked. Signals they read while
//! *building* a description do not re-trigger the primitive; reactive props
//! and nested cells inside the description stay live on their own.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use spark_signals::{signal, untrack, Signal};
use tracing::warn;

use crate::reactive::Reactive;
use crate::types::{Child, ChildList, Key, ListItem};

// =============================================================================
// show() - Conditional rendering
// =============================================================================

/// Render `then_fn` while `condition` holds, `else_fn` (or nothing) otherwise.
///
/// Branches are rebuilt only when the condition flips, not every time one of
/// its dependencies changes.
///
/// # Example
///
/// ```ignore
/// let visible = signal(true);
/// let visible_clone = visible.clone();
///
/// let child = show(
///     move || visible_clone.get(),
///     || h("p", Props::new(), vec!["Visible!".into()]).into(),
///     None::<fn() -> Child>,
/// );
///
/// visible.set(false); // <p> unmounted and disposed
/// ```
pub fn show<ThenF, ElseF>(
    condition: impl Fn() -> bool + 'static,
    then_fn: ThenF,
    else_fn: Option<ElseF>,
) -> Child
where
    ThenF: Fn() -> Child + 'static,
    ElseF: Fn() -> Child + 'static,
{
    let condition = Reactive::derived(condition);
    Child::Cell(Reactive::from_fn(move || {
        if condition.get() {
            untrack(&then_fn)
        } else {
            else_fn.as_ref().map_or(Child::Empty, |f| untrack(f))
        }
    }))
}

// =============================================================================
// each() - List rendering with fine-grained reactivity
// =============================================================================

/// Render a list reactively with fine-grained updates.
///
/// Creates one child per item, tracked by the key `key_fn` extracts. When the
/// items change:
/// - New keys: create an item signal and render
/// - Existing keys: update the item signal only (NO re-render!)
/// - Removed keys: dropped; the list mount point disposes their subtree
///
/// The list mount point then reconciles positions with the minimal number of
/// moves.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, PartialEq)]
/// struct Todo { id: i64, text: String }
///
/// let todos = signal(vec![Todo { id: 1, text: "First".into() }]);
/// let todos_clone = todos.clone();
///
/// let items = each(
///     move || todos_clone.get(),
///     |todo| todo.id,
///     |todo, _key| {
///         let text = todo.map(|t| Child::from(t.text));
///         h("li", Props::new(), vec![Child::Cell(text)]).into()
///     },
/// );
///
/// // Same key: the <li> stays, only its text node is patched
/// todos.set(vec![Todo { id: 1, text: "Updated".into() }]);
/// ```
///
/// # Duplicate Key Handling
///
/// Duplicate keys are warned but don't crash. Only the first occurrence is
/// rendered.
pub fn each<T, K>(
    items_fn: impl Fn() -> Vec<T> + 'static,
    key_fn: impl Fn(&T) -> K + 'static,
    render_fn: impl Fn(Reactive<T>, &Key) -> Child + 'static,
) -> Child
where
    T: Clone + PartialEq + 'static,
    K: Into<Key> + 'static,
{
    // Key -> (item signal, rendered child)
    let rendered: Rc<RefCell<HashMap<Key, (Signal<T>, Child)>>> =
        Rc::new(RefCell::new(HashMap::new()));

    Child::Cell(Reactive::from_fn(move || {
        let items = items_fn();
        untrack(|| {
            let mut seen = HashSet::with_capacity(items.len());
            let mut out = Vec::with_capacity(items.len());

            for item in items {
                let key: Key = key_fn(&item).into();
                if !seen.insert(key.clone()) {
                    warn!(%key, "each(): duplicate key skipped, keys must be unique");
                    continue;
                }

                let existing = rendered.borrow().get(&key).cloned();
                let child = match existing {
                    Some((item_signal, child)) => {
                        item_signal.set(item);
                        child
                    }
                    None => {
                        let item_signal = signal(item);
                        let child = render_fn(Reactive::from(item_signal.clone()), &key);
                        rendered
                            .borrow_mut()
                            .insert(key.clone(), (item_signal, child.clone()));
                        child
                    }
                };
                out.push(ListItem { key, child });
            }

            rendered.borrow_mut().retain(|key, _| seen.contains(key));
            Child::List(ChildList::from_items(out))
        })
    }))
}
