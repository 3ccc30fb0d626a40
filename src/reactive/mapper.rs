//! Per-argument memoized derivations.
//!
//! A [`ComputedMapper`] turns a pure function of one argument into a family
//! of derived cells, one per distinct argument. Repeated reads with the same
//! argument reuse the cell, which only recomputes when a signal it read
//! changes. Actions (mutating functions wrapped with [`action`]) cannot be
//! memoized and are rejected when the mapper is created.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use spark_signals::batch;
use tracing::trace;

use crate::error::{Error, Result};

use super::cell::Reactive;

/// A one-argument function, tagged as pure or as an action.
pub enum MapperFn<A, R> {
    Pure(Rc<dyn Fn(&A) -> R>),
    Action(Rc<dyn Fn(&A) -> R>),
}

impl<A, R> Clone for MapperFn<A, R> {
    fn clone(&self) -> Self {
        match self {
            MapperFn::Pure(f) => MapperFn::Pure(f.clone()),
            MapperFn::Action(f) => MapperFn::Action(f.clone()),
        }
    }
}

impl<A: 'static, R: 'static> MapperFn<A, R> {
    pub fn pure(f: impl Fn(&A) -> R + 'static) -> Self {
        MapperFn::Pure(Rc::new(f))
    }

    pub fn is_action(&self) -> bool {
        matches!(self, MapperFn::Action(_))
    }

    /// Invoke the function. Actions run inside a batch, so observers see
    /// only the final state of everything they write.
    pub fn call(&self, arg: &A) -> R {
        match self {
            MapperFn::Pure(f) => f(arg),
            MapperFn::Action(f) => batch(|| f(arg)),
        }
    }
}

/// Wrap a mutating function as an action.
pub fn action<A: 'static, R: 'static>(f: impl Fn(&A) -> R + 'static) -> MapperFn<A, R> {
    MapperFn::Action(Rc::new(f))
}

/// Memoizing mapper from arguments to derived values.
///
/// Entries stay cached until [`forget`](Self::forget) or
/// [`clear`](Self::clear) releases them.
///
/// # Example
///
/// ```ignore
/// use spark_reconciler::{ComputedMapper, MapperFn};
/// use spark_signals::signal;
///
/// let rate = signal(2);
/// let rate_clone = rate.clone();
/// let scaled = ComputedMapper::new(MapperFn::pure(move |x: &i32| x * rate_clone.get()))?;
///
/// assert_eq!(scaled.get(&3), 6);
/// rate.set(10);
/// assert_eq!(scaled.get(&3), 30);
/// ```
pub struct ComputedMapper<A, R> {
    f: Rc<dyn Fn(&A) -> R>,
    cache: RefCell<HashMap<A, Reactive<R>>>,
}

impl<A, R> ComputedMapper<A, R>
where
    A: Clone + Eq + Hash + 'static,
    R: Clone + PartialEq + 'static,
{
    /// Fails with [`Error::ActionNotMemoizable`] for actions, before any cache
    /// is created.
    pub fn new(f: MapperFn<A, R>) -> Result<Self> {
        match f {
            MapperFn::Action(_) => Err(Error::ActionNotMemoizable),
            MapperFn::Pure(f) => Ok(Self {
                f,
                cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The derived cell for `arg`, created on first use.
    pub fn cell(&self, arg: &A) -> Reactive<R> {
        if let Some(cell) = self.cache.borrow().get(arg) {
            return cell.clone();
        }
        trace!("computed mapper: new entry");
        let f = self.f.clone();
        let key = arg.clone();
        let cell = Reactive::derived(move || f(&key));
        self.cache.borrow_mut().insert(arg.clone(), cell.clone());
        cell
    }

    /// Current value for `arg`.
    pub fn get(&self, arg: &A) -> R {
        self.cell(arg).get()
    }

    /// Drop the cached entry for `arg`.
    pub fn forget(&self, arg: &A) -> bool {
        self.cache.borrow_mut().remove(arg).is_some()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn contains(&self, arg: &A) -> bool {
        self.cache.borrow().contains_key(arg)
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::signal;
    use std::cell::Cell;

    #[test]
    fn test_action_is_rejected() {
        let result = ComputedMapper::new(action(|x: &i32| *x));
        assert!(
            matches!(result, Err(Error::ActionNotMemoizable)),
            "actions cannot be memoized"
        );
    }

    #[test]
    fn test_memoizes_per_argument() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let rate = signal(2);
        let rate_clone = rate.clone();

        let mapper = ComputedMapper::new(MapperFn::pure(move |x: &i32| {
            calls_clone.set(calls_clone.get() + 1);
            x * rate_clone.get()
        }))
        .expect("pure functions are accepted");

        assert_eq!(mapper.get(&3), 6);
        assert_eq!(mapper.get(&3), 6);
        assert_eq!(calls.get(), 1, "second read hits the cache");
        assert_eq!(mapper.get(&4), 8);
        assert_eq!(mapper.len(), 2);

        rate.set(10);
        assert_eq!(mapper.get(&3), 30, "dependency change recomputes");
    }

    #[test]
    fn test_forget_and_clear() {
        let mapper = ComputedMapper::new(MapperFn::pure(|x: &i32| x + 1)).expect("pure");
        mapper.get(&1);
        mapper.get(&2);
        assert!(mapper.forget(&1));
        assert!(!mapper.contains(&1));
        assert!(!mapper.forget(&1), "second forget finds nothing");
        mapper.clear();
        assert!(mapper.is_empty());
    }

    #[test]
    fn test_action_call_runs_in_batch() {
        let a = signal(0);
        let b = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a2, b2, seen2) = (a.clone(), b.clone(), seen.clone());
        let sub = Reactive::from_fn(move || (a2.get(), b2.get())).subscribe(
            move |pair| seen2.borrow_mut().push(pair),
            Default::default(),
        );

        let (a3, b3) = (a.clone(), b.clone());
        let set_both = action(move |v: &i32| {
            a3.set(*v);
            b3.set(*v);
        });
        set_both.call(&5);

        assert_eq!(*seen.borrow(), vec![(5, 5)], "observers see one consistent update");
        sub.cancel();
    }

    #[test]
    fn test_action_runs_once_per_call() {
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();
        let double = action(move |v: &i32| {
            *calls_clone.borrow_mut() += 1;
            v * 2
        });
        assert_eq!(double.call(&4), 8);
        assert_eq!(*calls.borrow(), 1, "the action body runs exactly once");
    }
}
