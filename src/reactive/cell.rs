//! Reactive cell view and subscriptions.
//!
//! [`Reactive<T>`] is the one shape the engine consumes for "a value that
//! changes over time". It can be built from a `spark_signals::Signal`, from a
//! getter closure that reads signals, or from a `spark_signals::derived`.
//! Subscribing installs an effect that re-reads the cell and forwards each
//! new value.

use std::fmt;
use std::rc::Rc;

use spark_signals::{derived, effect_root, effect_sync, untrack, with_context, Signal};

use crate::primitives::Cleanup;

// =============================================================================
// Reactive<T>
// =============================================================================

/// A readable, observable value.
///
/// Cloning shares the same underlying read function. Two cells are equal only
/// if they share it.
pub struct Reactive<T> {
    read: Rc<dyn Fn() -> T>,
}

impl<T: 'static> Reactive<T> {
    /// Cell computed by a getter. Every signal the getter reads becomes a
    /// dependency of whoever observes the cell.
    pub fn from_fn(read: impl Fn() -> T + 'static) -> Self {
        Self { read: Rc::new(read) }
    }

    /// Current value. Tracks dependencies when called inside an effect.
    pub fn get(&self) -> T {
        (self.read)()
    }

    /// Current value without tracking.
    pub fn peek(&self) -> T {
        untrack(|| (self.read)())
    }

    /// Address of the shared read function, the cell's identity.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.read) as *const () as usize
    }

    /// Cell whose value is `f` applied to this cell's value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Reactive<U> {
        let read = self.read.clone();
        Reactive::from_fn(move || f(read()))
    }
}

impl<T: Clone + PartialEq + 'static> Reactive<T> {
    /// Observe the cell.
    ///
    /// `on_value` runs untracked, so signals it reads do not become
    /// dependencies of the subscription, and only for values that differ from
    /// the last one seen. With `fire_immediately` it also runs synchronously
    /// with the current value before this returns.
    ///
    /// The subscription is owned by the returned handle alone: subscribing
    /// from inside another subscription's callback creates an independent
    /// root that outlives the outer callback's re-runs.
    pub fn subscribe(
        &self,
        mut on_value: impl FnMut(T) + 'static,
        options: SubscribeOptions,
    ) -> Subscription {
        let read = self.read.clone();
        let mut last: Option<T> = None;
        let mut deliver = options.fire_immediately;
        let run = move || {
            let value = read();
            if last.as_ref() == Some(&value) {
                return;
            }
            last = Some(value.clone());
            if std::mem::replace(&mut deliver, true) {
                untrack(|| on_value(value));
            }
        };
        let stop = detached(move || {
            effect_root(move || {
                // Stopped through the root.
                let _ = effect_sync(run);
            })
        });
        Subscription::new(stop)
    }

    /// Cell holding a fixed value.
    pub fn constant(value: T) -> Self {
        Reactive::from_fn(move || value.clone())
    }

    /// Memoized cell: `compute` re-runs only when a dependency changes and
    /// observers are notified only when the result differs.
    pub fn derived(compute: impl Fn() -> T + 'static) -> Self {
        let memo = derived(compute);
        Reactive::from_fn(move || memo.get())
    }
}

/// Run `f` with a clean tracking state.
///
/// Creating an effect while another one is collecting dependencies resets the
/// collector, and effects created under `untrack` would track nothing. The
/// caller's pending dependencies are set aside and tracking re-enabled for
/// the duration of `f`.
fn detached<R>(f: impl FnOnce() -> R) -> R {
    let (untracking, pending, skipped) = with_context(|ctx| {
        (
            ctx.set_untracking(false),
            ctx.swap_new_deps(Vec::new()),
            ctx.set_skipped_deps(0),
        )
    });
    let result = f();
    with_context(|ctx| {
        ctx.set_untracking(untracking);
        ctx.swap_new_deps(pending);
        ctx.set_skipped_deps(skipped);
    });
    result
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
        }
    }
}

impl<T> PartialEq for Reactive<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.read, &other.read)
    }
}

impl<T> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reactive(..)")
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for Reactive<T> {
    fn from(signal: Signal<T>) -> Self {
        Reactive::from_fn(move || signal.get())
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Options for [`Reactive::subscribe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Deliver the current value synchronously on subscribe.
    pub fire_immediately: bool,
}

impl SubscribeOptions {
    pub fn immediate() -> Self {
        Self {
            fire_immediately: true,
        }
    }
}

/// Handle to an active observation.
///
/// Dropping the handle does NOT stop the observation; call [`cancel`].
///
/// [`cancel`]: Subscription::cancel
#[must_use = "dropping a Subscription leaves it running; call cancel() to stop it"]
pub struct Subscription {
    stop: Option<Cleanup>,
}

impl Subscription {
    pub fn new(stop: impl FnOnce() + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// A subscription with nothing to stop.
    pub fn noop() -> Self {
        Self { stop: None }
    }

    /// Stop observing. Idempotent by construction: it consumes the handle.
    pub fn cancel(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
