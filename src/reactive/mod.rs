//! Reactive contracts consumed by the mount points.
//!
//! - [`Reactive`] / [`Subscription`] - a value that changes over time
//! - [`SequenceSource`] / [`ReactiveList`] - a sequence that changes over time
//! - [`ComputedMapper`] - memoized per-argument derivations
//!
//! Dependency tracking, scheduling and batching all come from
//! `spark-signals`; this module only shapes them for the engine.

mod cell;
mod list;
mod mapper;

pub use cell::{Reactive, SubscribeOptions, Subscription};
pub use list::{ReactiveList, SequenceSource};
pub use mapper::{action, ComputedMapper, MapperFn};
