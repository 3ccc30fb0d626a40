//! Reconciliation Engine - ordering primitives for list mount points.
//!
//! The engine holds the two data structures that keep a list's physical host
//! order equal to its logical order without rescanning:
//! - [`OrderedLiveSet`]: which children currently have a realized host node,
//!   and the first such child at or after any position
//! - [`keep_set`]: which surviving children can stay where they are when a
//!   keyed sequence is reordered
//!
//! # Architecture
//!
//! Both are plain data with no host or reactive dependencies. A list mount
//! point owns one of each (the live set is rebuilt per update; the LIS scratch
//! buffers persist across updates):
//!
//! ```text
//! children:  [A]   [B]   [C]   [D]
//! live:       1     0     0     1        B renders nothing, C is detached
//! anchor(B) = node of first live child after B = D
//! ```

mod live_set;
mod reorder;

pub use live_set::OrderedLiveSet;
pub use reorder::{keep_set, longest_increasing_subsequence, LisScratch};
