//! # spark-reconciler
//!
//! Incremental reactive UI reconciliation for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A UI is described with immutable [`Description`]s. Rendering turns each
//! child into a mount point that owns its host nodes and subscriptions. When a
//! signal changes, only the mount point reading it does work: a property is
//! re-applied, a text node is patched, a list is reordered. Nothing is
//! re-rendered from the root and no tree is diffed.
//!
//! ```text
//! h(...) → Description → DynamicMountPoint ─┬─ HostMountPoint ── ListMountPoint (children)
//!                                           ├─ TextMountPoint
//!                                           └─ ListMountPoint ── OrderedLiveSet + keep_set
//! ```
//!
//! Render targets plug in through [`HostAdapter`]; an in-memory DOM lives in
//! [`document`].
//!
//! ## Modules
//!
//! - [`types`] - Core types (Child, Description, Key, Value)
//! - [`primitives`] - Element factory, props, refs, `show`/`each`
//! - [`reactive`] - Cells, subscriptions, observable lists, mappers
//! - [`engine`] - Live set and minimal reorder
//! - [`mount`] - Mount point state machines
//! - [`reconciler`] - Host adapter trait and render entry point
//! - [`document`] - In-memory HTML/SVG render target

pub mod document;
pub mod engine;
pub mod error;
pub mod mount;
pub mod primitives;
pub mod reactive;
pub mod reconciler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use engine::{keep_set, LisScratch, OrderedLiveSet};

pub use mount::{
    ChildMount, DynamicMountPoint, HostMountPoint, ListMountPoint, MountState, Placement,
    TextMountPoint,
};

pub use primitives::{
    create_ref, each, h, show, AnyNode, Cleanup, NodeRef, PropValue, Props, Ref,
};

pub use reactive::{
    action, ComputedMapper, MapperFn, Reactive, ReactiveList, SequenceSource, SubscribeOptions,
    Subscription,
};

pub use reconciler::{HostAdapter, HostNode, Reconciler, RenderHandle};
