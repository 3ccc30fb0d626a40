//! Primitives - Building blocks for descriptions.
//!
//! This module provides what application code writes:
//! - [`h`] - Element factory for host tags and components
//! - [`Props`] / [`PropValue`] - Static, signal or getter properties
//! - [`create_ref`] / [`NodeRef`] - Access to realized host nodes
//! - [`show`] / [`each`] - Conditional and keyed list rendering
//!
//! # Reactivity
//!
//! Props can be:
//! - Static values: `.with("class", "big")`
//! - Signals: `.with("class", class_signal)` (stays connected!)
//! - Getters: `.with_getter("class", move || compute_class())`
//!
//! The key is to pass props directly - don't extract values before binding!
//!
//! ```ignore
//! // CORRECT - signal stays connected, the node is patched in place
//! h("div", Props::new().with("class", class_signal), vec![]);
//!
//! // WRONG - extracts value, breaks reactivity
//! h("div", Props::new().with("class", class_signal.get()), vec![]);
//! ```

mod control_flow;
mod element;
mod types;

pub use control_flow::{each, show};
pub use element::h;
pub use types::*;
