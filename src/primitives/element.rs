//! Element factory.
//!
//! `h` is the single way to build a [`Description`]. Components receive the
//! same [`Props`], so children passed here are visible to them through
//! [`Props::child_list`].

use crate::types::{Child, ChildList, Description, Kind};

use super::types::Props;

/// Build a description of a host tag or a component invocation.
///
/// Non-empty `children` become the unkeyed child list of the props,
/// replacing any list set with [`Props::children`]. Pass an empty vector to
/// keep a list set on the props (for example a keyed or observable one).
///
/// # Example
///
/// ```ignore
/// use spark_reconciler::{h, Props};
///
/// let item = h("li", Props::new().with("class", "done"), vec!["Write tests".into()]);
/// let list = h("ul", Props::new(), vec![item.into()]);
/// ```
pub fn h(kind: impl Into<Kind>, mut props: Props, children: Vec<Child>) -> Description {
    if !children.is_empty() {
        props.set_children(ChildList::unkeyed(children));
    }
    Description::new(kind.into(), props)
}
