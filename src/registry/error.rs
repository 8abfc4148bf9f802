//! Build errors for the state registry.

use thiserror::Error;

/// Errors that can occur when building a [`StateRegistry`](super::StateRegistry).
///
/// These are configuration-validation failures surfaced at wiring time, before
/// any machine exists. Defects that only show up later (an unregistered type
/// requested at transition time, a factory producing the wrong type) are
/// fatal and abort instead.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State `{name}` is registered more than once")]
    DuplicateState { name: &'static str },

    #[error("State `{state}` declares parent `{parent}`, which is not registered")]
    UnknownParent {
        state: &'static str,
        parent: &'static str,
    },

    #[error("State `{state}` participates in a cyclic parent chain")]
    CyclicHierarchy { state: &'static str },
}
