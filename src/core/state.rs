//! The `State` capability trait and type identity for states.
//!
//! Every mode of behavior the host models is a concrete type implementing
//! [`State`]. The engine dispatches lifecycle hooks, event interest, and
//! transition guards through this trait; the position of a state in the
//! hierarchy is declared separately, in the
//! [`StateRegistry`](crate::registry::StateRegistry).

use std::any::{type_name, Any, TypeId};
use std::fmt;

use crate::core::event::Envelope;
use crate::machine::{Machine, StateHandle};

/// A node in the state hierarchy.
///
/// Hooks take `&self`: the engine never holds an exclusive borrow across host
/// code, which is what keeps synchronous reentrant posting safe. States that
/// carry mutable data use interior mutability (`Cell`, `RefCell`).
///
/// `did_enter` and `did_exit` fire once per transition for the state itself
/// and for each ancestor in its declared chain; propagation along the chain
/// is the engine's job, so hooks never call their parent's hook themselves.
///
/// # Example
///
/// ```rust
/// use demeanor::{Envelope, Event, Machine, State, StateHandle};
/// use std::cell::Cell;
///
/// struct TooHot;
/// impl Event for TooHot {}
///
/// struct Cooling;
/// impl State for Cooling {
///     fn did_enter(&self, _machine: &Machine) {}
///     fn did_exit(&self, _machine: &Machine) {}
/// }
///
/// struct Heating {
///     degrees: Cell<u32>,
/// }
///
/// impl State for Heating {
///     fn did_enter(&self, _machine: &Machine) {
///         self.degrees.set(20);
///     }
///
///     fn did_exit(&self, _machine: &Machine) {}
///
///     fn observes(&self, event: &Envelope) -> bool {
///         event.is::<TooHot>()
///     }
///
///     fn on_event(&self, machine: &Machine, this: &StateHandle, _event: &Envelope) {
///         machine.external_transition::<Cooling>(this);
///     }
/// }
/// ```
pub trait State: Any {
    /// Entry hook. Fires on each transition into this state, after every
    /// ancestor's entry hook. Do not invoke the parent's hook from here.
    fn did_enter(&self, machine: &Machine);

    /// Exit hook. Fires on each transition out of this state, before every
    /// ancestor's exit hook. Do not invoke the parent's hook from here.
    fn did_exit(&self, machine: &Machine);

    /// Declares which events this state's channel filter matches.
    ///
    /// Default: observes nothing.
    fn observes(&self, _event: &Envelope) -> bool {
        false
    }

    /// Transition guard, evaluated against the candidate instance before the
    /// transition runs. Returning `false` makes the transition a no-op.
    ///
    /// Default: never guarded.
    fn is_not_guarded(&self, _candidate: &dyn State) -> bool {
        true
    }

    /// Handling logic, invoked when this state's filter claims an event.
    /// `this` identifies the claiming state so it can hand itself to
    /// [`Machine::external_transition`] or [`Machine::self_transition`].
    fn on_event(&self, _machine: &Machine, _this: &StateHandle, _event: &Envelope) {}
}

impl dyn State {
    /// Whether the concrete type of this state is `T`.
    pub fn is<T: State>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Downcast to a concrete state type. Guards use this to inspect the
    /// candidate instance.
    pub fn downcast_ref<T: State>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

/// Identity of a state type: its `TypeId` plus a short display name.
///
/// Keys are how state types are referred to at runtime: in the registry, in
/// [`InitialState`](crate::initial::InitialState) declarations, and in
/// diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct StateKey {
    id: TypeId,
    name: &'static str,
}

impl StateKey {
    /// Key for the concrete state type `T`.
    pub fn of<T: State>() -> Self {
        StateKey {
            id: TypeId::of::<T>(),
            name: short_name(type_name::<T>()),
        }
    }

    /// Short type name, without the module path.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) fn short_name(full: &'static str) -> &'static str {
    match full.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
