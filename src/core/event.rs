//! Events and the envelope they travel in.
//!
//! Hosts define plain payload types implementing [`Event`] and hand them to
//! [`Machine::post`](crate::machine::Machine::post). The machine wraps each
//! posted payload in an [`Envelope`] carrying the claimed flag and the owning
//! machine, both bound exactly once at post time. Filters see envelopes;
//! the first filter whose interest predicate matches claims the envelope and
//! no later filter observes it.

use std::any::Any;
use std::cell::Cell;
use std::fmt;

use crate::machine::{ActiveStates, Machine};

/// Something that triggers behavior in the state machine.
///
/// The trait itself carries no data contract; payload fields are the host's
/// business. `assert_validity` is the one hook the engine calls, and only in
/// verification mode.
pub trait Event: Any {
    /// Assertions about the validity of this event given the current active
    /// states, run by [`Machine::post`](crate::machine::Machine::post) before
    /// publication when verification mode is on.
    ///
    /// The default does nothing. Implementations signal a structurally
    /// impossible event by panicking; the panic propagates out of `post`
    /// unchanged, with no recovery layered on top.
    fn assert_validity(&self, _active: &ActiveStates) {}
}

/// A posted event: the payload plus the engine's per-instance bookkeeping.
///
/// The claimed flag flips `false` to `true` at most once per envelope, at
/// filter-match time, before any handling logic runs. Re-posting an
/// equal-shaped payload creates a distinct envelope with a fresh flag.
pub struct Envelope {
    payload: Box<dyn Event>,
    name: &'static str,
    claimed: Cell<bool>,
    machine: Machine,
}

impl Envelope {
    pub(crate) fn new(payload: Box<dyn Event>, name: &'static str, machine: Machine) -> Self {
        Envelope {
            payload,
            name,
            claimed: Cell::new(false),
            machine,
        }
    }

    /// Short type name of the payload, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The machine this event was posted on.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Whether the payload is of type `E`.
    pub fn is<E: Event>(&self) -> bool {
        (&*self.payload as &dyn Any).is::<E>()
    }

    /// Downcast the payload to a concrete event type.
    pub fn get<E: Event>(&self) -> Option<&E> {
        (&*self.payload as &dyn Any).downcast_ref::<E>()
    }

    /// Whether some filter has already claimed this envelope.
    pub fn was_claimed(&self) -> bool {
        self.claimed.get()
    }

    // Claiming is the filter mechanism's job, never the event author's.
    pub(crate) fn claim(&self) {
        self.claimed.set(true);
    }

    pub(crate) fn payload(&self) -> &dyn Event {
        &*self.payload
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("event", &self.name)
            .field("claimed", &self.claimed.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial::InitialState;
    use crate::registry::StateRegistry;

    struct Ping;
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    fn idle_machine() -> Machine {
        let registry = StateRegistry::builder().build().unwrap();
        Machine::new(registry, &InitialState::new())
    }

    #[test]
    fn payload_downcasts_by_type() {
        let envelope = Envelope::new(Box::new(Ping), "Ping", idle_machine());
        assert!(envelope.is::<Ping>());
        assert!(!envelope.is::<Pong>());
        assert!(envelope.get::<Ping>().is_some());
        assert!(envelope.get::<Pong>().is_none());
        assert_eq!(envelope.name(), "Ping");
    }

    #[test]
    fn claim_flips_once_and_sticks() {
        let envelope = Envelope::new(Box::new(Ping), "Ping", idle_machine());
        assert!(!envelope.was_claimed());
        envelope.claim();
        assert!(envelope.was_claimed());
        envelope.claim();
        assert!(envelope.was_claimed());
    }

    #[test]
    fn envelopes_are_distinct_instances() {
        let machine = idle_machine();
        let first = Envelope::new(Box::new(Ping), "Ping", machine.clone());
        let second = Envelope::new(Box::new(Ping), "Ping", machine);
        first.claim();
        assert!(!second.was_claimed());
    }
}
