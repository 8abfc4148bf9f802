//! The machine: active-set bookkeeping, transitions, and event posting.
//!
//! A [`Machine`] owns the shared event channel and the set of currently
//! active leaf states. Host code posts events with [`Machine::post`]; state
//! handling logic calls back in with [`Machine::external_transition`] or
//! [`Machine::self_transition`]. Dispatch is single-threaded and fully
//! synchronous: the whole chain from post through filter match, handling
//! logic, and any resulting transition runs to completion before `post`
//! returns. The handle is cheap to clone; clones share one machine.

use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::event::{Envelope, Event};
use crate::core::state::{short_name, State, StateKey};
use crate::creator::{RegistryCreator, StateCreator};
use crate::initial::InitialState;
use crate::registry::StateRegistry;

pub(crate) mod channel;
pub(crate) mod node;
mod verify;

pub use node::StateHandle;

use channel::EventChannel;
use node::Node;
use verify::TransitionVerifier;

/// Orchestrates the active-state set and the shared event channel.
///
/// Construction bootstraps the machine: the [`InitialState`]'s declared types
/// are activated through initial transitions (entry hooks only, nothing is
/// exited). Not safe for concurrent use: the type is `!Send`/`!Sync` by
/// construction, and concurrent posting would need external serialization.
#[derive(Clone)]
pub struct Machine {
    core: Rc<MachineCore>,
}

struct MachineCore {
    registry: Rc<StateRegistry>,
    creator: Box<dyn StateCreator>,
    channel: EventChannel,
    active: RefCell<Vec<Rc<Node>>>,
    verify_events: Cell<bool>,
    verifier: TransitionVerifier,
}

impl Machine {
    /// Start configuring a machine over the given hierarchy.
    pub fn builder(registry: StateRegistry) -> MachineBuilder {
        MachineBuilder {
            registry,
            creator: None,
            verify_events: false,
        }
    }

    /// Build a machine with the default creator and verification off, and
    /// bootstrap it from `initial`.
    pub fn new(registry: StateRegistry, initial: &InitialState) -> Machine {
        Machine::builder(registry).start(initial)
    }

    /// Publish an event on the shared channel, exactly once.
    ///
    /// In verification mode the event's
    /// [`assert_validity`](Event::assert_validity) check runs first. Delivery
    /// is synchronous, in subscription order; the first filter whose interest
    /// predicate matches claims the event and no other state's handling logic
    /// observes it.
    pub fn post<E: Event>(&self, event: E) {
        let name = short_name(type_name::<E>());
        let envelope = Envelope::new(Box::new(event), name, self.clone());
        if self.core.verify_events.get() {
            envelope.payload().assert_validity(&self.active_states());
        }
        trace!(event = name, "posting");
        self.core.channel.publish(self, &envelope);
    }

    /// Transition from an active state to a fresh instance of `T`.
    ///
    /// The candidate instance is resolved first and shown to `from`'s guard;
    /// a guarded transition is a complete no-op: the active set, the
    /// channel, and every entry/exit hook stay untouched, and the candidate
    /// is discarded without ever subscribing. Otherwise `from`'s chain exits
    /// (leaf first), the active set swaps, and the new chain enters
    /// (root first).
    pub fn external_transition<T: State>(&self, from: &StateHandle) {
        self.transition(from, StateKey::of::<T>());
    }

    /// Exit and fully re-enter a fresh instance of the state's own type.
    pub fn self_transition(&self, state: &StateHandle) {
        self.transition(state, state.key());
    }

    /// Whether some member of the active-state set is a `T`.
    ///
    /// Queries are polymorphic through the declared hierarchy: an active
    /// leaf "is" every type in its ancestor chain.
    pub fn is_active<T: State>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.core
            .active
            .borrow()
            .iter()
            .any(|node| node.lineage().iter().any(|key| key.id() == id))
    }

    /// Snapshot of the active-state set.
    pub fn active_states(&self) -> ActiveStates {
        ActiveStates {
            states: self
                .core
                .active
                .borrow()
                .iter()
                .map(|node| StateHandle {
                    node: Rc::clone(node),
                })
                .collect(),
        }
    }

    /// Enable event verification: `assert_validity` on post and the
    /// once-per-transition entry/exit checks. Off by default; intended for
    /// development and test builds.
    pub fn should_verify_events(&self) {
        self.core.verify_events.set(true);
    }

    /// Disable event verification.
    pub fn no_event_verification(&self) {
        self.core.verify_events.set(false);
    }

    pub(crate) fn is_verifying_events(&self) -> bool {
        self.core.verify_events.get()
    }

    pub(crate) fn verifier(&self) -> &TransitionVerifier {
        &self.core.verifier
    }

    // Bootstrap-only activation: subscribe, add to the active set, enter.
    // The one path into the active set with no prior exit.
    pub(crate) fn initial_transition(&self, to: StateKey) {
        debug!(state = %to, "initial transition");
        let node = self.resolve(to);
        node.create();
        self.core.active.borrow_mut().push(Rc::clone(&node));
        node.entry(self);
    }

    fn transition(&self, from: &StateHandle, to: StateKey) {
        self.core.verifier.begin();
        let node = self.resolve(to);
        if !from.state().is_not_guarded(node.behavior()) {
            debug!(from = %from.key(), to = %to, "transition blocked by guard");
            return;
        }
        debug!(from = %from.key(), to = %to, "external transition");
        node.create();
        from.node().exit(self);
        {
            let mut active = self.core.active.borrow_mut();
            active.retain(|candidate| !Rc::ptr_eq(candidate, from.node()));
            active.push(Rc::clone(&node));
        }
        node.entry(self);
    }

    // Resolve a fresh, not-yet-subscribed instance through the creator.
    fn resolve(&self, to: StateKey) -> Rc<Node> {
        self.core.registry.require(to);
        let behavior = self.core.creator.create_state(to);
        if (&*behavior as &dyn Any).type_id() != to.id() {
            panic!("state creator produced an instance of a different type than `{to}`");
        }
        Node::new(
            to,
            behavior,
            self.core.channel.clone(),
            Rc::clone(&self.core.registry),
        )
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Machine {}", self.active_states())
    }
}

/// Configures and starts a [`Machine`].
pub struct MachineBuilder {
    registry: StateRegistry,
    creator: Option<Box<dyn StateCreator>>,
    verify_events: bool,
}

impl MachineBuilder {
    /// Use a host-supplied [`StateCreator`] instead of the registry-backed
    /// default, for dependency injection into leaf states.
    pub fn creator(mut self, creator: impl StateCreator + 'static) -> Self {
        self.creator = Some(Box::new(creator));
        self
    }

    /// Enable verification before bootstrap, so hierarchy bugs in the
    /// initial configuration are caught too.
    pub fn verify_events(mut self) -> Self {
        self.verify_events = true;
        self
    }

    /// Construct the machine and perform the initial transition.
    pub fn start(self, initial: &InitialState) -> Machine {
        let registry = Rc::new(self.registry);
        let creator = self
            .creator
            .unwrap_or_else(|| Box::new(RegistryCreator::new(Rc::clone(&registry))));
        let machine = Machine {
            core: Rc::new(MachineCore {
                registry,
                creator,
                channel: EventChannel::new(),
                active: RefCell::new(Vec::new()),
                verify_events: Cell::new(self.verify_events),
                verifier: TransitionVerifier::new(),
            }),
        };
        // The whole bootstrap is one transition scope: two declared leaves
        // sharing an ancestor type double-enter it, which verification
        // treats as a hierarchy bug.
        machine.core.verifier.begin();
        initial.enter(&machine);
        machine
    }
}

/// Snapshot of the active-state set, as handed to
/// [`Event::assert_validity`] and rendered by `Display` for diagnostics.
///
/// Rendering is a comma-joined, brace-delimited list (`{ Idle, Running }`);
/// order follows the set's native iteration order, so tests should assert on
/// membership rather than position.
pub struct ActiveStates {
    states: Vec<StateHandle>,
}

impl ActiveStates {
    /// Polymorphic membership: true if any active leaf is a `T`, directly or
    /// through its ancestor chain.
    pub fn contains<T: State>(&self) -> bool {
        self.states.iter().any(|state| state.is::<T>())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateHandle> {
        self.states.iter()
    }
}

impl fmt::Display for ActiveStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.states.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (position, state) in self.states.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            f.write_str(state.name())?;
        }
        f.write_str(" }")
    }
}

impl fmt::Debug for ActiveStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
