//! Live state instances and their ancestor chains.
//!
//! A [`Node`] wraps one constructed state behavior together with everything
//! the engine tracks about it: its channel subscription, its static lineage
//! (key chain, for polymorphic queries), and its superchain, the ancestor
//! pseudo-instances that are entered before it and exited after it. The
//! superchain is derived from the registry's declared parent links the first
//! time it is requested and cached for the instance's lifetime; ancestor
//! instances are owned by the leaf and die with it.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::event::Envelope;
use crate::core::state::{State, StateKey};
use crate::machine::channel::{EventChannel, SubscriptionId};
use crate::machine::Machine;
use crate::registry::StateRegistry;

pub(crate) struct Node {
    key: StateKey,
    lineage: Vec<StateKey>,
    behavior: Box<dyn State>,
    channel: EventChannel,
    registry: Rc<StateRegistry>,
    subscription: Cell<Option<SubscriptionId>>,
    superchain: RefCell<Option<Rc<Vec<Rc<Node>>>>>,
}

impl Node {
    pub(crate) fn new(
        key: StateKey,
        behavior: Box<dyn State>,
        channel: EventChannel,
        registry: Rc<StateRegistry>,
    ) -> Rc<Node> {
        let lineage = registry.lineage(key);
        Rc::new(Node {
            key,
            lineage,
            behavior,
            channel,
            registry,
            subscription: Cell::new(None),
            superchain: RefCell::new(None),
        })
    }

    pub(crate) fn key(&self) -> StateKey {
        self.key
    }

    pub(crate) fn lineage(&self) -> &[StateKey] {
        &self.lineage
    }

    pub(crate) fn behavior(&self) -> &dyn State {
        &*self.behavior
    }

    /// Install this instance's filtered view of the shared channel.
    pub(crate) fn create(self: &Rc<Self>) {
        let id = self.channel.subscribe(self);
        self.subscription.set(Some(id));
    }

    fn unsubscribe(&self) {
        if let Some(id) = self.subscription.take() {
            self.channel.unsubscribe(id);
        }
    }

    /// Filtered delivery. The filter is "not already claimed AND observed";
    /// on a match the envelope is claimed *before* the handling logic runs,
    /// so the dedup property holds even when a handler posts a new event
    /// synchronously.
    pub(crate) fn deliver(self: &Rc<Self>, machine: &Machine, event: &Envelope) {
        if event.was_claimed() || !self.behavior.observes(event) {
            return;
        }
        event.claim();
        debug!(state = %self.key, event = event.name(), "event claimed");
        let this = StateHandle {
            node: Rc::clone(self),
        };
        self.behavior.on_event(machine, &this, event);
    }

    /// Entry propagation, root -> leaf: each ancestor's `did_enter` in chain
    /// order, oldest ancestor first, then the leaf's own.
    pub(crate) fn entry(&self, machine: &Machine) {
        let chain = self.superchain();
        let verifying = machine.is_verifying_events();
        for ancestor in chain.iter() {
            machine.verifier().note_entry(verifying, ancestor.key);
            trace!(state = %ancestor.key, "did_enter");
            ancestor.behavior.did_enter(machine);
        }
        machine.verifier().note_entry(verifying, self.key);
        trace!(state = %self.key, "did_enter");
        self.behavior.did_enter(machine);
    }

    /// Exit propagation, leaf -> root: unsubscribe and `did_exit` the leaf,
    /// then each ancestor, leaf-most ancestor first.
    pub(crate) fn exit(&self, machine: &Machine) {
        let verifying = machine.is_verifying_events();
        machine.verifier().note_exit(verifying, self.key);
        self.unsubscribe();
        trace!(state = %self.key, "did_exit");
        self.behavior.did_exit(machine);

        // Ancestors exist only if the chain was derived (at entry); a node
        // that never entered has none to exit.
        let chain = self.superchain.borrow().clone();
        if let Some(chain) = chain {
            for ancestor in chain.iter().rev() {
                machine.verifier().note_exit(verifying, ancestor.key);
                ancestor.unsubscribe();
                trace!(state = %ancestor.key, "did_exit");
                ancestor.behavior.did_exit(machine);
            }
        }
    }

    /// The cached ancestor chain, root first, derived on first request.
    ///
    /// Each ancestor is instantiated through its registry factory and
    /// subscribed to the shared channel in walk order (immediate parent
    /// first). Instantiation failure is a wiring defect and aborts.
    fn superchain(&self) -> Rc<Vec<Rc<Node>>> {
        if let Some(chain) = self.superchain.borrow().as_ref() {
            return Rc::clone(chain);
        }

        let mut chain: Vec<Rc<Node>> = Vec::new();
        let mut next = self.registry.require(self.key).parent();
        while let Some(key) = next {
            let behavior = self.registry.instantiate(key);
            let ancestor = Node::new(
                key,
                behavior,
                self.channel.clone(),
                Rc::clone(&self.registry),
            );
            ancestor.create();
            chain.insert(0, ancestor);
            next = self.registry.require(key).parent();
        }

        let chain = Rc::new(chain);
        *self.superchain.borrow_mut() = Some(Rc::clone(&chain));
        chain
    }
}

/// A cheap handle identifying one live state instance.
///
/// Handed to [`State::on_event`] so handling logic can name itself when
/// requesting a transition, and returned in
/// [`ActiveStates`](crate::machine::ActiveStates) snapshots.
#[derive(Clone)]
pub struct StateHandle {
    pub(crate) node: Rc<Node>,
}

impl StateHandle {
    /// The concrete type key of this instance.
    pub fn key(&self) -> StateKey {
        self.node.key()
    }

    /// Short name of the concrete type.
    pub fn name(&self) -> &'static str {
        self.node.key().name()
    }

    /// Polymorphic classification: true if `T` is this instance's concrete
    /// type or any ancestor type in its declared chain.
    pub fn is<T: State>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.node.lineage().iter().any(|key| key.id() == id)
    }

    /// Borrow the state behavior, downcastable via
    /// [`dyn State::downcast_ref`](crate::State).
    pub fn state(&self) -> &dyn State {
        self.node.behavior()
    }

    pub(crate) fn node(&self) -> &Rc<Node> {
        &self.node
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
