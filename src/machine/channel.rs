//! The shared event channel.
//!
//! A plain subscriber list stands in for the reactive subject the design is
//! modeled on: publication walks the subscriptions in subscription order,
//! synchronously, on the calling thread. Each subscription is one state
//! instance's filtered view of the channel; the filter itself (claimed-flag
//! check plus interest predicate) lives on the node.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::event::Envelope;
use crate::machine::node::Node;
use crate::machine::Machine;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct SubscriptionId(u64);

#[derive(Clone)]
pub(crate) struct EventChannel {
    inner: Rc<ChannelInner>,
}

struct ChannelInner {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

struct Subscription {
    id: SubscriptionId,
    node: Weak<Node>,
}

impl EventChannel {
    pub(crate) fn new() -> Self {
        EventChannel {
            inner: Rc::new(ChannelInner {
                subscriptions: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub(crate) fn subscribe(&self, node: &Rc<Node>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscriptions.borrow_mut().push(Subscription {
            id,
            node: Rc::downgrade(node),
        });
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .subscriptions
            .borrow_mut()
            .retain(|subscription| subscription.id != id);
    }

    /// Deliver an envelope to every current subscription, in subscription
    /// order. At most one filter claims it; the claimed flag, not the walk,
    /// enforces that.
    pub(crate) fn publish(&self, machine: &Machine, envelope: &Envelope) {
        // Handling logic may subscribe, unsubscribe, or post again while the
        // walk is in progress, so it runs over a snapshot.
        let snapshot: Vec<Weak<Node>> = self
            .inner
            .subscriptions
            .borrow()
            .iter()
            .map(|subscription| subscription.node.clone())
            .collect();
        for weak in snapshot {
            if let Some(node) = weak.upgrade() {
                node.deliver(machine, envelope);
            }
        }
    }
}
