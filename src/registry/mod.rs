//! The state hierarchy registry.
//!
//! The registry is the explicit, immutable-after-init replacement for runtime
//! type introspection: one [`StateDescriptor`] per concrete state type, each
//! carrying the type's declared parent (if any) and a factory used to
//! construct ancestor pseudo-instances. It is built once at wiring time by
//! [`RegistryBuilder`] and shared by reference afterwards; there is no lazy
//! population and nothing to race on.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::core::state::{State, StateKey};

pub mod builder;
pub mod error;

pub use builder::RegistryBuilder;
pub use error::BuildError;

pub(crate) type StateFactory = Box<dyn Fn() -> Box<dyn State>>;

/// One registered state type: its key, declared parent, and factory.
pub struct StateDescriptor {
    key: StateKey,
    parent: Option<StateKey>,
    factory: StateFactory,
}

impl StateDescriptor {
    pub fn key(&self) -> StateKey {
        self.key
    }

    pub fn parent(&self) -> Option<StateKey> {
        self.parent
    }
}

/// Immutable lookup table from state type to [`StateDescriptor`].
pub struct StateRegistry {
    descriptors: HashMap<TypeId, StateDescriptor>,
}

impl StateRegistry {
    /// Start declaring a hierarchy.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up the descriptor for a state type, if registered.
    pub fn descriptor(&self, key: StateKey) -> Option<&StateDescriptor> {
        self.descriptors.get(&key.id())
    }

    /// Whether the state type `T` is registered.
    pub fn contains<T: State>(&self) -> bool {
        self.descriptor(StateKey::of::<T>()).is_some()
    }

    // Requesting an unregistered type is a wiring defect, not a runtime
    // condition; it aborts.
    pub(crate) fn require(&self, key: StateKey) -> &StateDescriptor {
        match self.descriptor(key) {
            Some(descriptor) => descriptor,
            None => panic!("state type `{key}` is not registered"),
        }
    }

    /// Full key chain for a state type, leaf first, ending at the root.
    ///
    /// Chains are finite and acyclic by construction (the builder rejects
    /// anything else).
    pub(crate) fn lineage(&self, key: StateKey) -> Vec<StateKey> {
        let mut chain = vec![key];
        let mut next = self.require(key).parent;
        while let Some(parent) = next {
            chain.push(parent);
            next = self.require(parent).parent;
        }
        chain
    }

    pub(crate) fn instantiate(&self, key: StateKey) -> Box<dyn State> {
        let descriptor = self.require(key);
        let instance = (descriptor.factory)();
        if (&*instance as &dyn Any).type_id() != key.id() {
            panic!("factory for state type `{key}` produced an instance of a different type");
        }
        instance
    }
}
