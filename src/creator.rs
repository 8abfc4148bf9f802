//! The state creation contract.

use std::rc::Rc;

use crate::core::state::{State, StateKey};
use crate::registry::StateRegistry;

/// Factory contract for leaf state instances, the hook for host-side
/// dependency injection.
///
/// Implementations must return a fully constructed, not-yet-subscribed
/// instance of exactly the requested type; the machine installs the channel
/// subscription separately. Failure to produce the requested type is a fatal
/// configuration error, not a runtime condition: implementations signal it
/// by panicking, and the machine aborts on a type mismatch regardless.
pub trait StateCreator {
    fn create_state(&self, state: StateKey) -> Box<dyn State>;
}

/// Default creator: constructs leaves through the registry's own factories.
///
/// Hosts that need to inject dependencies either register capturing closures
/// as factories or supply their own [`StateCreator`] via
/// [`Machine::builder`](crate::machine::Machine::builder).
pub struct RegistryCreator {
    registry: Rc<StateRegistry>,
}

impl RegistryCreator {
    pub fn new(registry: Rc<StateRegistry>) -> Self {
        RegistryCreator { registry }
    }
}

impl StateCreator for RegistryCreator {
    fn create_state(&self, state: StateKey) -> Box<dyn State> {
        self.registry.instantiate(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plain_state;

    plain_state! {
        struct Dormant;
    }

    #[test]
    fn registry_creator_builds_registered_types() {
        let registry = Rc::new(
            StateRegistry::builder()
                .state(|| Dormant)
                .build()
                .unwrap(),
        );
        let creator = RegistryCreator::new(registry);
        let instance = creator.create_state(StateKey::of::<Dormant>());
        assert!(instance.is::<Dormant>());
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn registry_creator_aborts_on_unknown_type() {
        plain_state! {
            struct Unregistered;
        }
        let registry = Rc::new(StateRegistry::builder().build().unwrap());
        RegistryCreator::new(registry).create_state(StateKey::of::<Unregistered>());
    }
}
