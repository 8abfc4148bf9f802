//! Builder for the state registry.

use std::collections::{HashMap, HashSet};

use crate::core::state::{State, StateKey};
use crate::registry::error::BuildError;
use crate::registry::{StateDescriptor, StateFactory, StateRegistry};

/// Fluent builder declaring the state hierarchy: one entry per concrete state
/// type, each with a factory and zero or one declared parent type.
///
/// `build` validates the whole declaration (duplicates, unknown parents, and
/// cyclic parent chains are rejected), so a registry that exists is one whose
/// chains are finite and acyclic.
pub struct RegistryBuilder {
    entries: Vec<Entry>,
}

struct Entry {
    key: StateKey,
    parent: Option<StateKey>,
    factory: StateFactory,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// Register a root state type (no parent) with its factory.
    pub fn state<T: State>(mut self, factory: impl Fn() -> T + 'static) -> Self {
        self.entries.push(Entry {
            key: StateKey::of::<T>(),
            parent: None,
            factory: Box::new(move || Box::new(factory())),
        });
        self
    }

    /// Register a state type whose declared parent is `P`.
    ///
    /// Entering a `T` enters `P` (and `P`'s own ancestors) first; exiting a
    /// `T` exits them after.
    pub fn substate<T: State, P: State>(mut self, factory: impl Fn() -> T + 'static) -> Self {
        self.entries.push(Entry {
            key: StateKey::of::<T>(),
            parent: Some(StateKey::of::<P>()),
            factory: Box::new(move || Box::new(factory())),
        });
        self
    }

    /// Validate the declaration and produce the immutable registry.
    pub fn build(self) -> Result<StateRegistry, BuildError> {
        let mut descriptors = HashMap::with_capacity(self.entries.len());
        for entry in self.entries {
            let previous = descriptors.insert(
                entry.key.id(),
                StateDescriptor {
                    key: entry.key,
                    parent: entry.parent,
                    factory: entry.factory,
                },
            );
            if previous.is_some() {
                return Err(BuildError::DuplicateState {
                    name: entry.key.name(),
                });
            }
        }

        for descriptor in descriptors.values() {
            if let Some(parent) = descriptor.parent {
                if !descriptors.contains_key(&parent.id()) {
                    return Err(BuildError::UnknownParent {
                        state: descriptor.key.name(),
                        parent: parent.name(),
                    });
                }
            }
        }

        for descriptor in descriptors.values() {
            let mut visited = HashSet::new();
            visited.insert(descriptor.key.id());
            let mut next = descriptor.parent;
            while let Some(parent) = next {
                if !visited.insert(parent.id()) {
                    return Err(BuildError::CyclicHierarchy {
                        state: descriptor.key.name(),
                    });
                }
                next = descriptors[&parent.id()].parent;
            }
        }

        Ok(StateRegistry { descriptors })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;

    struct Root;
    impl State for Root {
        fn did_enter(&self, _machine: &Machine) {}
        fn did_exit(&self, _machine: &Machine) {}
    }

    struct Branch;
    impl State for Branch {
        fn did_enter(&self, _machine: &Machine) {}
        fn did_exit(&self, _machine: &Machine) {}
    }

    struct Leaf;
    impl State for Leaf {
        fn did_enter(&self, _machine: &Machine) {}
        fn did_exit(&self, _machine: &Machine) {}
    }

    #[test]
    fn builds_a_three_level_chain() {
        let registry = RegistryBuilder::new()
            .state(|| Root)
            .substate::<Branch, Root>(|| Branch)
            .substate::<Leaf, Branch>(|| Leaf)
            .build()
            .unwrap();

        let lineage = registry.lineage(StateKey::of::<Leaf>());
        let names: Vec<&str> = lineage.iter().map(|key| key.name()).collect();
        assert_eq!(names, ["Leaf", "Branch", "Root"]);
    }

    #[test]
    fn rejects_duplicate_registration() {
        let result = RegistryBuilder::new().state(|| Root).state(|| Root).build();

        assert!(matches!(
            result,
            Err(BuildError::DuplicateState { name: "Root" })
        ));
    }

    #[test]
    fn rejects_unknown_parent() {
        let result = RegistryBuilder::new()
            .substate::<Leaf, Branch>(|| Leaf)
            .build();

        assert!(matches!(
            result,
            Err(BuildError::UnknownParent {
                state: "Leaf",
                parent: "Branch",
            })
        ));
    }

    #[test]
    fn rejects_cyclic_parent_chain() {
        let result = RegistryBuilder::new()
            .substate::<Root, Branch>(|| Root)
            .substate::<Branch, Root>(|| Branch)
            .build();

        assert!(matches!(result, Err(BuildError::CyclicHierarchy { .. })));
    }

    #[test]
    fn empty_registry_is_valid() {
        let registry = RegistryBuilder::new().build().unwrap();
        assert!(registry.descriptor(StateKey::of::<Root>()).is_none());
    }
}
