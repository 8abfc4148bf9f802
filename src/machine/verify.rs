//! Once-per-transition verification bookkeeping.
//!
//! In verification mode, each state type's entry hook may run at most once
//! within a single transition, and likewise for exit. A repeat means the
//! hierarchy declaration is inconsistent (most commonly two states entered
//! in the same transition both declaring an overlapping ancestor) and aborts
//! with the offending type's name.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashSet;

use crate::core::state::StateKey;

pub(crate) struct TransitionVerifier {
    entered: RefCell<HashSet<TypeId>>,
    exited: RefCell<HashSet<TypeId>>,
}

impl TransitionVerifier {
    pub(crate) fn new() -> Self {
        TransitionVerifier {
            entered: RefCell::new(HashSet::new()),
            exited: RefCell::new(HashSet::new()),
        }
    }

    /// Open a fresh transition scope.
    pub(crate) fn begin(&self) {
        self.entered.borrow_mut().clear();
        self.exited.borrow_mut().clear();
    }

    pub(crate) fn note_entry(&self, verifying: bool, key: StateKey) {
        if verifying && !self.entered.borrow_mut().insert(key.id()) {
            panic!(
                "did_enter invoked more than once for state type `{key}` within a single transition"
            );
        }
    }

    pub(crate) fn note_exit(&self, verifying: bool, key: StateKey) {
        if verifying && !self.exited.borrow_mut().insert(key.id()) {
            panic!(
                "did_exit invoked more than once for state type `{key}` within a single transition"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::State;
    use crate::machine::Machine;

    struct Repeated;
    impl State for Repeated {
        fn did_enter(&self, _machine: &Machine) {}
        fn did_exit(&self, _machine: &Machine) {}
    }

    #[test]
    #[should_panic(expected = "did_enter invoked more than once for state type `Repeated`")]
    fn repeated_entry_is_fatal_when_verifying() {
        let verifier = TransitionVerifier::new();
        verifier.note_entry(true, StateKey::of::<Repeated>());
        verifier.note_entry(true, StateKey::of::<Repeated>());
    }

    #[test]
    fn repeated_entry_is_ignored_when_not_verifying() {
        let verifier = TransitionVerifier::new();
        verifier.note_entry(false, StateKey::of::<Repeated>());
        verifier.note_entry(false, StateKey::of::<Repeated>());
    }

    #[test]
    fn begin_opens_a_fresh_scope() {
        let verifier = TransitionVerifier::new();
        verifier.note_entry(true, StateKey::of::<Repeated>());
        verifier.note_exit(true, StateKey::of::<Repeated>());
        verifier.begin();
        verifier.note_entry(true, StateKey::of::<Repeated>());
        verifier.note_exit(true, StateKey::of::<Repeated>());
    }

    #[test]
    fn entry_and_exit_are_tracked_separately() {
        let verifier = TransitionVerifier::new();
        verifier.note_entry(true, StateKey::of::<Repeated>());
        verifier.note_exit(true, StateKey::of::<Repeated>());
    }
}
