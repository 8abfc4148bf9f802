//! Property-based tests for the lifecycle engine.
//!
//! These drive a small fixture machine through generated operation sequences
//! and check the invariants that must hold regardless of interleaving:
//! exactly-once claiming, balanced entry/exit pairing, and guard no-ops.

use std::cell::RefCell;
use std::rc::Rc;

use demeanor::{
    Envelope, Event, InitialState, Machine, State, StateHandle, StateRegistry,
};
use proptest::prelude::*;

#[derive(Clone, Default)]
struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    fn log(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn count(&self, needle: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|entry| entry.as_str() == needle)
            .count()
    }

    fn count_prefixed(&self, prefix: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

struct Advance;
impl Event for Advance {}

struct Noise;
impl Event for Noise {}

/// Three states cycling Red -> Green -> Blue -> Red on `Advance`.
macro_rules! cycling_state {
    ($name:ident -> $next:ident) => {
        struct $name {
            journal: Journal,
        }

        impl State for $name {
            fn did_enter(&self, _machine: &Machine) {
                self.journal.log(concat!("enter ", stringify!($name)));
            }

            fn did_exit(&self, _machine: &Machine) {
                self.journal.log(concat!("exit ", stringify!($name)));
            }

            fn observes(&self, event: &Envelope) -> bool {
                event.is::<Advance>()
            }

            fn on_event(&self, machine: &Machine, this: &StateHandle, _event: &Envelope) {
                self.journal.log(concat!("claim ", stringify!($name)));
                machine.external_transition::<$next>(this);
            }
        }
    };
}

cycling_state!(Red -> Green);
cycling_state!(Green -> Blue);
cycling_state!(Blue -> Red);

fn cycle_machine(journal: &Journal) -> Machine {
    let registry = StateRegistry::builder()
        .state({
            let j = journal.clone();
            move || Red { journal: j.clone() }
        })
        .state({
            let j = journal.clone();
            move || Green { journal: j.clone() }
        })
        .state({
            let j = journal.clone();
            move || Blue { journal: j.clone() }
        })
        .build()
        .unwrap();
    Machine::new(registry, &InitialState::new().with::<Red>())
}

fn handle_of<T: State>(machine: &Machine) -> StateHandle {
    machine
        .active_states()
        .iter()
        .find(|handle| handle.is::<T>())
        .cloned()
        .expect("state not active")
}

proptest! {
    #[test]
    fn exactly_one_leaf_stays_active(ops in prop::collection::vec(any::<bool>(), 0..32)) {
        let journal = Journal::default();
        let machine = cycle_machine(&journal);

        for advance in ops {
            if advance {
                machine.post(Advance);
            } else {
                machine.post(Noise);
            }
            prop_assert_eq!(machine.active_states().len(), 1);
        }
    }

    #[test]
    fn every_advance_is_claimed_exactly_once(ops in prop::collection::vec(any::<bool>(), 0..32)) {
        let journal = Journal::default();
        let machine = cycle_machine(&journal);

        let advances = ops.iter().filter(|advance| **advance).count();
        for advance in ops {
            if advance {
                machine.post(Advance);
            } else {
                machine.post(Noise);
            }
        }

        prop_assert_eq!(journal.count_prefixed("claim "), advances);
    }

    #[test]
    fn entries_and_exits_stay_balanced(advances in 0usize..24) {
        let journal = Journal::default();
        let machine = cycle_machine(&journal);

        for _ in 0..advances {
            machine.post(Advance);
        }

        let mut live = 0;
        for color in ["Red", "Green", "Blue"] {
            let entered = journal.count(&format!("enter {color}"));
            let exited = journal.count(&format!("exit {color}"));
            prop_assert!(entered == exited || entered == exited + 1);
            live += entered - exited;
        }
        prop_assert_eq!(live, 1);
    }

    #[test]
    fn the_cycle_lands_where_the_count_says(advances in 0usize..24) {
        let journal = Journal::default();
        let machine = cycle_machine(&journal);

        for _ in 0..advances {
            machine.post(Advance);
        }

        match advances % 3 {
            0 => prop_assert!(machine.is_active::<Red>()),
            1 => prop_assert!(machine.is_active::<Green>()),
            _ => prop_assert!(machine.is_active::<Blue>()),
        }
    }

    #[test]
    fn self_transitions_pair_exit_with_reentry(count in 0usize..16) {
        let journal = Journal::default();
        let machine = cycle_machine(&journal);

        for _ in 0..count {
            let current = handle_of::<Red>(&machine);
            machine.self_transition(&current);
        }

        prop_assert_eq!(journal.count("enter Red"), count + 1);
        prop_assert_eq!(journal.count("exit Red"), count);
        prop_assert!(machine.is_active::<Red>());
    }
}

mod guarded {
    use super::*;

    struct Home {
        journal: Journal,
    }

    impl State for Home {
        fn did_enter(&self, _machine: &Machine) {
            self.journal.log("enter Home");
        }

        fn did_exit(&self, _machine: &Machine) {
            self.journal.log("exit Home");
        }

        fn is_not_guarded(&self, candidate: &dyn State) -> bool {
            !candidate.is::<Forbidden>()
        }
    }

    struct Forbidden {
        journal: Journal,
    }

    impl State for Forbidden {
        fn did_enter(&self, _machine: &Machine) {
            self.journal.log("enter Forbidden");
        }

        fn did_exit(&self, _machine: &Machine) {
            self.journal.log("exit Forbidden");
        }
    }

    fn guarded_machine(journal: &Journal) -> Machine {
        let registry = StateRegistry::builder()
            .state({
                let j = journal.clone();
                move || Home { journal: j.clone() }
            })
            .state({
                let j = journal.clone();
                move || Forbidden { journal: j.clone() }
            })
            .build()
            .unwrap();
        Machine::new(registry, &InitialState::new().with::<Home>())
    }

    proptest! {
        #[test]
        fn blocked_transitions_never_accumulate_effects(attempts in 0usize..20) {
            let journal = Journal::default();
            let machine = guarded_machine(&journal);
            let home = handle_of::<Home>(&machine);

            for _ in 0..attempts {
                machine.external_transition::<Forbidden>(&home);
            }

            prop_assert_eq!(journal.entries(), vec!["enter Home".to_string()]);
            prop_assert!(machine.is_active::<Home>());
            prop_assert_eq!(machine.active_states().to_string(), "{ Home }");
        }
    }
}
