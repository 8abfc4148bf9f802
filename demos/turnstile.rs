//! Turnstile
//!
//! The classic coin-operated turnstile, with two twists that exercise the
//! engine: a self transition (pushing a locked turnstile re-arms it) and a
//! transition guard (an unlocked turnstile held open for maintenance refuses
//! to relock).
//!
//! Run with: cargo run --example turnstile

use std::cell::Cell;

use demeanor::{Envelope, Event, InitialState, Machine, State, StateHandle, StateRegistry};

struct Coin;
impl Event for Coin {}

struct Push;
impl Event for Push {}

struct HoldOpen;
impl Event for HoldOpen {}

struct Locked;

impl State for Locked {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [locked] arm engaged");
    }

    fn did_exit(&self, _machine: &Machine) {}

    fn observes(&self, event: &Envelope) -> bool {
        event.is::<Coin>() || event.is::<Push>()
    }

    fn on_event(&self, machine: &Machine, this: &StateHandle, event: &Envelope) {
        if event.is::<Coin>() {
            machine.external_transition::<Unlocked>(this);
        } else {
            println!("  [locked] push refused, re-arming");
            machine.self_transition(this);
        }
    }
}

struct Unlocked {
    held_open: Cell<bool>,
}

impl State for Unlocked {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [unlocked] arm free");
    }

    fn did_exit(&self, _machine: &Machine) {}

    fn observes(&self, event: &Envelope) -> bool {
        event.is::<Push>() || event.is::<HoldOpen>()
    }

    fn is_not_guarded(&self, candidate: &dyn State) -> bool {
        // Held open for maintenance: relocking is blocked outright.
        !(candidate.is::<Locked>() && self.held_open.get())
    }

    fn on_event(&self, machine: &Machine, this: &StateHandle, event: &Envelope) {
        if event.is::<HoldOpen>() {
            println!("  [unlocked] held open for maintenance");
            self.held_open.set(true);
        } else {
            machine.external_transition::<Locked>(this);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = StateRegistry::builder()
        .state(|| Locked)
        .state(|| Unlocked {
            held_open: Cell::new(false),
        })
        .build()
        .expect("hierarchy declaration is valid");

    let machine = Machine::builder(registry)
        .verify_events()
        .start(&InitialState::new().with::<Locked>());
    println!("start: {}", machine.active_states());

    println!("\npushing while locked");
    machine.post(Push);
    println!("now:   {}", machine.active_states());

    println!("\ninserting a coin");
    machine.post(Coin);
    println!("now:   {}", machine.active_states());

    println!("\npushing through");
    machine.post(Push);
    println!("now:   {}", machine.active_states());

    println!("\ncoin, then hold open for maintenance");
    machine.post(Coin);
    machine.post(HoldOpen);

    println!("\npushing while held open (guard blocks the relock)");
    machine.post(Push);
    println!("now:   {}", machine.active_states());
}
