//! Media Player
//!
//! A three-mode player with a shared `Active` superstate: `Playing` and
//! `Paused` are both substates of `Active`, so switching between them
//! re-enters `Active`, while `Stopped` sits outside it.
//!
//! Key concepts:
//! - Declared parent chains and root -> leaf entry propagation
//! - Event routing to exactly one active state
//! - Transitions requested from inside handling logic
//!
//! Run with: cargo run --example media_player

use demeanor::{Envelope, Event, InitialState, Machine, State, StateHandle, StateRegistry};

struct Play;
impl Event for Play {}

struct Pause;
impl Event for Pause {}

struct Stop;
impl Event for Stop {}

struct Active;

impl State for Active {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [active] amp warmed up");
    }

    fn did_exit(&self, _machine: &Machine) {
        println!("  [active] amp powered down");
    }
}

struct Stopped;

impl State for Stopped {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [stopped] idle");
    }

    fn did_exit(&self, _machine: &Machine) {}

    fn observes(&self, event: &Envelope) -> bool {
        event.is::<Play>()
    }

    fn on_event(&self, machine: &Machine, this: &StateHandle, _event: &Envelope) {
        machine.external_transition::<Playing>(this);
    }
}

struct Playing;

impl State for Playing {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [playing] audio rolling");
    }

    fn did_exit(&self, _machine: &Machine) {
        println!("  [playing] audio stopped");
    }

    fn observes(&self, event: &Envelope) -> bool {
        event.is::<Pause>() || event.is::<Stop>()
    }

    fn on_event(&self, machine: &Machine, this: &StateHandle, event: &Envelope) {
        if event.is::<Pause>() {
            machine.external_transition::<Paused>(this);
        } else {
            machine.external_transition::<Stopped>(this);
        }
    }
}

struct Paused;

impl State for Paused {
    fn did_enter(&self, _machine: &Machine) {
        println!("  [paused] holding position");
    }

    fn did_exit(&self, _machine: &Machine) {}

    fn observes(&self, event: &Envelope) -> bool {
        event.is::<Play>() || event.is::<Stop>()
    }

    fn on_event(&self, machine: &Machine, this: &StateHandle, event: &Envelope) {
        if event.is::<Play>() {
            machine.external_transition::<Playing>(this);
        } else {
            machine.external_transition::<Stopped>(this);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = StateRegistry::builder()
        .state(|| Stopped)
        .state(|| Active)
        .substate::<Playing, Active>(|| Playing)
        .substate::<Paused, Active>(|| Paused)
        .build()
        .expect("hierarchy declaration is valid");

    let machine = Machine::new(registry, &InitialState::new().with::<Stopped>());
    println!("start: {}", machine.active_states());

    println!("\nposting Play");
    machine.post(Play);
    println!("now:   {}", machine.active_states());
    println!("is_active::<Active> = {}", machine.is_active::<Active>());

    println!("\nposting Pause");
    machine.post(Pause);
    println!("now:   {}", machine.active_states());

    println!("\nposting Stop");
    machine.post(Stop);
    println!("now:   {}", machine.active_states());
    println!("is_active::<Active> = {}", machine.is_active::<Active>());
}
