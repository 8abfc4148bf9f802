//! Demeanor: a hierarchical state machine runtime driven by a shared event
//! channel.
//!
//! A machine holds a set of active states drawn from a statically declared
//! type hierarchy. Entering a state enters its ancestors first (root to
//! leaf); exiting a state exits it before its ancestors (leaf to root).
//! Domain events posted on the machine travel one shared channel, and the
//! first active state whose interest predicate matches claims the event; no
//! other state's handling logic observes it.
//!
//! # Core Concepts
//!
//! - **State**: a mode of behavior, one concrete type per mode, implementing
//!   the [`State`] capability trait
//! - **Registry**: the immutable table declaring each state type's parent
//!   and factory, built once by [`StateRegistry::builder`]
//! - **Machine**: owns the active-state set and the channel; performs
//!   guarded external, self, and initial transitions
//! - **Verification mode**: opt-in invariant checking that catches
//!   inconsistent hierarchy declarations during development
//!
//! # Example
//!
//! ```rust
//! use demeanor::{Envelope, Event, InitialState, Machine, State, StateHandle, StateRegistry};
//!
//! struct PowerOn;
//! impl Event for PowerOn {}
//!
//! struct Idle;
//!
//! impl State for Idle {
//!     fn did_enter(&self, _machine: &Machine) {}
//!     fn did_exit(&self, _machine: &Machine) {}
//!
//!     fn observes(&self, event: &Envelope) -> bool {
//!         event.is::<PowerOn>()
//!     }
//!
//!     fn on_event(&self, machine: &Machine, this: &StateHandle, _event: &Envelope) {
//!         machine.external_transition::<Running>(this);
//!     }
//! }
//!
//! struct Running;
//!
//! impl State for Running {
//!     fn did_enter(&self, _machine: &Machine) {}
//!     fn did_exit(&self, _machine: &Machine) {}
//! }
//!
//! let registry = StateRegistry::builder()
//!     .state(|| Idle)
//!     .state(|| Running)
//!     .build()
//!     .unwrap();
//!
//! let machine = Machine::new(registry, &InitialState::new().with::<Idle>());
//! machine.post(PowerOn);
//!
//! assert!(machine.is_active::<Running>());
//! assert!(!machine.is_active::<Idle>());
//! assert_eq!(machine.active_states().to_string(), "{ Running }");
//! ```
//!
//! Dispatch is single-threaded and fully synchronous: `post` runs the whole
//! chain (filter match, handling logic, any resulting transition) on the
//! calling thread before returning. Handling logic may post further events
//! reentrantly; initiating a second transition before the first finishes is
//! the caller's responsibility to avoid.

pub mod core;
pub mod creator;
pub mod initial;
pub mod machine;
pub mod registry;

pub use crate::core::{Envelope, Event, State, StateKey};
pub use crate::creator::{RegistryCreator, StateCreator};
pub use crate::initial::InitialState;
pub use crate::machine::{ActiveStates, Machine, MachineBuilder, StateHandle};
pub use crate::registry::{BuildError, RegistryBuilder, StateDescriptor, StateRegistry};
