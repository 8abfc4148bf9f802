//! Core contracts of the runtime.
//!
//! This module holds the traits host code implements ([`State`] for modes of
//! behavior, [`Event`] for the inputs that drive them) and the [`Envelope`]
//! the engine wraps each posted event in. Hierarchy declaration lives in
//! [`crate::registry`]; orchestration lives in [`crate::machine`].

pub mod event;
mod macros;
pub mod state;

pub use event::{Envelope, Event};
pub use state::{State, StateKey};
