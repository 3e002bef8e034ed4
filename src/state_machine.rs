//! Core conversation session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod quota;
pub mod state;
pub mod transcript;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{Notice, SessionState, SessionView};
pub use transition::{transition, TransitionError};
