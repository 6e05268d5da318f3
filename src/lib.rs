//! mailvoice: voice command dispatch engine for a hands-free email client
//!
//! Spoken input is transcribed by an injected platform recognizer,
//! normalized, matched against an ordered command registry and dispatched.
//! Replies are spoken through an injected synthesizer.
//!
//! The engine is single-task and event driven: platform callbacks arrive on
//! per-capability channels and each one is handled to completion before the
//! next.

pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod normalize;
pub mod platform;
pub mod recognition;
pub mod synthesis;

#[cfg(test)]
mod testing;

pub use commands::{CommandMatch, CommandRegistry, CommandSpec, DispatchOutcome};
pub use config::Config;
pub use controller::{ControllerHandle, ControllerStatus, VoiceController};
pub use error::EngineError;
pub use events::EngineEvent;
pub use normalize::{normalize_spoken_email, normalize_spoken_numbers};
