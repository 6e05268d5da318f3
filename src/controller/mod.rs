//! Command loop controller
//!
//! Wires the speech input session, the speech output session and the
//! command registry together:
//! - final transcripts are dispatched, interim transcripts forwarded
//! - replies requested by actions go through a [`ControllerHandle`]
//! - status is published on a watch channel, events on a broadcast channel

mod engine;
mod handle;

pub use engine::{ControllerStatus, VoiceController};
pub use handle::{ControlReceiver, ControlRequest, ControllerHandle};
