//! Speech output session and voice selection

mod session;
mod voice;

pub use session::{OutputTransition, SpeakingState, SpeechOutputSession};
pub use voice::select_voice;
