//! Speech input session
//!
//! Presents one continuous logical listening session over a recognizer that
//! only offers discrete start/stop sessions.

mod session;

pub use session::{InputUpdate, ListeningState, SpeechInputSession, TranscriptEvent};
