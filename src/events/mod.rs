//! Events broadcast by the voice controller
//!
//! Subscribers (live transcript previews, status indicators, logs) receive
//! every transition in the order the controller handled it.

use serde::{Deserialize, Serialize};

use crate::commands::CommandMatch;
use crate::error::EngineError;

/// Events emitted by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Recognizer session is live
    ListeningStarted,

    /// Recognizer is no longer listening
    ListeningStopped,

    /// Provisional transcript, forwarded unmodified
    InterimTranscript { text: String },

    /// Stable transcript about to be dispatched
    FinalTranscript { text: String },

    /// A command matched and its action ran
    CommandDispatched {
        transcript: String,
        #[serde(flatten)]
        command: CommandMatch,
    },

    /// No command matched the normalized transcript
    Unrecognized { transcript: String },

    /// Active utterance began playing
    SpeakingStarted,

    /// Active utterance played to the end
    SpeakingFinished,

    /// Active utterance was interrupted
    SpeakingCancelled,

    /// A failure was recorded
    Error { kind: String, message: String },
}

impl From<&EngineError> for EngineEvent {
    fn from(error: &EngineError) -> Self {
        EngineEvent::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::ListeningStarted => write!(f, "LISTENING_STARTED"),
            EngineEvent::ListeningStopped => write!(f, "LISTENING_STOPPED"),
            EngineEvent::InterimTranscript { text } => write!(f, "INTERIM ({})", text),
            EngineEvent::FinalTranscript { text } => write!(f, "FINAL ({})", text),
            EngineEvent::CommandDispatched { command, .. } => {
                write!(f, "COMMAND ({})", command.description)
            }
            EngineEvent::Unrecognized { transcript } => write!(f, "UNRECOGNIZED ({})", transcript),
            EngineEvent::SpeakingStarted => write!(f, "SPEAKING_STARTED"),
            EngineEvent::SpeakingFinished => write!(f, "SPEAKING_FINISHED"),
            EngineEvent::SpeakingCancelled => write!(f, "SPEAKING_CANCELLED"),
            EngineEvent::Error { kind, message } => write!(f, "ERROR {} ({})", kind, message),
        }
    }
}
