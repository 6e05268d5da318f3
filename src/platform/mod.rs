//! Platform speech capabilities
//!
//! The engine never touches a global speech object. Hosts inject a
//! [`Recognizer`] and a [`Synthesizer`] and forward their callbacks as
//! [`RecognitionEvent`] / [`SynthesisEvent`] values on one channel per
//! capability, in delivery order.

mod console;

pub use console::{ConsoleRecognizer, ConsoleSynthesizer};

use serde::{Deserialize, Serialize};

use crate::config::RecognitionConfig;
use crate::error::PlatformError;

/// Identifies one submitted utterance
pub type UtteranceId = u64;

/// A discrete-session speech recognizer
pub trait Recognizer: Send {
    /// Apply continuous/interim/language settings before the next start
    fn configure(&mut self, settings: &RecognitionConfig);

    /// Begin a platform session; `Started` follows asynchronously
    fn start(&mut self) -> Result<(), PlatformError>;

    /// End the session gracefully, flushing pending results
    fn stop(&mut self);

    /// End the session immediately, discarding pending results
    fn abort(&mut self);
}

/// A speech synthesizer with a voice inventory
pub trait Synthesizer: Send {
    fn speak(&mut self, request: UtteranceRequest);
    fn cancel(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);

    /// Current voice inventory; may be empty until `VoicesChanged` fires
    fn voices(&self) -> Vec<Voice>;
}

/// One entry of a recognition result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub is_final: bool,
    /// Alternatives, best first
    pub alternatives: Vec<String>,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            is_final,
            alternatives: vec![text.into()],
        }
    }

    /// Best transcript alternative
    pub fn transcript(&self) -> &str {
        self.alternatives.first().map(String::as_str).unwrap_or("")
    }
}

/// Callbacks from the recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    Ended,
    /// Results from `result_index` onward are new in this delivery
    Result {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    Error(String),
}

/// An installed synthesis voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// A fully specified utterance handed to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceRequest {
    pub id: UtteranceId,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// `None` leaves the platform default voice
    pub voice: Option<Voice>,
}

/// Callbacks from the synthesizer
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Error { id: UtteranceId, code: String },
    VoicesChanged,
}
