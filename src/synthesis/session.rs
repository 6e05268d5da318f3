//! Speech output session
//!
//! At most one utterance is active. `speak()` cancels whatever is playing
//! before submitting, and callbacks for superseded utterances are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::voice::select_voice;
use crate::config::SynthesisConfig;
use crate::error::EngineError;
use crate::platform::{SynthesisEvent, Synthesizer, UtteranceId, UtteranceRequest, Voice};

/// Output session status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

impl fmt::Display for SpeakingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakingState::Idle => write!(f, "Idle"),
            SpeakingState::Speaking => write!(f, "Speaking"),
            SpeakingState::Paused => write!(f, "Paused"),
        }
    }
}

/// Outcome of a synthesis callback for the active utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTransition {
    Started(UtteranceId),
    Finished(UtteranceId),
    Failed(UtteranceId, EngineError),
    VoicesRefreshed(usize),
}

/// Speech output session over an injected synthesizer
pub struct SpeechOutputSession {
    synthesizer: Option<Box<dyn Synthesizer>>,
    config: SynthesisConfig,
    voices: Vec<Voice>,
    state: SpeakingState,
    /// Utterance submitted last and not yet finished
    active: Option<UtteranceId>,
    next_id: UtteranceId,
    error: Option<EngineError>,
}

impl SpeechOutputSession {
    /// Create a session; `None` means the platform lacks synthesis
    pub fn new(synthesizer: Option<Box<dyn Synthesizer>>, config: SynthesisConfig) -> Self {
        Self {
            synthesizer,
            config,
            voices: Vec::new(),
            state: SpeakingState::Idle,
            active: None,
            next_id: 1,
            error: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn state(&self) -> SpeakingState {
        self.state
    }

    /// An utterance is playing or paused
    pub fn is_speaking(&self) -> bool {
        self.state != SpeakingState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state == SpeakingState::Paused
    }

    /// An utterance has been submitted and has not finished yet
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<UtteranceId> {
        self.active
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Speak `text`, interrupting any active utterance.
    ///
    /// Returns the new utterance id, or `None` when unsupported or `text`
    /// is blank.
    pub fn speak(&mut self, text: &str) -> Option<UtteranceId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let synthesizer = self.synthesizer.as_mut()?;
        synthesizer.cancel();

        if let Some(previous) = self.active.take() {
            debug!(utterance = previous, "interrupting active utterance");
        }

        let id = self.next_id;
        self.next_id += 1;

        let voice = select_voice(self.config.voice.as_deref(), &self.voices);
        let request = UtteranceRequest {
            id,
            text: text.to_string(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
            voice,
        };

        info!(
            utterance = id,
            voice = request.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            "speaking"
        );

        self.active = Some(id);
        self.set_state(SpeakingState::Idle);
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.speak(request);
        }
        Some(id)
    }

    /// Stop any active utterance; returns whether one was interrupted
    pub fn cancel(&mut self) -> bool {
        let Some(synthesizer) = self.synthesizer.as_mut() else {
            return false;
        };
        synthesizer.cancel();
        let interrupted = self.active.take().is_some();
        self.set_state(SpeakingState::Idle);
        if interrupted {
            info!("speech cancelled");
        }
        interrupted
    }

    /// Pause the active utterance; no-op unless speaking
    pub fn pause(&mut self) -> bool {
        if self.state != SpeakingState::Speaking {
            return false;
        }
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.pause();
        }
        self.set_state(SpeakingState::Paused)
    }

    /// Resume a paused utterance; no-op unless paused
    pub fn resume(&mut self) -> bool {
        if self.state != SpeakingState::Paused {
            return false;
        }
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.resume();
        }
        self.set_state(SpeakingState::Speaking)
    }

    /// Process one platform callback
    pub fn handle_event(&mut self, event: SynthesisEvent) -> Option<OutputTransition> {
        match event {
            SynthesisEvent::VoicesChanged => {
                let synthesizer = self.synthesizer.as_ref()?;
                self.voices = synthesizer.voices();
                debug!(count = self.voices.len(), "voice inventory refreshed");
                Some(OutputTransition::VoicesRefreshed(self.voices.len()))
            }
            SynthesisEvent::Started(id) => {
                if !self.is_current(id) {
                    return None;
                }
                self.error = None;
                self.set_state(SpeakingState::Speaking);
                Some(OutputTransition::Started(id))
            }
            SynthesisEvent::Ended(id) => {
                if !self.is_current(id) {
                    return None;
                }
                self.active = None;
                self.set_state(SpeakingState::Idle);
                Some(OutputTransition::Finished(id))
            }
            SynthesisEvent::Error { id, code } => {
                if !self.is_current(id) {
                    return None;
                }
                warn!(utterance = id, %code, "utterance failed");
                let error = EngineError::SynthesisFault(code);
                self.active = None;
                self.error = Some(error.clone());
                self.set_state(SpeakingState::Idle);
                Some(OutputTransition::Failed(id, error))
            }
        }
    }

    /// Tear the session down for good
    pub fn shutdown(&mut self) {
        self.cancel();
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        if self.active == Some(id) {
            true
        } else {
            debug!(utterance = id, "callback for superseded utterance ignored");
            false
        }
    }

    fn set_state(&mut self, new_state: SpeakingState) -> bool {
        let old_state = self.state;
        if old_state == new_state {
            return false;
        }
        debug!(from = %old_state, to = %new_state, "speaking state transition");
        self.state = new_state;
        true
    }
}
