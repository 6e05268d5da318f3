//! Continuous listening on top of discrete platform sessions
//!
//! The platform ends sessions on its own (silence timeouts, session limits,
//! errors). In continuous mode the session restarts itself after every end
//! until `stop()` is called or a fatal error halts it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RecognitionConfig;
use crate::error::{EngineError, PlatformError};
use crate::platform::{RecognitionEvent, RecognitionResult, Recognizer};

/// Error code the platform reports for a session ended by `abort()`
const ABORTED_CODE: &str = "aborted";

/// Input session status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningState {
    #[default]
    Idle,
    Listening,
    Error,
}

impl fmt::Display for ListeningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListeningState::Idle => write!(f, "Idle"),
            ListeningState::Listening => write!(f, "Listening"),
            ListeningState::Error => write!(f, "Error"),
        }
    }
}

/// One transcript produced from a result delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
}

/// What handling one platform event produced
#[derive(Debug, Default, PartialEq)]
pub struct InputUpdate {
    /// Final before interim, at most one of each
    pub transcripts: Vec<TranscriptEvent>,
    /// Error classified from this event, if any
    pub error: Option<EngineError>,
    /// Listening state changed while handling the event
    pub state_changed: bool,
}

/// Speech input session over an injected recognizer
pub struct SpeechInputSession {
    recognizer: Option<Box<dyn Recognizer>>,
    settings: RecognitionConfig,
    state: ListeningState,
    /// A platform session is running or has been requested
    session_active: bool,
    /// Set by `stop()` and by fatal errors; blocks auto-restart
    halted: bool,
    /// Paused by the host (e.g. while speaking) without dropping intent
    suspended: bool,
    /// `start()` arrived while the previous session was still winding down
    restart_pending: bool,
    error: Option<EngineError>,
    transcript: String,
    interim_transcript: String,
}

impl SpeechInputSession {
    /// Create a session; `None` means the platform lacks recognition
    pub fn new(recognizer: Option<Box<dyn Recognizer>>, settings: RecognitionConfig) -> Self {
        let mut recognizer = recognizer;
        if let Some(r) = recognizer.as_mut() {
            r.configure(&settings);
        }
        Self {
            recognizer,
            settings,
            state: ListeningState::Idle,
            session_active: false,
            halted: true,
            suspended: false,
            restart_pending: false,
            error: None,
            transcript: String::new(),
            interim_transcript: String::new(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn listening(&self) -> bool {
        self.state == ListeningState::Listening
    }

    pub fn state(&self) -> ListeningState {
        self.state
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Whether the caller currently wants the session running
    pub fn wants_listening(&self) -> bool {
        !self.halted
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Accumulated final text, space-joined
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Latest interim text
    pub fn interim_transcript(&self) -> &str {
        &self.interim_transcript
    }

    pub fn reset_transcript(&mut self) {
        self.transcript.clear();
        self.interim_transcript.clear();
    }

    /// Begin listening; no-op while a session is already active
    pub fn start(&mut self) -> Option<EngineError> {
        if self.recognizer.is_none() {
            self.error = Some(EngineError::UnsupportedPlatform);
            return self.error.clone();
        }
        let was_halted = std::mem::replace(&mut self.halted, false);
        if self.suspended {
            debug!("start requested while suspended, deferring to resume");
            return None;
        }
        if self.session_active {
            if was_halted {
                debug!("previous session still ending, restart queued");
                self.restart_pending = true;
            } else {
                debug!("recognition session already active");
            }
            return None;
        }
        self.launch()
    }

    /// Stop listening and disable auto-restart
    pub fn stop(&mut self) -> bool {
        self.halted = true;
        self.suspended = false;
        self.restart_pending = false;
        let Some(recognizer) = self.recognizer.as_mut() else {
            return false;
        };
        recognizer.stop();
        info!("recognition stopped");
        self.set_state(ListeningState::Idle)
    }

    /// Pause the platform session, keeping the intent to listen
    pub fn suspend(&mut self) -> bool {
        if self.halted || self.suspended || self.recognizer.is_none() {
            return false;
        }
        self.suspended = true;
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        debug!("recognition suspended");
        true
    }

    /// Undo `suspend()`, restarting the platform session if still wanted
    pub fn resume(&mut self) -> Option<EngineError> {
        if !self.suspended {
            return None;
        }
        self.suspended = false;
        debug!("recognition resumed");
        if self.halted || self.session_active {
            return None;
        }
        self.launch()
    }

    /// Tear the session down for good
    pub fn shutdown(&mut self) {
        self.halted = true;
        self.suspended = false;
        self.restart_pending = false;
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        self.session_active = false;
        self.state = ListeningState::Idle;
    }

    /// Process one platform callback
    pub fn handle_event(&mut self, event: RecognitionEvent) -> InputUpdate {
        let mut update = InputUpdate::default();
        match event {
            RecognitionEvent::Started => {
                self.session_active = true;
                if self.halted || self.suspended {
                    // Stop/suspend raced the platform start
                    debug!("session started after stop, aborting");
                    if let Some(recognizer) = self.recognizer.as_mut() {
                        recognizer.abort();
                    }
                    return update;
                }
                self.error = None;
                update.state_changed = self.set_state(ListeningState::Listening);
            }
            RecognitionEvent::Ended => {
                self.session_active = false;
                let restart_requested = std::mem::take(&mut self.restart_pending);
                if !self.settings.continuous && !restart_requested && !self.suspended {
                    // One-shot session is over
                    self.halted = true;
                }
                if !self.halted && !self.suspended {
                    info!("recognition session ended, restarting");
                    update.error = self.launch();
                } else if self.state == ListeningState::Listening {
                    update.state_changed = self.set_state(ListeningState::Idle);
                }
            }
            RecognitionEvent::Result {
                result_index,
                results,
            } => {
                if self.halted || self.suspended {
                    debug!(suspended = self.suspended, "results while not listening ignored");
                    return update;
                }
                update.transcripts = self.collect_results(result_index, &results);
            }
            RecognitionEvent::Error(code) => {
                if code == ABORTED_CODE && (self.halted || self.suspended) {
                    debug!("session aborted on request");
                    return update;
                }
                let error = EngineError::from_recognition_code(&code);
                if error.is_fatal() {
                    warn!(%code, %error, "recognition halted");
                    self.halted = true;
                    if let Some(recognizer) = self.recognizer.as_mut() {
                        recognizer.abort();
                    }
                    update.state_changed = self.set_state(ListeningState::Error);
                } else {
                    debug!(%code, "benign recognition error");
                }
                self.error = Some(error.clone());
                update.error = Some(error);
            }
        }
        update
    }

    fn collect_results(&mut self, result_index: usize, results: &[RecognitionResult]) -> Vec<TranscriptEvent> {
        let mut final_text = String::new();
        let mut interim_text = String::new();

        for result in results.iter().skip(result_index) {
            if result.is_final {
                final_text.push_str(result.transcript());
            } else {
                interim_text.push_str(result.transcript());
            }
        }

        let mut transcripts = Vec::with_capacity(2);

        let final_text = final_text.trim();
        if !final_text.is_empty() {
            if !self.transcript.is_empty() {
                self.transcript.push(' ');
            }
            self.transcript.push_str(final_text);
            transcripts.push(TranscriptEvent {
                text: final_text.to_string(),
                is_final: true,
            });
        }

        self.interim_transcript = interim_text.clone();
        if !interim_text.is_empty() {
            transcripts.push(TranscriptEvent {
                text: interim_text,
                is_final: false,
            });
        }

        transcripts
    }

    /// Ask the platform for a new session
    fn launch(&mut self) -> Option<EngineError> {
        let recognizer = self.recognizer.as_mut()?;
        self.session_active = true;
        match recognizer.start() {
            Ok(()) => {
                debug!(language = %self.settings.language, "recognition start requested");
                None
            }
            Err(PlatformError::AlreadyStarted) => {
                debug!("recognizer already starting");
                None
            }
            Err(PlatformError::Unavailable(reason)) => {
                warn!(%reason, "recognizer failed to start");
                self.session_active = false;
                let error = EngineError::RecognitionFault(reason);
                self.error = Some(error.clone());
                self.set_state(ListeningState::Error);
                Some(error)
            }
        }
    }

    fn set_state(&mut self, new_state: ListeningState) -> bool {
        let old_state = self.state;
        if old_state == new_state {
            return false;
        }
        info!(from = %old_state, to = %new_state, "listening state transition");
        self.state = new_state;
        true
    }
}

impl Drop for SpeechInputSession {
    fn drop(&mut self) {
        if self.session_active {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRecognizer, RecognizerCall};

    fn create_session(continuous: bool) -> (SpeechInputSession, FakeRecognizer) {
        let fake = FakeRecognizer::default();
        let settings = RecognitionConfig {
            continuous,
            ..RecognitionConfig::default()
        };
        let session = SpeechInputSession::new(Some(Box::new(fake.clone())), settings);
        (session, fake)
    }

    fn listening_session() -> (SpeechInputSession, FakeRecognizer) {
        let (mut session, fake) = create_session(true);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        (session, fake)
    }

    fn results(items: &[(&str, bool)]) -> RecognitionEvent {
        RecognitionEvent::Result {
            result_index: 0,
            results: items
                .iter()
                .map(|(text, is_final)| RecognitionResult::new(*text, *is_final))
                .collect(),
        }
    }

    #[test]
    fn test_configures_recognizer_on_construction() {
        let (_session, fake) = create_session(true);
        assert_eq!(
            fake.first_call(),
            Some(RecognizerCall::Configure("en-US".to_string()))
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut session, fake) = create_session(true);
        session.start();
        session.start();
        session.handle_event(RecognitionEvent::Started);
        session.start();
        assert_eq!(fake.starts(), 1);
        assert!(session.listening());
    }

    #[test]
    fn test_auto_restart_after_end() {
        let (mut session, fake) = listening_session();
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_no_restart_after_stop() {
        let (mut session, fake) = listening_session();
        assert!(session.stop());
        assert!(!session.listening());
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 1);
        assert_eq!(session.state(), ListeningState::Idle);
    }

    #[test]
    fn test_no_restart_when_not_continuous() {
        let (mut session, fake) = create_session(false);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 1);
        assert_eq!(session.state(), ListeningState::Idle);
    }

    #[test]
    fn test_restart_failure_while_starting_is_swallowed() {
        let (mut session, fake) = listening_session();
        *fake.busy.lock().unwrap() = true;
        let update = session.handle_event(RecognitionEvent::Ended);
        assert_eq!(update.error, None);
        assert!(session.error().is_none());
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_final_before_interim() {
        let (mut session, _) = listening_session();
        let update = session.handle_event(results(&[
            ("open ", true),
            ("inbox", true),
            ("read", false),
        ]));
        assert_eq!(
            update.transcripts,
            vec![
                TranscriptEvent {
                    text: "open inbox".to_string(),
                    is_final: true
                },
                TranscriptEvent {
                    text: "read".to_string(),
                    is_final: false
                },
            ]
        );
        assert_eq!(session.transcript(), "open inbox");
        assert_eq!(session.interim_transcript(), "read");
    }

    #[test]
    fn test_results_start_at_result_index() {
        let (mut session, _) = listening_session();
        let update = session.handle_event(RecognitionEvent::Result {
            result_index: 1,
            results: vec![
                RecognitionResult::new("old", true),
                RecognitionResult::new("help", true),
            ],
        });
        assert_eq!(update.transcripts.len(), 1);
        assert_eq!(update.transcripts[0].text, "help");
    }

    #[test]
    fn test_empty_batch_emits_nothing() {
        let (mut session, _) = listening_session();
        let update = session.handle_event(results(&[("  ", true)]));
        assert!(update.transcripts.is_empty());
    }

    #[test]
    fn test_transcript_accumulates_and_resets() {
        let (mut session, _) = listening_session();
        session.handle_event(results(&[("open inbox", true)]));
        session.handle_event(results(&[("help", true)]));
        assert_eq!(session.transcript(), "open inbox help");
        session.reset_transcript();
        assert_eq!(session.transcript(), "");
    }

    #[test]
    fn test_no_speech_is_benign() {
        let (mut session, fake) = listening_session();
        let update = session.handle_event(RecognitionEvent::Error("no-speech".into()));
        assert_eq!(update.error, Some(EngineError::NoSpeechDetected));
        assert!(session.listening());
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_not_allowed_halts() {
        let (mut session, fake) = listening_session();
        session.handle_event(RecognitionEvent::Error("not-allowed".into()));
        assert!(!session.listening());
        assert_eq!(session.state(), ListeningState::Error);
        assert_eq!(session.error(), Some(&EngineError::PermissionDenied));
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 1);
    }

    #[test]
    fn test_fatal_error_allows_manual_restart() {
        let (mut session, fake) = listening_session();
        session.handle_event(RecognitionEvent::Error("network".into()));
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(session.state(), ListeningState::Error);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        assert!(session.listening());
        assert!(session.error().is_none());
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_unsupported_platform() {
        let mut session = SpeechInputSession::new(None, RecognitionConfig::default());
        assert!(!session.is_supported());
        assert_eq!(session.start(), Some(EngineError::UnsupportedPlatform));
        assert!(!session.listening());
        assert!(!session.stop());
    }

    #[test]
    fn test_suspend_and_resume() {
        let (mut session, fake) = listening_session();
        assert!(session.suspend());
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 1);
        assert!(session.wants_listening());

        session.resume();
        assert_eq!(fake.starts(), 2);
        session.handle_event(RecognitionEvent::Started);
        assert!(session.listening());
    }

    #[test]
    fn test_suspend_ignored_when_stopped() {
        let (mut session, _) = create_session(true);
        assert!(!session.suspend());
    }

    #[test]
    fn test_abort_error_while_suspended_is_benign() {
        let (mut session, fake) = listening_session();
        assert!(session.suspend());
        let update = session.handle_event(RecognitionEvent::Error("aborted".into()));
        assert_eq!(update, InputUpdate::default());
        session.handle_event(RecognitionEvent::Ended);
        assert!(session.wants_listening());
        assert!(session.error().is_none());

        session.resume();
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_abort_error_after_fatal_keeps_original_error() {
        let (mut session, _) = listening_session();
        session.handle_event(RecognitionEvent::Error("not-allowed".into()));
        session.handle_event(RecognitionEvent::Error("aborted".into()));
        assert_eq!(session.error(), Some(&EngineError::PermissionDenied));
    }

    #[test]
    fn test_abort_error_while_listening_halts() {
        let (mut session, _) = listening_session();
        session.handle_event(RecognitionEvent::Error("aborted".into()));
        assert_eq!(session.state(), ListeningState::Error);
        assert!(!session.wants_listening());
    }

    #[test]
    fn test_results_while_suspended_ignored() {
        let (mut session, _) = listening_session();
        session.suspend();
        let update = session.handle_event(results(&[("opening inbox", true)]));
        assert!(update.transcripts.is_empty());
        assert_eq!(session.transcript(), "");
    }

    #[test]
    fn test_one_shot_session_not_revived_by_suspend() {
        let (mut session, fake) = create_session(false);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        session.handle_event(RecognitionEvent::Ended);
        assert!(!session.wants_listening());

        assert!(!session.suspend());
        session.resume();
        assert_eq!(fake.starts(), 1);
    }

    #[test]
    fn test_one_shot_cut_by_suspend_resumes() {
        let (mut session, fake) = create_session(false);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        assert!(session.suspend());
        session.handle_event(RecognitionEvent::Ended);
        session.resume();
        assert_eq!(fake.starts(), 2);
    }

    #[test]
    fn test_start_while_previous_session_ending_is_queued() {
        let (mut session, fake) = create_session(false);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        session.stop();
        session.start();
        assert_eq!(fake.starts(), 1);

        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 2);
        session.handle_event(RecognitionEvent::Started);
        assert!(session.listening());
    }

    #[test]
    fn test_stop_drops_queued_start() {
        let (mut session, fake) = create_session(false);
        session.start();
        session.handle_event(RecognitionEvent::Started);
        session.stop();
        session.start();
        session.stop();
        session.handle_event(RecognitionEvent::Ended);
        assert_eq!(fake.starts(), 1);
    }
}
