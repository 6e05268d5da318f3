//! Command loop controller
//!
//! Composes the input session, output session and command registry behind
//! one facade. Every platform callback and control request is handled to
//! completion before the next one is looked at.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use super::handle::{ControlReceiver, ControlRequest};
use crate::commands::{CommandRegistry, DispatchOutcome};
use crate::config::Config;
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::platform::{RecognitionEvent, Recognizer, SynthesisEvent, Synthesizer};
use crate::recognition::{SpeechInputSession, TranscriptEvent};
use crate::synthesis::{OutputTransition, SpeechOutputSession};

/// Snapshot of everything the calling application renders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub is_listening: bool,
    pub is_speaking: bool,
    pub is_paused: bool,
    /// Latest recorded failure
    pub error: Option<EngineError>,
    /// Both recognition and synthesis are available
    pub is_supported: bool,
    /// Source of the last pattern that dispatched
    pub last_command: Option<String>,
    /// Latest normalized final or raw interim transcript
    pub last_transcript: String,
}

/// The voice command controller
pub struct VoiceController {
    input: SpeechInputSession,
    output: SpeechOutputSession,
    registry: CommandRegistry,
    auto_start: bool,
    suspend_while_speaking: bool,
    mounted: bool,
    error: Option<EngineError>,
    last_command: Option<String>,
    last_transcript: String,
    event_tx: broadcast::Sender<EngineEvent>,
    status_tx: watch::Sender<ControllerStatus>,
}

impl VoiceController {
    /// Build a controller; a missing capability is reported as unsupported
    pub fn new(
        config: &Config,
        recognizer: Option<Box<dyn Recognizer>>,
        synthesizer: Option<Box<dyn Synthesizer>>,
        registry: CommandRegistry,
        event_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        let input = SpeechInputSession::new(recognizer, config.recognition.clone());
        let output = SpeechOutputSession::new(synthesizer, config.synthesis.clone());
        let (status_tx, _) = watch::channel(ControllerStatus::default());

        let controller = Self {
            input,
            output,
            registry,
            auto_start: config.auto_start,
            suspend_while_speaking: config.suspend_while_speaking,
            mounted: false,
            error: None,
            last_command: None,
            last_transcript: String::new(),
            event_tx,
            status_tx,
        };
        controller.publish();
        controller
    }

    pub fn is_listening(&self) -> bool {
        self.input.listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.output.is_speaking()
    }

    pub fn is_supported(&self) -> bool {
        self.input.is_supported() && self.output.is_supported()
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn input(&self) -> &SpeechInputSession {
        &self.input
    }

    pub fn output(&self) -> &SpeechOutputSession {
        &self.output
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            is_listening: self.input.listening(),
            is_speaking: self.output.is_speaking(),
            is_paused: self.output.is_paused(),
            error: self.error.clone(),
            is_supported: self.is_supported(),
            last_command: self.last_command.clone(),
            last_transcript: self.last_transcript.clone(),
        }
    }

    /// Receive a fresh status snapshot after every handled event
    pub fn subscribe_status(&self) -> watch::Receiver<ControllerStatus> {
        self.status_tx.subscribe()
    }

    /// Run auto-start once the capabilities are wired up
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        info!(
            supported = self.is_supported(),
            commands = self.registry.len(),
            "voice controller mounted"
        );
        if self.auto_start && self.input.is_supported() {
            self.start_listening();
        }
        self.publish();
    }

    pub fn start_listening(&mut self) {
        if let Some(error) = self.input.start() {
            self.record_error(error);
        }
        self.publish();
    }

    pub fn stop_listening(&mut self) {
        if self.input.stop() {
            self.emit(EngineEvent::ListeningStopped);
        }
        self.publish();
    }

    /// Speak a reply, interrupting any utterance in progress
    pub fn speak(&mut self, text: &str) {
        let interrupted = self.output.is_busy();
        if self.output.speak(text).is_none() {
            return;
        }
        if interrupted {
            self.emit(EngineEvent::SpeakingCancelled);
        }
        if self.suspend_while_speaking && self.input.suspend() {
            debug!("listening suspended while speaking");
        }
        self.publish();
    }

    pub fn cancel_speech(&mut self) {
        if self.output.cancel() {
            self.emit(EngineEvent::SpeakingCancelled);
        }
        self.resume_input();
        self.publish();
    }

    pub fn pause_speech(&mut self) {
        if self.output.pause() {
            self.publish();
        }
    }

    pub fn resume_speech(&mut self) {
        if self.output.resume() {
            self.publish();
        }
    }

    pub fn reset_transcript(&mut self) {
        self.input.reset_transcript();
        self.last_transcript.clear();
        self.publish();
    }

    /// Apply one request from a [`ControllerHandle`](super::ControllerHandle)
    pub fn handle_control(&mut self, request: ControlRequest) {
        debug!(?request, "control request");
        match request {
            ControlRequest::StartListening => self.start_listening(),
            ControlRequest::StopListening => self.stop_listening(),
            ControlRequest::Speak(text) => self.speak(&text),
            ControlRequest::CancelSpeech => self.cancel_speech(),
            ControlRequest::PauseSpeech => self.pause_speech(),
            ControlRequest::ResumeSpeech => self.resume_speech(),
            ControlRequest::ResetTranscript => self.reset_transcript(),
            ControlRequest::Shutdown => self.shutdown(),
        }
    }

    /// Apply one recognizer callback
    pub fn handle_recognition(&mut self, event: RecognitionEvent) {
        let was_listening = self.input.listening();
        let update = self.input.handle_event(event);

        if update.state_changed {
            match (was_listening, self.input.listening()) {
                (false, true) => {
                    if matches!(self.error, Some(ref e) if e.is_fatal()) {
                        self.error = None;
                    }
                    self.emit(EngineEvent::ListeningStarted);
                }
                (true, false) => self.emit(EngineEvent::ListeningStopped),
                _ => {}
            }
        }

        if let Some(error) = update.error {
            self.record_error(error);
        }

        for transcript in update.transcripts {
            self.handle_transcript(transcript);
        }

        self.publish();
    }

    /// Apply one synthesizer callback
    pub fn handle_synthesis(&mut self, event: SynthesisEvent) {
        match self.output.handle_event(event) {
            Some(OutputTransition::Started(_)) => self.emit(EngineEvent::SpeakingStarted),
            Some(OutputTransition::Finished(_)) => {
                self.emit(EngineEvent::SpeakingFinished);
                self.resume_input();
            }
            Some(OutputTransition::Failed(_, error)) => {
                self.record_error(error);
                self.resume_input();
            }
            Some(OutputTransition::VoicesRefreshed(count)) => {
                debug!(count, "voices available");
            }
            None => return,
        }
        self.publish();
    }

    /// Stop both sessions for good
    pub fn shutdown(&mut self) {
        let was_listening = self.input.listening();
        if self.output.is_busy() {
            self.emit(EngineEvent::SpeakingCancelled);
        }
        self.output.shutdown();
        self.input.shutdown();
        if was_listening {
            self.emit(EngineEvent::ListeningStopped);
        }
        info!("voice controller shut down");
        self.publish();
    }

    /// Drive the controller from its event channels until shutdown.
    ///
    /// Returns the final status snapshot.
    pub async fn run(
        mut self,
        mut recognition_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
        mut synthesis_rx: mpsc::UnboundedReceiver<SynthesisEvent>,
        mut control_rx: ControlReceiver,
    ) -> ControllerStatus {
        self.mount();
        info!("voice controller running");

        loop {
            tokio::select! {
                // Platform callbacks already delivered go before new requests
                biased;

                Some(event) = recognition_rx.recv() => {
                    self.handle_recognition(event);
                }
                Some(event) = synthesis_rx.recv() => {
                    self.handle_synthesis(event);
                }
                request = control_rx.recv() => {
                    match request {
                        Some(ControlRequest::Shutdown) | None => break,
                        Some(request) => self.handle_control(request),
                    }
                }
            }
        }

        self.shutdown();
        self.status()
    }

    fn handle_transcript(&mut self, transcript: TranscriptEvent) {
        if !transcript.is_final {
            self.last_transcript = transcript.text.clone();
            self.emit(EngineEvent::InterimTranscript {
                text: transcript.text,
            });
            return;
        }

        self.emit(EngineEvent::FinalTranscript {
            text: transcript.text.clone(),
        });

        match self.registry.dispatch(&transcript.text) {
            DispatchOutcome::Matched {
                transcript,
                command,
            } => {
                self.last_transcript = transcript.clone();
                self.last_command = Some(command.pattern.clone());
                self.emit(EngineEvent::CommandDispatched {
                    transcript,
                    command,
                });
            }
            DispatchOutcome::Unrecognized { transcript } => {
                self.last_transcript = transcript.clone();
                self.emit(EngineEvent::Unrecognized { transcript });
            }
        }
    }

    fn resume_input(&mut self) {
        if !self.input.is_suspended() {
            return;
        }
        if let Some(error) = self.input.resume() {
            self.record_error(error);
        }
    }

    fn record_error(&mut self, error: EngineError) {
        // Benign in continuous mode: kept as state, not surfaced
        if error != EngineError::NoSpeechDetected {
            warn!(kind = error.kind(), %error, "voice engine error");
            self.emit(EngineEvent::from(&error));
        }
        self.error = Some(error);
    }

    fn emit(&self, event: EngineEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}
