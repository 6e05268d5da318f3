//! Terminal-backed capabilities used by the `mailvoice` binary
//!
//! Typed lines stand in for final transcripts and spoken replies are
//! printed. Both report their callbacks through the same event channels a
//! real platform binding would use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    RecognitionEvent, RecognitionResult, Recognizer, SynthesisEvent, Synthesizer,
    UtteranceRequest, Voice,
};
use crate::config::RecognitionConfig;
use crate::error::PlatformError;

/// Recognizer that turns stdin lines into final results
pub struct ConsoleRecognizer {
    event_tx: mpsc::UnboundedSender<RecognitionEvent>,
    active: Arc<AtomicBool>,
}

impl ConsoleRecognizer {
    pub fn new(event_tx: mpsc::UnboundedSender<RecognitionEvent>) -> Self {
        Self {
            event_tx,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Forward stdin lines while a session is active; returns on EOF
    pub fn pump_stdin(&self) -> impl std::future::Future<Output = std::io::Result<()>> + Send + 'static {
        let event_tx = self.event_tx.clone();
        let active = Arc::clone(&self.active);

        async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if !active.load(Ordering::SeqCst) {
                    debug!(line, "not listening, input dropped");
                    continue;
                }
                let event = RecognitionEvent::Result {
                    result_index: 0,
                    results: vec![RecognitionResult::new(line, true)],
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            info!("stdin closed");
            Ok(())
        }
    }

    fn end_session(&mut self) {
        if self.active.swap(false, Ordering::SeqCst)
            && self.event_tx.send(RecognitionEvent::Ended).is_err()
        {
            warn!("recognition event channel closed");
        }
    }
}

impl Recognizer for ConsoleRecognizer {
    fn configure(&mut self, settings: &RecognitionConfig) {
        debug!(
            continuous = settings.continuous,
            interim_results = settings.interim_results,
            language = %settings.language,
            "console recognizer configured"
        );
    }

    fn start(&mut self) -> Result<(), PlatformError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(PlatformError::AlreadyStarted);
        }
        self.event_tx
            .send(RecognitionEvent::Started)
            .map_err(|_| PlatformError::Unavailable("event channel closed".to_string()))
    }

    fn stop(&mut self) {
        self.end_session();
    }

    fn abort(&mut self) {
        self.end_session();
    }
}

/// Synthesizer that prints utterances and completes them immediately
pub struct ConsoleSynthesizer {
    event_tx: mpsc::UnboundedSender<SynthesisEvent>,
    voices: Vec<Voice>,
}

impl ConsoleSynthesizer {
    pub fn new(event_tx: mpsc::UnboundedSender<SynthesisEvent>) -> Self {
        let voices = vec![
            Voice::new("Console Narrator", "en-US"),
            Voice::new("Console Locutor", "es-ES"),
        ];
        let synthesizer = Self { event_tx, voices };
        // Inventory becomes visible through the usual notification
        synthesizer.send(SynthesisEvent::VoicesChanged);
        synthesizer
    }

    fn send(&self, event: SynthesisEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("synthesis event channel closed");
        }
    }
}

impl Synthesizer for ConsoleSynthesizer {
    fn speak(&mut self, request: UtteranceRequest) {
        let voice = request
            .voice
            .as_ref()
            .map(|v| v.name.as_str())
            .unwrap_or("default");
        println!("[{voice}] {}", request.text);
        self.send(SynthesisEvent::Started(request.id));
        self.send(SynthesisEvent::Ended(request.id));
    }

    fn cancel(&mut self) {
        debug!("console synthesizer cancel");
    }

    fn pause(&mut self) {
        debug!("console synthesizer pause");
    }

    fn resume(&mut self) {
        debug!("console synthesizer resume");
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }
}
