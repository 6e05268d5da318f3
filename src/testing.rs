//! Deterministic capability fakes shared by unit tests

use std::sync::{Arc, Mutex};

use crate::config::RecognitionConfig;
use crate::error::PlatformError;
use crate::platform::{RecognitionEvent, Recognizer, Synthesizer, UtteranceRequest, Voice};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecognizerCall {
    Configure(String),
    Start,
    Stop,
    Abort,
}

/// Records calls; `start` fails with `AlreadyStarted` while `busy` is set.
///
/// With `abort_callbacks` set, `abort()` queues the `Error("aborted")` and
/// `Ended` callbacks a browser recognizer delivers afterwards.
#[derive(Clone, Default)]
pub(crate) struct FakeRecognizer {
    pub calls: Arc<Mutex<Vec<RecognizerCall>>>,
    pub busy: Arc<Mutex<bool>>,
    pub abort_callbacks: bool,
    pub pending: Arc<Mutex<Vec<RecognitionEvent>>>,
}

impl FakeRecognizer {
    pub fn with_abort_callbacks() -> Self {
        Self {
            abort_callbacks: true,
            ..Self::default()
        }
    }

    /// Callbacks queued by the fake since the last call
    pub fn take_pending(&self) -> Vec<RecognitionEvent> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    pub fn starts(&self) -> usize {
        self.count(&RecognizerCall::Start)
    }

    pub fn count(&self, call: &RecognizerCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn first_call(&self) -> Option<RecognizerCall> {
        self.calls.lock().unwrap().first().cloned()
    }
}

impl Recognizer for FakeRecognizer {
    fn configure(&mut self, settings: &RecognitionConfig) {
        self.calls
            .lock()
            .unwrap()
            .push(RecognizerCall::Configure(settings.language.clone()));
    }

    fn start(&mut self) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(RecognizerCall::Start);
        if *self.busy.lock().unwrap() {
            Err(PlatformError::AlreadyStarted)
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push(RecognizerCall::Stop);
    }

    fn abort(&mut self) {
        self.calls.lock().unwrap().push(RecognizerCall::Abort);
        if self.abort_callbacks {
            let mut pending = self.pending.lock().unwrap();
            pending.push(RecognitionEvent::Error("aborted".to_string()));
            pending.push(RecognitionEvent::Ended);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SynthesizerCall {
    Speak(UtteranceRequest),
    Cancel,
    Pause,
    Resume,
}

/// Records calls and serves a mutable voice inventory
#[derive(Clone, Default)]
pub(crate) struct FakeSynthesizer {
    pub calls: Arc<Mutex<Vec<SynthesizerCall>>>,
    pub voices: Arc<Mutex<Vec<Voice>>>,
}

impl FakeSynthesizer {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            calls: Arc::default(),
            voices: Arc::new(Mutex::new(voices)),
        }
    }

    pub fn spoken(&self) -> Vec<UtteranceRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SynthesizerCall::Speak(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<SynthesizerCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Synthesizer for FakeSynthesizer {
    fn speak(&mut self, request: UtteranceRequest) {
        self.calls.lock().unwrap().push(SynthesizerCall::Speak(request));
    }

    fn cancel(&mut self) {
        self.calls.lock().unwrap().push(SynthesizerCall::Cancel);
    }

    fn pause(&mut self) {
        self.calls.lock().unwrap().push(SynthesizerCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.lock().unwrap().push(SynthesizerCall::Resume);
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap().clone()
    }
}
