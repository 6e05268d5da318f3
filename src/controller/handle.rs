//! Cloneable request handle for a running controller

use tokio::sync::mpsc;
use tracing::debug;

/// Requests processed by the controller loop, in send order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    StartListening,
    StopListening,
    Speak(String),
    CancelSpeech,
    PauseSpeech,
    ResumeSpeech,
    ResetTranscript,
    Shutdown,
}

/// Receiving side handed to [`VoiceController::run`](super::VoiceController::run)
pub type ControlReceiver = mpsc::UnboundedReceiver<ControlRequest>;

/// Handle used by command actions and hosts to drive the controller.
///
/// Requests sent from inside a command action are handled after the current
/// dispatch returns, so actions never re-enter the controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControlRequest>,
}

impl ControllerHandle {
    pub fn channel() -> (Self, ControlReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn start_listening(&self) -> bool {
        self.send(ControlRequest::StartListening)
    }

    pub fn stop_listening(&self) -> bool {
        self.send(ControlRequest::StopListening)
    }

    pub fn speak(&self, text: impl Into<String>) -> bool {
        self.send(ControlRequest::Speak(text.into()))
    }

    pub fn cancel_speech(&self) -> bool {
        self.send(ControlRequest::CancelSpeech)
    }

    pub fn pause_speech(&self) -> bool {
        self.send(ControlRequest::PauseSpeech)
    }

    pub fn resume_speech(&self) -> bool {
        self.send(ControlRequest::ResumeSpeech)
    }

    pub fn reset_transcript(&self) -> bool {
        self.send(ControlRequest::ResetTranscript)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ControlRequest::Shutdown)
    }

    /// Returns false once the controller has gone away
    pub fn send(&self, request: ControlRequest) -> bool {
        match self.tx.send(request) {
            Ok(()) => true,
            Err(err) => {
                debug!(request = ?err.0, "controller gone, request dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_arrive_in_order() {
        let (handle, mut rx) = ControllerHandle::channel();
        assert!(handle.speak("hello"));
        assert!(handle.cancel_speech());
        assert_eq!(rx.try_recv().unwrap(), ControlRequest::Speak("hello".into()));
        assert_eq!(rx.try_recv().unwrap(), ControlRequest::CancelSpeech);
    }

    #[test]
    fn test_send_after_drop_reports_failure() {
        let (handle, rx) = ControllerHandle::channel();
        drop(rx);
        assert!(!handle.stop_listening());
    }
}
