//! Error types for the voice engine
//!
//! Engine failures are never thrown across the engine boundary. They are
//! recorded in the controller's status and broadcast as events. Only
//! construction-time validation returns `Result`.

use serde::{Deserialize, Serialize};

/// Failures observed while running the speech sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum EngineError {
    /// The recognizer heard nothing before its silence timeout
    #[error("No speech detected")]
    NoSpeechDetected,

    /// Microphone permission was denied or revoked
    #[error("Microphone access denied")]
    PermissionDenied,

    /// Any other recognition error code reported by the platform
    #[error("Speech recognition error: {0}")]
    RecognitionFault(String),

    /// The active utterance failed
    #[error("Speech synthesis error: {0}")]
    SynthesisFault(String),

    /// A speech capability is absent on this platform
    #[error("Speech recognition not supported")]
    UnsupportedPlatform,
}

impl EngineError {
    /// Classify a recognition error code delivered by the platform
    pub fn from_recognition_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeechDetected,
            "not-allowed" | "service-not-allowed" => Self::PermissionDenied,
            other => Self::RecognitionFault(other.to_string()),
        }
    }

    /// Whether the error halts the input session
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoSpeechDetected | Self::SynthesisFault(_))
    }

    /// Stable tag hosts can switch on to render distinct guidance
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSpeechDetected => "no_speech_detected",
            Self::PermissionDenied => "permission_denied",
            Self::RecognitionFault(_) => "recognition_fault",
            Self::SynthesisFault(_) => "synthesis_fault",
            Self::UnsupportedPlatform => "unsupported_platform",
        }
    }
}

/// Errors raised by a platform capability call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("recognition session already started")]
    AlreadyStarted,

    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Parse { key: String, value: String },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },

    #[error("language tag must not be empty")]
    EmptyLanguage,
}

/// Errors raised while compiling the command registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("command {command:?} has no patterns")]
    NoPatterns { command: String },

    #[error("command {command:?} has an invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        command: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
