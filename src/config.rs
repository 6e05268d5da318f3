//! Configuration loading and management

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_PREFIX: &str = "MAILVOICE_";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recognition: RecognitionConfig,
    pub synthesis: SynthesisConfig,

    /// Start listening once the recognizer is available
    pub auto_start: bool,

    /// Suspend recognition while an utterance is playing so the engine
    /// cannot hear its own voice
    pub suspend_while_speaking: bool,
}

/// Settings handed to the platform recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Keep listening across platform sub-sessions via auto-restart
    pub continuous: bool,
    /// Deliver provisional results
    pub interim_results: bool,
    /// BCP 47 language tag
    pub language: String,
}

/// Per-utterance synthesis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Speaking rate, 0.1..=10
    pub rate: f32,
    /// Pitch, 0..=2
    pub pitch: f32,
    /// Volume, 0..=1
    pub volume: f32,
    /// Preferred voice name; falls back to the selection policy when absent
    pub voice: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            synthesis: SynthesisConfig::default(),
            auto_start: false,
            suspend_while_speaking: true,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

impl Config {
    /// Load configuration from `MAILVOICE_*` environment variables over defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        let mut config = Self::default();

        if let Some((_, value)) = get("LANG") {
            config.recognition.language = value.trim().to_string();
        }
        if let Some((key, value)) = get("CONTINUOUS") {
            config.recognition.continuous = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("INTERIM_RESULTS") {
            config.recognition.interim_results = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("RATE") {
            config.synthesis.rate = parse_f32(&key, &value)?;
        }
        if let Some((key, value)) = get("PITCH") {
            config.synthesis.pitch = parse_f32(&key, &value)?;
        }
        if let Some((key, value)) = get("VOLUME") {
            config.synthesis.volume = parse_f32(&key, &value)?;
        }
        if let Some((_, value)) = get("VOICE") {
            let value = value.trim();
            config.synthesis.voice = (!value.is_empty()).then(|| value.to_string());
        }
        if let Some((key, value)) = get("AUTO_START") {
            config.auto_start = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("SUSPEND_WHILE_SPEAKING") {
            config.suspend_while_speaking = parse_bool(&key, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges once, before any session is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recognition.language.trim().is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        check_range("rate", self.synthesis.rate, 0.1, 10.0)?;
        check_range("pitch", self.synthesis.pitch, 0.0, 2.0)?;
        check_range("volume", self.synthesis.volume, 0.0, 1.0)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        key: key.to_string(),
        value: value.to_string(),
    })
}
