//! Voice selection policy

use crate::platform::Voice;

/// Marker for the higher quality network voices some platforms ship
const PREFERRED_VOICE_MARKER: &str = "Google";

/// Pick the voice for the next utterance.
///
/// Priority: the named preferred voice, then an English voice carrying the
/// preferred marker, then any English voice. `None` leaves the platform
/// default.
pub fn select_voice(preferred: Option<&str>, voices: &[Voice]) -> Option<Voice> {
    if let Some(name) = preferred {
        if let Some(voice) = voices.iter().find(|v| v.name == name) {
            return Some(voice.clone());
        }
        tracing::warn!(voice = name, "preferred voice not installed, using fallback");
    }

    let is_english = |v: &&Voice| v.lang.starts_with("en");

    voices
        .iter()
        .filter(is_english)
        .find(|v| v.name.contains(PREFERRED_VOICE_MARKER))
        .or_else(|| voices.iter().find(is_english))
        .cloned()
}
