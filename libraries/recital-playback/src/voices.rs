//! Default voice selection

use recital_core::types::VoiceInfo;

/// Pick a voice when the user has not selected one
///
/// Order: the first voice whose language starts with `preferred_language`,
/// then the engine's default voice, then the first voice offered.
pub fn select_default_voice<'a>(
    voices: &'a [VoiceInfo],
    preferred_language: Option<&str>,
) -> Option<&'a VoiceInfo> {
    preferred_language
        .filter(|prefix| !prefix.is_empty())
        .and_then(|prefix| voices.iter().find(|voice| voice.speaks(prefix)))
        .or_else(|| voices.iter().find(|voice| voice.is_default))
        .or_else(|| voices.first())
}
