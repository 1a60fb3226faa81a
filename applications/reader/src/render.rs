//! Terminal output for reader events

use recital_core::types::PositionSnapshot;
use recital_playback::{ReaderEvent, SentenceList};

/// Line to print for an event, if any
pub fn event_line(event: &ReaderEvent, sentences: &SentenceList) -> Option<String> {
    match event {
        ReaderEvent::SentenceStarted { index } => {
            let text = sentences.get(*index)?.as_str().trim();
            Some(format!("[{}/{}] {}", index + 1, sentences.len(), text))
        }
        ReaderEvent::StateChanged { state, .. } => Some(format!("-- {state}")),
        ReaderEvent::EtaUpdated { label, .. } => Some(format!("-- {label} left")),
        ReaderEvent::VoiceChanged { voice: Some(voice) } => Some(format!("-- voice {voice}")),
        ReaderEvent::Error { error } => Some(format!("!! {error}")),
        _ => None,
    }
}

/// One-line summary of a stored position
///
/// With the document's sentence count a position at the end reads as
/// finished. Without it only the number of sentences read is known.
pub fn snapshot_line(snapshot: &PositionSnapshot, sentence_count: Option<usize>) -> String {
    let position = match sentence_count {
        Some(count) if snapshot.sentence_index >= count => "finished".to_string(),
        Some(count) => format!(
            "sentence {} of {}  offset {}",
            snapshot.sentence_index + 1,
            count,
            snapshot.character_offset
        ),
        None => format!("{} sentences read", snapshot.sentence_index),
    };

    format!(
        "{}  {}  saved {}",
        snapshot.document_identity,
        position,
        snapshot.captured_at.to_rfc3339()
    )
}

/// Numbered sentence listing
pub fn sentence_listing(sentences: &SentenceList) -> String {
    sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| format!("{:>4}  {:?}\n", i + 1, sentence.as_str()))
        .collect()
}
