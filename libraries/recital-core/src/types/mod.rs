//! Domain types shared by every Recital crate

mod ids;
mod sentence;
mod snapshot;
mod state;
mod utterance;
mod voice;

pub use ids::{DocumentId, TimerToken, UtteranceId};
pub use sentence::Sentence;
pub use snapshot::PositionSnapshot;
pub use state::ReaderState;
pub use utterance::Utterance;
pub use voice::{
    VoiceInfo, VoiceParams, VoiceParamsUpdate, MAX_PITCH, MAX_RATE, MIN_PITCH, MIN_RATE,
};
