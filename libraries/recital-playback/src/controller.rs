//! Reading controller
//!
//! The state machine that walks a cursor over the sentences of one document,
//! speaking them one utterance at a time. It never blocks and never spawns:
//! whoever owns it forwards engine events to [`ReadingController::handle_engine_event`],
//! scheduler firings to [`ReadingController::handle_timer`] and periodic ticks
//! to [`ReadingController::tick`], then drains the resulting [`ReaderEvent`]s.

use recital_core::traits::{Clock, EngineEvent, EngineEventKind, Scheduler, SpeechEngine};
use recital_core::types::{
    DocumentId, PositionSnapshot, ReaderState, Sentence, TimerToken, UtteranceId, VoiceParams,
    VoiceParamsUpdate,
};
use std::time::{Duration, Instant};

use crate::error::PlaybackError;
use crate::events::ReaderEvent;
use crate::segmenter::{segment, SentenceList};
use crate::sequencer::UtteranceSequencer;
use crate::timing::{format_eta, EstimateInput, TimingEstimator};
use crate::types::{seconds, ControllerSettings, PersistTrigger, ReaderStatus};
use crate::voices::select_default_voice;

/// The single delayed "speak the next sentence" step of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStep {
    token: TimerToken,
    index: usize,
    /// Step waits out a meditation pause (counted as pause time)
    gap: bool,
}

/// Sentence-sequenced reading controller
///
/// Owns the speech engine (through an [`UtteranceSequencer`]), a scheduler
/// for the settle/meditation delays and a clock for timing estimates.
pub struct ReadingController {
    // Playback state
    state: ReaderState,
    document: Option<DocumentId>,
    sentences: SentenceList,
    cursor: usize,
    char_offset: usize,
    spoken_index: Option<usize>,
    saved_index: Option<usize>,

    // Collaborators
    sequencer: UtteranceSequencer,
    scheduler: Box<dyn Scheduler>,
    clock: Box<dyn Clock>,

    // Settings
    voice: VoiceParams,
    preferred_language: Option<String>,
    settle_delay: Duration,
    meditation_enabled: bool,
    meditation_pause: Duration,

    // Sentence chain
    last_token: TimerToken,
    pending_step: Option<PendingStep>,

    // Remaining-time estimate
    timing: TimingEstimator,
    eta_requested: bool,
    eta_label: String,

    engine_unavailable_reported: bool,

    // Event queue for the owner
    pending_events: Vec<ReaderEvent>,
}

impl ReadingController {
    /// Create a controller with no document loaded
    pub fn new(
        engine: Box<dyn SpeechEngine>,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
        settings: ControllerSettings,
    ) -> Self {
        let mut controller = Self {
            state: ReaderState::Idle,
            document: None,
            sentences: SentenceList::default(),
            cursor: 0,
            char_offset: 0,
            spoken_index: None,
            saved_index: None,
            sequencer: UtteranceSequencer::new(engine),
            scheduler,
            clock,
            voice: settings.voice.normalized(),
            preferred_language: settings.preferred_language.clone(),
            settle_delay: settings.settle_delay(),
            meditation_enabled: settings.meditation_enabled,
            meditation_pause: settings.meditation_pause(),
            last_token: TimerToken::new(0),
            pending_step: None,
            timing: TimingEstimator::new(settings.default_chars_per_second),
            eta_requested: false,
            eta_label: String::new(),
            engine_unavailable_reported: false,
            pending_events: Vec::new(),
        };

        if controller.sequencer.is_available() {
            controller.refresh_voices();
        } else {
            controller.report_engine_unavailable();
        }

        controller
    }

    // ===== Document =====

    /// Load plain text, deriving the document identity from its content
    pub fn set_text(&mut self, text: &str) {
        self.open_document(DocumentId::for_text(text), text);
    }

    /// Load a document
    ///
    /// Re-segments from scratch and resets the session (cancel, `Idle`,
    /// cursor 0). Persisted snapshots are left alone.
    pub fn open_document(&mut self, document: DocumentId, text: &str) {
        self.halt();
        self.end_timing();

        let sentences = segment(text);
        tracing::debug!("Opened {} with {} sentences", document, sentences.len());

        let count = sentences.len();
        self.sentences = sentences;
        self.document = Some(document.clone());
        self.char_offset = 0;
        self.spoken_index = None;
        self.saved_index = None;

        self.set_state(ReaderState::Idle);
        self.emit(ReaderEvent::SentencesChanged { document, count });
        self.move_cursor(0);
        self.refresh_eta();
    }

    /// Seed the cursor from a saved snapshot
    ///
    /// Only applies to the current document and only while not speaking. A
    /// snapshot taken at the end of the document starts over at sentence 0; a
    /// larger index is clamped in case the text changed since it was saved.
    /// Returns whether the snapshot was applied.
    pub fn restore(&mut self, snapshot: &PositionSnapshot) -> bool {
        if self.document.as_ref() != Some(&snapshot.document_identity) {
            tracing::debug!(
                "Ignoring snapshot for {} (current document: {:?})",
                snapshot.document_identity,
                self.document.as_ref().map(DocumentId::as_str)
            );
            return false;
        }

        if !matches!(self.state, ReaderState::Idle | ReaderState::Paused) {
            tracing::debug!("Ignoring snapshot while {}", self.state);
            return false;
        }

        let Some(index) = snapshot.clamped_index(self.sentences.len()) else {
            return false;
        };
        // Finished last time: read again from the top
        let index = if snapshot.sentence_index == self.sentences.len() {
            0
        } else {
            index
        };

        tracing::debug!(
            "Restored {} at sentence {} (saved {})",
            snapshot.document_identity,
            index,
            snapshot.sentence_index
        );
        self.saved_index = Some(index);
        self.char_offset = 0;
        self.move_cursor(index);
        self.refresh_eta();
        true
    }

    // ===== Playback Control =====

    /// Start reading at the cursor, or resume a paused session
    ///
    /// Resuming re-speaks the current sentence from its beginning.
    pub fn play(&mut self) {
        if !self.sequencer.is_available() {
            self.report_engine_unavailable();
            return;
        }
        self.engine_unavailable_reported = false;

        if self.sentences.is_empty() {
            tracing::debug!("Play requested with no sentences");
            self.emit_error(PlaybackError::NoSentences);
            return;
        }

        match self.state {
            ReaderState::Idle | ReaderState::Paused => {}
            ReaderState::Speaking | ReaderState::Finished => {
                tracing::trace!("Play ignored while {}", self.state);
                return;
            }
        }

        self.char_offset = 0;
        self.begin_timing();
        self.set_state(ReaderState::Speaking);
        self.speak_current();
        self.refresh_eta();
    }

    /// Pause reading
    pub fn pause(&mut self) {
        if self.state != ReaderState::Speaking {
            return;
        }

        self.halt();
        self.char_offset = 0;
        self.end_timing();
        self.set_state(ReaderState::Paused);
        self.persist(PersistTrigger::Pause);
        self.refresh_eta();
    }

    /// Stop reading, keeping the cursor
    pub fn stop(&mut self) {
        if !matches!(self.state, ReaderState::Speaking | ReaderState::Paused) {
            return;
        }

        self.halt();
        self.char_offset = 0;
        self.end_timing();
        self.set_state(ReaderState::Idle);
        self.persist(PersistTrigger::Stop);
        self.refresh_eta();
    }

    /// Rewind to the first sentence and forget the saved position
    pub fn reset(&mut self) {
        self.halt();
        self.end_timing();
        self.char_offset = 0;
        self.spoken_index = None;
        self.saved_index = None;
        self.move_cursor(0);
        self.set_state(ReaderState::Idle);

        if let Some(document) = self.document.clone() {
            self.emit(ReaderEvent::SnapshotCleared { document });
        }
        self.refresh_eta();
    }

    /// Jump to a sentence (clamped to the document)
    ///
    /// While speaking the new sentence is spoken immediately. A finished
    /// session becomes paused at the target.
    pub fn seek(&mut self, index: usize) {
        if self.sentences.is_empty() {
            return;
        }
        let target = index.min(self.sentences.len() - 1);

        if self.state == ReaderState::Finished {
            self.move_cursor(target);
            self.char_offset = 0;
            self.set_state(ReaderState::Paused);
            self.refresh_eta();
            return;
        }

        self.navigate(target);
    }

    /// Move to the next sentence
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.sentences.is_empty() || self.state == ReaderState::Finished {
            return;
        }

        let target = (self.cursor + 1).min(self.sentences.len() - 1);
        if target != self.cursor {
            self.navigate(target);
        }
    }

    /// Move to the previous sentence
    pub fn previous(&mut self) {
        if self.sentences.is_empty() {
            return;
        }

        if self.state == ReaderState::Finished {
            self.seek(self.sentences.len() - 1);
            return;
        }

        let target = self.cursor.saturating_sub(1);
        if target != self.cursor {
            self.navigate(target);
        }
    }

    /// Persist, cancel everything and go idle
    ///
    /// Call before dropping the controller or switching documents. A finished
    /// session stays finished.
    pub fn close(&mut self) {
        if !self.sentences.is_empty() {
            self.persist(PersistTrigger::Close);
        }

        self.halt();
        self.end_timing();
        self.char_offset = 0;
        if self.state != ReaderState::Finished {
            self.set_state(ReaderState::Idle);
        }
        self.refresh_eta();
    }

    /// Ask for a periodic save while speaking
    pub fn checkpoint(&mut self) {
        if self.state == ReaderState::Speaking {
            self.persist(PersistTrigger::Periodic);
        }
    }

    // ===== Engine & Timer Input =====

    /// Feed an engine lifecycle event
    ///
    /// Events for anything but the active utterance are dropped. Boundary
    /// offsets are character offsets into the sentence.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let Some(accepted) = self.sequencer.accept(event) else {
            return;
        };

        if self.state != ReaderState::Speaking {
            tracing::trace!("Ignoring engine event while {}", self.state);
            return;
        }

        let index = accepted.sentence_index;
        match accepted.kind {
            EngineEventKind::Start => {
                self.spoken_index = Some(index);
                self.char_offset = 0;
                self.emit(ReaderEvent::SentenceStarted { index });
            }
            EngineEventKind::Boundary { char_offset } => {
                let len = self.sentences.get(index).map_or(0, Sentence::char_len);
                self.char_offset = char_offset.min(len);
                self.emit(ReaderEvent::Boundary {
                    index,
                    char_offset: self.char_offset,
                });
            }
            EngineEventKind::End => self.advance(index),
            EngineEventKind::Error { message } => self.fail(PlaybackError::Engine {
                sentence_index: index,
                message,
            }),
        }
    }

    /// Feed a scheduler firing
    ///
    /// Only the token of the pending chain step is honoured.
    pub fn handle_timer(&mut self, token: TimerToken) {
        match self.pending_step {
            Some(step) if step.token == token => {
                self.pending_step = None;
                if step.gap {
                    let now = self.now();
                    self.timing.end_gap(now);
                }

                if self.state == ReaderState::Speaking && self.cursor == step.index {
                    self.speak_current();
                }
            }
            _ => tracing::trace!("Ignoring stale {}", token),
        }
    }

    /// Periodic tick; refreshes the estimate while one is requested
    pub fn tick(&mut self) {
        self.refresh_eta();
    }

    // ===== Settings =====

    /// Apply a partial voice update; takes effect from the next utterance
    pub fn set_voice_params(&mut self, update: VoiceParamsUpdate) {
        let previous = self.voice.voice.clone();
        self.voice.apply(&update);

        if self.voice.voice != previous {
            self.emit(ReaderEvent::VoiceChanged {
                voice: self.voice.voice.clone(),
            });
        }
        self.refresh_eta();
    }

    /// Pick a default voice if none is selected
    ///
    /// Call again when the engine reports its voice list changed.
    pub fn refresh_voices(&mut self) {
        if self.voice.voice.is_some() {
            return;
        }

        let voices = self.sequencer.voices();
        let Some(voice) = select_default_voice(&voices, self.preferred_language.as_deref()) else {
            return;
        };

        tracing::debug!("Selected default voice {} ({})", voice.name, voice.language);
        self.voice.voice = Some(voice.name.clone());
        self.emit(ReaderEvent::VoiceChanged {
            voice: self.voice.voice.clone(),
        });
    }

    /// Enable or disable the pause between sentences
    pub fn set_meditation_mode(&mut self, enabled: bool) {
        if self.meditation_enabled != enabled {
            tracing::debug!("Meditation mode {}", if enabled { "on" } else { "off" });
            self.meditation_enabled = enabled;
            self.refresh_eta();
        }
    }

    /// Set the pause between sentences; negative or non-finite values become zero
    pub fn set_meditation_pause_seconds(&mut self, secs: f64) {
        self.meditation_pause = seconds(secs);
        self.refresh_eta();
    }

    /// Start or stop pushing `EtaUpdated` events
    ///
    /// Switching off also clears the label.
    pub fn set_eta_requested(&mut self, requested: bool) {
        self.eta_requested = requested;
        self.eta_label.clear();
        if requested {
            self.refresh_eta();
        }
    }

    // ===== State Queries =====

    /// Current state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Current document
    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    /// Sentences of the current document
    pub fn sentences(&self) -> &SentenceList {
        &self.sentences
    }

    /// Number of sentences
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Cursor (equals the sentence count when finished)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Sentence under the cursor
    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.sentences.get(self.cursor)
    }

    /// Character offset of the last boundary in the current sentence
    pub fn char_offset(&self) -> usize {
        self.char_offset
    }

    /// Sentence the engine last reported as started
    pub fn spoken_index(&self) -> Option<usize> {
        self.spoken_index
    }

    /// Sentence restored from a snapshot
    pub fn saved_index(&self) -> Option<usize> {
        self.saved_index
    }

    /// Current voice parameters
    pub fn voice_params(&self) -> &VoiceParams {
        &self.voice
    }

    /// Whether meditation pauses are enabled
    pub fn meditation_enabled(&self) -> bool {
        self.meditation_enabled
    }

    /// Length of the meditation pause
    pub fn meditation_pause(&self) -> Duration {
        self.meditation_pause
    }

    /// Whether `EtaUpdated` events are being pushed
    pub fn is_eta_requested(&self) -> bool {
        self.eta_requested
    }

    /// Last pushed estimate label
    pub fn eta_label(&self) -> &str {
        &self.eta_label
    }

    /// Estimate the time left from the cursor to the end
    pub fn estimate_remaining(&self) -> Duration {
        self.timing.estimate(EstimateInput {
            sentences: &self.sentences,
            cursor: self.cursor,
            rate: self.voice.rate,
            meditation_pause: self.meditation_enabled.then_some(self.meditation_pause),
            now: self.now(),
        })
    }

    /// The utterance the engine is working on
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.sequencer.active()
    }

    /// How long the active utterance has been outstanding
    ///
    /// The engine's terminal event has no timeout; callers can use this to
    /// notice an engine that went silent.
    pub fn utterance_age(&self) -> Option<Duration> {
        let now = self.now();
        self.sequencer
            .active_since()
            .map(|issued| now.saturating_duration_since(issued))
    }

    /// Whether a delayed step to the next sentence is pending
    pub fn has_pending_step(&self) -> bool {
        self.pending_step.is_some()
    }

    /// Position snapshot for the current document
    pub fn snapshot(&self) -> Option<PositionSnapshot> {
        self.document
            .clone()
            .map(|document| PositionSnapshot::new(document, self.cursor, self.char_offset))
    }

    /// Every observable at once
    pub fn status(&self) -> ReaderStatus {
        ReaderStatus {
            document: self.document.clone(),
            state: self.state,
            cursor: self.cursor,
            sentence_count: self.sentences.len(),
            spoken_index: self.spoken_index,
            saved_index: self.saved_index,
            char_offset: self.char_offset,
            eta_label: self.eta_label.clone(),
            voice: self.voice.clone(),
            meditation_enabled: self.meditation_enabled,
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events emitted since the last drain. The owner should call
    /// this after every command or input it forwards.
    pub fn drain_events(&mut self) -> Vec<ReaderEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Chain =====

    fn navigate(&mut self, target: usize) {
        if self.state == ReaderState::Speaking {
            self.end_timing();
            self.move_cursor(target);
            self.char_offset = 0;
            self.begin_timing();
            self.speak_current();
        } else {
            self.move_cursor(target);
            self.char_offset = 0;
        }
        self.refresh_eta();
    }

    fn speak_current(&mut self) {
        self.cancel_pending_step();

        let now = self.now();
        let index = self.cursor;
        let Some(sentence) = self.sentences.get(index) else {
            tracing::warn!("Cursor {} is past the last sentence", index);
            self.set_state(ReaderState::Idle);
            return;
        };

        if let Err(error) = self.sequencer.speak(index, sentence, &self.voice, now) {
            self.fail(error);
        }
    }

    fn advance(&mut self, finished: usize) {
        self.char_offset = 0;
        let next = finished + 1;

        if next < self.sentences.len() {
            self.move_cursor(next);
            self.persist(PersistTrigger::Advance);
            self.schedule_step(next);
        } else {
            tracing::debug!("Finished reading after sentence {}", finished);
            self.move_cursor(self.sentences.len());
            self.end_timing();
            self.set_state(ReaderState::Finished);
            self.persist(PersistTrigger::Finish);
        }
        self.refresh_eta();
    }

    fn schedule_step(&mut self, index: usize) {
        let gap = self.meditation_enabled && !self.meditation_pause.is_zero();
        let delay = if gap {
            self.meditation_pause.max(self.settle_delay)
        } else {
            self.settle_delay
        };

        let token = self.last_token.next();
        self.last_token = token;

        if gap {
            let now = self.now();
            self.timing.begin_gap(now);
        }

        tracing::trace!("Sentence {} in {:?} ({})", index, delay, token);
        self.pending_step = Some(PendingStep { token, index, gap });
        self.scheduler.schedule(delay, token);
    }

    fn cancel_pending_step(&mut self) {
        if let Some(step) = self.pending_step.take() {
            tracing::trace!("Cancelling {}", step.token);
            self.scheduler.cancel(step.token);
            if step.gap {
                let now = self.now();
                self.timing.end_gap(now);
            }
        }
    }

    /// Cancel the pending step and the in-flight utterance
    fn halt(&mut self) {
        self.cancel_pending_step();
        self.sequencer.cancel();
    }

    fn fail(&mut self, error: PlaybackError) {
        tracing::warn!("Reading stopped: {}", error);
        self.halt();
        self.char_offset = 0;
        self.end_timing();
        self.set_state(ReaderState::Idle);
        self.emit_error(error);
        self.refresh_eta();
    }

    fn report_engine_unavailable(&mut self) {
        if !self.engine_unavailable_reported {
            tracing::warn!("No speech engine available");
            self.engine_unavailable_reported = true;
            self.emit_error(PlaybackError::EngineUnavailable);
        }
    }

    // ===== Helpers =====

    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn begin_timing(&mut self) {
        let now = self.now();
        self.timing
            .begin_session(now, self.sentences.chars_before(self.cursor));
    }

    fn end_timing(&mut self) {
        let now = self.now();
        self.timing
            .end_session(now, self.sentences.chars_before(self.cursor));
    }

    fn refresh_eta(&mut self) {
        if !self.eta_requested {
            return;
        }

        let remaining = self.estimate_remaining();
        let label = format_eta(remaining);
        if label != self.eta_label {
            self.eta_label.clone_from(&label);
            self.emit(ReaderEvent::EtaUpdated {
                label,
                remaining_ms: remaining.as_millis() as u64,
            });
        }
    }

    fn persist(&mut self, trigger: PersistTrigger) {
        if let Some(snapshot) = self.snapshot() {
            tracing::debug!(
                "Persist requested ({}) at sentence {}",
                trigger.as_str(),
                snapshot.sentence_index
            );
            self.emit(ReaderEvent::PersistRequested { trigger, snapshot });
        }
    }

    fn set_state(&mut self, state: ReaderState) {
        if self.state != state {
            let previous = std::mem::replace(&mut self.state, state);
            tracing::debug!("Reader {} -> {}", previous, state);
            self.emit(ReaderEvent::StateChanged { state, previous });
        }
    }

    fn move_cursor(&mut self, index: usize) {
        if self.cursor != index {
            let previous = std::mem::replace(&mut self.cursor, index);
            self.emit(ReaderEvent::CursorChanged { index, previous });
        }
    }

    fn emit(&mut self, event: ReaderEvent) {
        self.pending_events.push(event);
    }

    fn emit_error(&mut self, error: PlaybackError) {
        self.emit(ReaderEvent::Error { error });
    }
}

impl std::fmt::Debug for ReadingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingController")
            .field("state", &self.state)
            .field("document", &self.document)
            .field("cursor", &self.cursor)
            .field("sentences", &self.sentences.len())
            .field("sequencer", &self.sequencer)
            .field("pending_step", &self.pending_step)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, ManualScheduler, RecordingEngine};
    use recital_core::types::VoiceInfo;

    struct Rig {
        engine: RecordingEngine,
        scheduler: ManualScheduler,
        clock: ManualClock,
        reader: ReadingController,
    }

    fn create_test_rig(settings: ControllerSettings) -> Rig {
        let engine = RecordingEngine::new();
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let reader = ReadingController::new(
            Box::new(engine.clone()),
            Box::new(scheduler.clone()),
            Box::new(clock.clone()),
            settings,
        );
        Rig {
            engine,
            scheduler,
            clock,
            reader,
        }
    }

    fn finish_current(rig: &mut Rig) {
        let id = rig.reader.active_utterance().unwrap();
        rig.reader
            .handle_engine_event(EngineEvent::new(id, EngineEventKind::End));
    }

    fn fire_due(rig: &mut Rig) {
        for token in rig.scheduler.take_due() {
            rig.reader.handle_timer(token);
        }
    }

    #[test]
    fn new_controller_is_idle() {
        let rig = create_test_rig(ControllerSettings::default());
        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert_eq!(rig.reader.cursor(), 0);
        assert_eq!(rig.reader.sentence_count(), 0);
        assert!(rig.reader.document().is_none());
    }

    #[test]
    fn play_without_sentences_reports_and_stays_idle() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("   ");
        rig.reader.drain_events();

        rig.reader.play();
        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert_eq!(
            rig.reader.drain_events(),
            [ReaderEvent::Error {
                error: PlaybackError::NoSentences
            }]
        );
        assert_eq!(rig.engine.speak_count(), 0);
    }

    #[test]
    fn unavailable_engine_is_reported_once() {
        let engine = RecordingEngine::new();
        engine.set_available(false);
        let clock = ManualClock::new();
        let mut reader = ReadingController::new(
            Box::new(engine.clone()),
            Box::new(ManualScheduler::new(clock.clone())),
            Box::new(clock),
            ControllerSettings::default(),
        );
        reader.set_text("Hello.");
        reader.play();
        reader.play();

        let errors = reader
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ReaderEvent::Error { .. }))
            .count();
        assert_eq!(errors, 1);
        assert_eq!(reader.state(), ReaderState::Idle);

        // Capability appears
        engine.set_available(true);
        reader.play();
        assert_eq!(reader.state(), ReaderState::Speaking);
    }

    #[test]
    fn end_advances_after_settle_delay() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two.");
        rig.reader.play();
        finish_current(&mut rig);

        assert_eq!(rig.reader.cursor(), 1);
        assert_eq!(rig.reader.state(), ReaderState::Speaking);
        assert_eq!(rig.engine.speak_count(), 1);
        assert_eq!(rig.scheduler.pending()[0].1, Duration::from_millis(250));

        rig.clock.advance(Duration::from_millis(250));
        fire_due(&mut rig);
        assert_eq!(rig.engine.spoken_texts(), ["One.", "Two."]);
    }

    #[test]
    fn advance_requests_persistence() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two.");
        rig.reader.play();
        rig.reader.drain_events();
        finish_current(&mut rig);

        let events = rig.reader.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            ReaderEvent::PersistRequested {
                trigger: PersistTrigger::Advance,
                snapshot
            } if snapshot.sentence_index == 1
        )));
    }

    #[test]
    fn engine_error_stops_chain() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two.");
        rig.reader.play();
        rig.reader.drain_events();

        let id = rig.reader.active_utterance().unwrap();
        rig.reader.handle_engine_event(EngineEvent::new(
            id,
            EngineEventKind::Error {
                message: "interrupted".into(),
            },
        ));

        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert_eq!(rig.reader.cursor(), 0);
        assert!(rig.scheduler.pending().is_empty());
        let events = rig.reader.drain_events();
        assert!(events.contains(&ReaderEvent::Error {
            error: PlaybackError::Engine {
                sentence_index: 0,
                message: "interrupted".into()
            }
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ReaderEvent::PersistRequested { .. })));
    }

    #[test]
    fn synchronous_speak_failure_goes_idle() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One.");
        rig.engine.fail_next_speak("busy");
        rig.reader.play();

        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert!(rig.reader.active_utterance().is_none());
    }

    #[test]
    fn boundary_updates_char_offset() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("Hello world. Bye.");
        rig.reader.play();
        let id = rig.reader.active_utterance().unwrap();

        rig.reader
            .handle_engine_event(EngineEvent::new(id, EngineEventKind::Start));
        rig.reader.handle_engine_event(EngineEvent::new(
            id,
            EngineEventKind::Boundary { char_offset: 6 },
        ));
        assert_eq!(rig.reader.spoken_index(), Some(0));
        assert_eq!(rig.reader.char_offset(), 6);

        // Offsets past the sentence are clamped
        rig.reader.handle_engine_event(EngineEvent::new(
            id,
            EngineEventKind::Boundary { char_offset: 500 },
        ));
        assert_eq!(rig.reader.char_offset(), 13);
    }

    #[test]
    fn stop_keeps_cursor() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two. Three.");
        rig.reader.seek(1);
        rig.reader.play();
        rig.reader.stop();

        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert_eq!(rig.reader.cursor(), 1);
        assert!(rig.reader.active_utterance().is_none());
    }

    #[test]
    fn reset_clears_snapshot_and_cursor() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two.");
        rig.reader.seek(1);
        rig.reader.drain_events();

        rig.reader.reset();
        assert_eq!(rig.reader.cursor(), 0);
        assert!(rig
            .reader
            .drain_events()
            .contains(&ReaderEvent::SnapshotCleared {
                document: DocumentId::new("doc")
            }));
    }

    #[test]
    fn seek_from_finished_pauses() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One.");
        rig.reader.play();
        finish_current(&mut rig);
        assert_eq!(rig.reader.state(), ReaderState::Finished);

        rig.reader.play();
        assert_eq!(rig.reader.state(), ReaderState::Finished);

        rig.reader.seek(10);
        assert_eq!(rig.reader.state(), ReaderState::Paused);
        assert_eq!(rig.reader.cursor(), 0);
    }

    #[test]
    fn previous_from_finished_lands_on_last_sentence() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two.");
        rig.reader.seek(1);
        rig.reader.play();
        finish_current(&mut rig);
        assert_eq!(rig.reader.cursor(), 2);

        rig.reader.next();
        assert_eq!(rig.reader.cursor(), 2);

        rig.reader.previous();
        assert_eq!(rig.reader.state(), ReaderState::Paused);
        assert_eq!(rig.reader.cursor(), 1);
    }

    #[test]
    fn next_while_speaking_speaks_immediately() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two. Three.");
        rig.reader.play();
        let first = rig.reader.active_utterance().unwrap();

        rig.reader.next();
        assert_eq!(rig.reader.cursor(), 1);
        assert_eq!(rig.engine.spoken_texts(), ["One.", "Two."]);

        // The superseded utterance's end is ignored
        rig.reader
            .handle_engine_event(EngineEvent::new(first, EngineEventKind::End));
        assert_eq!(rig.reader.cursor(), 1);
        assert!(rig.scheduler.pending().is_empty());
    }

    #[test]
    fn clamped_move_is_a_no_op() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two.");
        rig.reader.play();

        rig.reader.previous();
        assert_eq!(rig.engine.speak_count(), 1);

        rig.reader.next();
        rig.reader.next();
        assert_eq!(rig.reader.cursor(), 1);
        assert_eq!(rig.engine.speak_count(), 2);
    }

    #[test]
    fn navigation_while_paused_only_moves_cursor() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two. Three.");
        rig.reader.play();
        rig.reader.pause();

        rig.reader.next();
        rig.reader.next();
        assert_eq!(rig.reader.cursor(), 2);
        assert_eq!(rig.reader.state(), ReaderState::Paused);
        assert_eq!(rig.engine.speak_count(), 1);
    }

    #[test]
    fn restore_applies_to_current_document_only() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two. Three.");

        let other = PositionSnapshot::new(DocumentId::new("other"), 2, 0);
        assert!(!rig.reader.restore(&other));
        assert_eq!(rig.reader.cursor(), 0);

        let stale = PositionSnapshot::new(DocumentId::new("doc"), 40, 3);
        assert!(rig.reader.restore(&stale));
        assert_eq!(rig.reader.cursor(), 2);
        assert_eq!(rig.reader.saved_index(), Some(2));

        rig.reader.play();
        assert_eq!(rig.engine.spoken_texts(), ["Three."]);
        assert!(!rig.reader.restore(&other));
    }

    #[test]
    fn restore_after_finish_starts_over() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two. Three.");
        rig.reader.seek(1);

        let finished = PositionSnapshot::new(DocumentId::new("doc"), 3, 0);
        assert!(rig.reader.restore(&finished));
        assert_eq!(rig.reader.cursor(), 0);
        assert_eq!(rig.reader.saved_index(), Some(0));

        // One past the end of a shorter text is still a clamp
        let changed = PositionSnapshot::new(DocumentId::new("doc"), 4, 0);
        assert!(rig.reader.restore(&changed));
        assert_eq!(rig.reader.cursor(), 2);
    }

    #[test]
    fn close_persists_and_goes_idle() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two.");
        rig.reader.play();
        rig.reader.drain_events();

        rig.reader.close();
        assert_eq!(rig.reader.state(), ReaderState::Idle);
        assert!(rig.reader.drain_events().iter().any(|e| matches!(
            e,
            ReaderEvent::PersistRequested {
                trigger: PersistTrigger::Close,
                ..
            }
        )));
    }

    #[test]
    fn checkpoint_only_while_speaking() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two.");
        rig.reader.drain_events();

        rig.reader.checkpoint();
        assert!(!rig.reader.has_pending_events());

        rig.reader.play();
        rig.reader.drain_events();
        rig.reader.checkpoint();
        assert!(matches!(
            rig.reader.drain_events().as_slice(),
            [ReaderEvent::PersistRequested {
                trigger: PersistTrigger::Periodic,
                ..
            }]
        ));
    }

    #[test]
    fn voice_changes_apply_to_next_utterance() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One. Two.");
        rig.reader.play();
        rig.reader.set_voice_params(VoiceParamsUpdate {
            rate: Some(1.5),
            ..VoiceParamsUpdate::default()
        });
        assert_eq!(rig.engine.last_spoken().unwrap().rate, 1.0);

        rig.reader.next();
        assert_eq!(rig.engine.last_spoken().unwrap().rate, 1.5);
    }

    #[test]
    fn default_voice_follows_preferred_language() {
        let engine = RecordingEngine::new().with_voices(vec![
            VoiceInfo::new("Daniel", "en-GB"),
            VoiceInfo::new("Luciana", "pt-BR"),
        ]);
        let clock = ManualClock::new();
        let mut reader = ReadingController::new(
            Box::new(engine),
            Box::new(ManualScheduler::new(clock.clone())),
            Box::new(clock),
            ControllerSettings {
                preferred_language: Some("pt".into()),
                ..ControllerSettings::default()
            },
        );

        assert_eq!(reader.voice_params().voice.as_deref(), Some("Luciana"));
        assert_eq!(
            reader.drain_events(),
            [ReaderEvent::VoiceChanged {
                voice: Some("Luciana".into())
            }]
        );
    }

    #[test]
    fn eta_is_pushed_only_while_requested() {
        let mut rig = create_test_rig(ControllerSettings::default());
        // 30 chars at 15 cps
        rig.reader.set_text("Fourteen chars. Fifteen chars.");
        rig.reader.drain_events();

        rig.reader.tick();
        assert!(!rig.reader.has_pending_events());

        rig.reader.set_eta_requested(true);
        assert_eq!(
            rig.reader.drain_events(),
            [ReaderEvent::EtaUpdated {
                label: "0:02".into(),
                remaining_ms: 2000
            }]
        );
        assert_eq!(rig.reader.eta_label(), "0:02");

        // Unchanged label is not pushed again
        rig.reader.tick();
        assert!(!rig.reader.has_pending_events());

        rig.reader.set_meditation_pause_seconds(60.0);
        rig.reader.set_meditation_mode(true);
        assert_eq!(rig.reader.eta_label(), "2:02");

        rig.reader.set_eta_requested(false);
        assert_eq!(rig.reader.eta_label(), "");
        assert_eq!(rig.reader.status().eta_label, "");
        rig.reader.drain_events();
        rig.reader.tick();
        assert!(!rig.reader.has_pending_events());
    }

    #[test]
    fn utterance_age_tracks_clock() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.set_text("One.");
        assert!(rig.reader.utterance_age().is_none());

        rig.reader.play();
        rig.clock.advance(Duration::from_secs(3));
        assert_eq!(rig.reader.utterance_age(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn status_reflects_observables() {
        let mut rig = create_test_rig(ControllerSettings::default());
        rig.reader.open_document(DocumentId::new("doc"), "One. Two.");
        rig.reader.seek(1);

        let status = rig.reader.status();
        assert_eq!(status.document, Some(DocumentId::new("doc")));
        assert_eq!(status.cursor, 1);
        assert_eq!(status.sentence_count, 2);
        assert_eq!(status.state, ReaderState::Idle);
    }
}
