//! End-to-end reading scenarios
//!
//! Drives a controller with the deterministic engine, scheduler and clock the
//! way a real owner would: commands, then engine events, then timer firings.

use recital_core::{DocumentId, EngineEvent, EngineEventKind, ReaderState};
use recital_playback::testing::{ManualClock, ManualScheduler, RecordingEngine};
use recital_playback::{ControllerSettings, PersistTrigger, ReaderEvent, ReadingController};
use std::time::Duration;

// ===== Test Helpers =====

struct Rig {
    engine: RecordingEngine,
    scheduler: ManualScheduler,
    clock: ManualClock,
    reader: ReadingController,
}

impl Rig {
    fn new(settings: ControllerSettings) -> Self {
        let engine = RecordingEngine::new();
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let reader = ReadingController::new(
            Box::new(engine.clone()),
            Box::new(scheduler.clone()),
            Box::new(clock.clone()),
            settings,
        );
        Self {
            engine,
            scheduler,
            clock,
            reader,
        }
    }

    fn engine_event(&mut self, kind: EngineEventKind) {
        let id = self
            .reader
            .active_utterance()
            .expect("an utterance should be in flight");
        self.reader.handle_engine_event(EngineEvent::new(id, kind));
    }

    /// Start, then end, the in-flight utterance
    fn speak_through(&mut self) {
        self.engine_event(EngineEventKind::Start);
        self.engine_event(EngineEventKind::End);
    }

    fn advance_clock(&mut self, by: Duration) {
        self.clock.advance(by);
        for token in self.scheduler.take_due() {
            self.reader.handle_timer(token);
        }
    }

    fn states(&mut self) -> Vec<ReaderState> {
        self.reader
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                ReaderEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }
}

fn meditation(secs: f64) -> ControllerSettings {
    ControllerSettings {
        meditation_enabled: true,
        meditation_pause_secs: secs,
        ..ControllerSettings::default()
    }
}

// ===== Scenarios =====

#[test]
fn pause_mid_sentence_then_resume_respeaks_whole_sentence() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.set_text("Hello world. How are you? I am fine!");
    rig.reader.drain_events();

    rig.reader.play();
    rig.engine_event(EngineEventKind::Start);
    rig.engine_event(EngineEventKind::Boundary { char_offset: 6 });
    assert_eq!(rig.reader.char_offset(), 6);

    rig.reader.pause();
    assert_eq!(rig.reader.char_offset(), 0);
    rig.reader.play();

    assert_eq!(rig.engine.spoken_texts(), ["Hello world.", "Hello world."]);
    assert_eq!(
        rig.states(),
        [
            ReaderState::Speaking,
            ReaderState::Paused,
            ReaderState::Speaking
        ]
    );
}

#[test]
fn two_sentences_play_to_completion() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.open_document(DocumentId::new("doc"), "First one. Second one.");
    rig.reader.drain_events();

    rig.reader.play();
    rig.speak_through();
    rig.advance_clock(Duration::from_millis(250));
    rig.speak_through();

    assert_eq!(rig.reader.state(), ReaderState::Finished);
    assert_eq!(rig.reader.cursor(), 2);
    assert!(rig.reader.active_utterance().is_none());

    let events = rig.reader.drain_events();
    let triggers: Vec<PersistTrigger> = events
        .iter()
        .filter_map(|event| match event {
            ReaderEvent::PersistRequested { trigger, .. } => Some(*trigger),
            _ => None,
        })
        .collect();
    assert_eq!(triggers, [PersistTrigger::Advance, PersistTrigger::Finish]);

    let started: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            ReaderEvent::SentenceStarted { index } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(started, [0, 1]);
}

#[test]
fn meditation_pause_delays_next_sentence() {
    let mut rig = Rig::new(meditation(2.0));
    rig.reader.set_text("Breathe in. Breathe out.");

    rig.reader.play();
    rig.speak_through();
    assert_eq!(rig.scheduler.pending()[0].1, Duration::from_secs(2));

    rig.advance_clock(Duration::from_millis(1999));
    assert_eq!(rig.engine.speak_count(), 1);

    rig.advance_clock(Duration::from_millis(1));
    assert_eq!(rig.engine.spoken_texts(), ["Breathe in.", "Breathe out."]);
}

#[test]
fn stop_during_meditation_cancels_pending_advance() {
    let mut rig = Rig::new(meditation(2.0));
    rig.reader.set_text("Breathe in. Breathe out.");

    rig.reader.play();
    rig.speak_through();
    let (token, _) = rig.scheduler.pending()[0];

    rig.reader.stop();
    assert_eq!(rig.scheduler.cancelled(), [token]);
    assert!(rig.scheduler.pending().is_empty());

    // A late firing of the cancelled timer is ignored
    rig.clock.advance(Duration::from_secs(5));
    rig.reader.handle_timer(token);
    assert_eq!(rig.engine.speak_count(), 1);
    assert_eq!(rig.reader.state(), ReaderState::Idle);
    assert_eq!(rig.reader.cursor(), 1);
}

#[test]
fn seek_during_meditation_speaks_target_immediately() {
    let mut rig = Rig::new(meditation(2.0));
    rig.reader.set_text("One. Two. Three. Four.");

    rig.reader.play();
    rig.speak_through();
    assert!(rig.reader.has_pending_step());

    rig.reader.seek(3);
    assert!(!rig.reader.has_pending_step());
    assert_eq!(rig.engine.spoken_texts(), ["One.", "Four."]);

    rig.advance_clock(Duration::from_secs(10));
    assert_eq!(rig.engine.speak_count(), 2);
}

#[test]
fn pause_during_settle_delay_resumes_at_next_sentence() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.set_text("One. Two.");

    rig.reader.play();
    rig.speak_through();
    rig.reader.pause();
    rig.advance_clock(Duration::from_secs(1));
    assert_eq!(rig.engine.speak_count(), 1);

    rig.reader.play();
    assert_eq!(rig.engine.spoken_texts(), ["One.", "Two."]);
}

#[test]
fn short_meditation_never_undercuts_settle_delay() {
    let mut rig = Rig::new(ControllerSettings {
        settle_delay_ms: 500,
        ..meditation(0.1)
    });
    rig.reader.set_text("One. Two.");

    rig.reader.play();
    rig.speak_through();
    assert_eq!(rig.scheduler.pending()[0].1, Duration::from_millis(500));
}

#[test]
fn stale_end_after_rapid_navigation_is_ignored() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.set_text("A. B. C. D.");
    rig.reader.play();

    let mut superseded = Vec::new();
    for _ in 0..3 {
        superseded.push(rig.reader.active_utterance().unwrap());
        rig.reader.next();
    }

    for id in superseded {
        rig.reader
            .handle_engine_event(EngineEvent::new(id, EngineEventKind::End));
    }

    assert_eq!(rig.reader.cursor(), 3);
    assert_eq!(rig.reader.state(), ReaderState::Speaking);
    assert!(!rig.reader.has_pending_step());
    assert_eq!(rig.engine.spoken_texts(), ["A.", "B.", "C.", "D."]);
}

#[test]
fn restart_after_finish_via_reset() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.open_document(DocumentId::new("doc"), "Only one.");
    rig.reader.play();
    rig.speak_through();
    assert_eq!(rig.reader.state(), ReaderState::Finished);

    rig.reader.reset();
    rig.reader.play();
    assert_eq!(rig.reader.state(), ReaderState::Speaking);
    assert_eq!(rig.engine.spoken_texts(), ["Only one.", "Only one."]);
}

#[test]
fn opening_new_document_cancels_session() {
    let mut rig = Rig::new(ControllerSettings::default());
    rig.reader.set_text("One. Two.");
    rig.reader.play();
    let cancels = rig.engine.cancel_count();

    rig.reader.set_text("Something else entirely.");
    assert_eq!(rig.reader.state(), ReaderState::Idle);
    assert_eq!(rig.reader.cursor(), 0);
    assert_eq!(rig.reader.sentence_count(), 1);
    assert!(rig.engine.cancel_count() > cancels);
    assert!(rig.reader.active_utterance().is_none());
}

#[test]
fn measured_throughput_drives_eta() {
    let mut rig = Rig::new(ControllerSettings::default());
    // 43 chars: three sentences of 11 and one of 10
    rig.reader.set_text("Sentence1. Sentence2. Sentence3. Sentence4.");
    rig.reader.set_eta_requested(true);
    assert_eq!(rig.reader.eta_label(), "0:03");

    rig.reader.play();
    rig.clock.advance(Duration::from_secs(2));
    rig.speak_through();

    // 11 chars in 2s, 32 chars left
    assert_eq!(rig.reader.eta_label(), "0:06");
}
