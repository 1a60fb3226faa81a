//! Deterministic collaborators for driving a controller in tests
//!
//! Each double is a cheap `Clone` handle over shared state, so a test can keep
//! one handle for inspection while the controller owns the other.

use recital_core::error::{RecitalError, Result};
use recital_core::traits::{Clock, Scheduler, SpeechEngine};
use recital_core::types::{TimerToken, Utterance, VoiceInfo};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ===== Engine =====

#[derive(Debug)]
struct EngineLog {
    spoken: Vec<Utterance>,
    cancels: usize,
    available: bool,
    honors_voice_selection: bool,
    voices: Vec<VoiceInfo>,
    fail_next: Option<String>,
}

/// Speech engine that records every request and never produces sound
///
/// Engine events are not generated; the test delivers them to the controller.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    /// Available engine with no voices
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(EngineLog {
                spoken: Vec::new(),
                cancels: 0,
                available: true,
                honors_voice_selection: true,
                voices: Vec::new(),
                fail_next: None,
            })),
        }
    }

    /// Offer these voices
    #[must_use]
    pub fn with_voices(self, voices: Vec<VoiceInfo>) -> Self {
        self.set_voices(voices);
        self
    }

    /// Behave like an engine that ignores voice objects
    #[must_use]
    pub fn ignoring_voice_selection(self) -> Self {
        lock(&self.log).honors_voice_selection = false;
        self
    }

    /// Replace the voice list
    pub fn set_voices(&self, voices: Vec<VoiceInfo>) {
        lock(&self.log).voices = voices;
    }

    /// Toggle synthesis capability
    pub fn set_available(&self, available: bool) {
        lock(&self.log).available = available;
    }

    /// Refuse the next `speak` with this message
    pub fn fail_next_speak(&self, message: &str) {
        lock(&self.log).fail_next = Some(message.to_string());
    }

    /// Every utterance accepted so far
    pub fn spoken(&self) -> Vec<Utterance> {
        lock(&self.log).spoken.clone()
    }

    /// Text of every utterance accepted so far
    pub fn spoken_texts(&self) -> Vec<String> {
        lock(&self.log).spoken.iter().map(|u| u.text.clone()).collect()
    }

    /// The most recent utterance
    pub fn last_spoken(&self) -> Option<Utterance> {
        lock(&self.log).spoken.last().cloned()
    }

    /// Number of accepted utterances
    pub fn speak_count(&self) -> usize {
        lock(&self.log).spoken.len()
    }

    /// Number of `cancel` calls
    pub fn cancel_count(&self) -> usize {
        lock(&self.log).cancels
    }
}

impl SpeechEngine for RecordingEngine {
    fn is_available(&self) -> bool {
        lock(&self.log).available
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        lock(&self.log).voices.clone()
    }

    fn honors_voice_selection(&self) -> bool {
        lock(&self.log).honors_voice_selection
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        let mut log = lock(&self.log);
        if let Some(message) = log.fail_next.take() {
            return Err(RecitalError::engine(message));
        }
        log.spoken.push(utterance);
        Ok(())
    }

    fn cancel(&mut self) {
        lock(&self.log).cancels += 1;
    }
}

// ===== Clock =====

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }
}

// ===== Scheduler =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTimer {
    token: TimerToken,
    delay: Duration,
    due_at: Instant,
}

#[derive(Debug, Default)]
struct SchedulerLog {
    pending: Vec<ScheduledTimer>,
    cancelled: Vec<TimerToken>,
    scheduled: usize,
}

/// Scheduler that records timers against a [`ManualClock`]
///
/// Nothing fires on its own. Advance the clock, then hand the tokens from
/// [`ManualScheduler::take_due`] to the controller's `handle_timer`.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    log: Arc<Mutex<SchedulerLog>>,
}

impl ManualScheduler {
    /// Scheduler reading time from `clock`
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            log: Arc::new(Mutex::new(SchedulerLog::default())),
        }
    }

    /// Pending timers with their requested delays, in scheduling order
    pub fn pending(&self) -> Vec<(TimerToken, Duration)> {
        lock(&self.log)
            .pending
            .iter()
            .map(|timer| (timer.token, timer.delay))
            .collect()
    }

    /// Remove and return the timers that are due, earliest first
    pub fn take_due(&self) -> Vec<TimerToken> {
        let now = self.clock.now();
        let mut log = lock(&self.log);

        let (mut due, pending): (Vec<_>, Vec<_>) =
            log.pending.drain(..).partition(|timer| timer.due_at <= now);
        log.pending = pending;

        due.sort_by_key(|timer| timer.due_at);
        due.into_iter().map(|timer| timer.token).collect()
    }

    /// Tokens cancelled so far
    pub fn cancelled(&self) -> Vec<TimerToken> {
        lock(&self.log).cancelled.clone()
    }

    /// Number of `schedule` calls
    pub fn scheduled_count(&self) -> usize {
        lock(&self.log).scheduled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        let due_at = self.clock.now() + delay;
        let mut log = lock(&self.log);
        log.scheduled += 1;
        log.pending.push(ScheduledTimer {
            token,
            delay,
            due_at,
        });
    }

    fn cancel(&mut self, token: TimerToken) {
        let mut log = lock(&self.log);
        log.pending.retain(|timer| timer.token != token);
        log.cancelled.push(token);
    }
}
