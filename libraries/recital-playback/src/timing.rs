//! Remaining-time estimation
//!
//! Throughput is measured per play session as characters read divided by the
//! wall time spent speaking (meditation gaps excluded), then scaled by the
//! rate multiplier and applied to the characters left.

use std::time::{Duration, Instant};

use crate::segmenter::SentenceList;

/// Throughput assumed before anything has been measured
pub const DEFAULT_CHARS_PER_SECOND: f64 = 15.0;

/// One play session's measurement window
#[derive(Debug, Clone, Copy)]
struct TimingSession {
    started_at: Instant,
    /// Characters before the cursor when the session began
    chars_at_start: usize,
    /// Completed meditation gaps
    gap_time: Duration,
    /// Gap in progress
    gap_started: Option<Instant>,
}

impl TimingSession {
    fn gap_time(&self, now: Instant) -> Duration {
        self.gap_time
            + self
                .gap_started
                .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }
}

/// Inputs for a single estimate
#[derive(Debug, Clone, Copy)]
pub struct EstimateInput<'a> {
    /// Sentences of the document
    pub sentences: &'a SentenceList,
    /// Current cursor
    pub cursor: usize,
    /// Speech rate multiplier
    pub rate: f32,
    /// Meditation pause per remaining sentence, if meditation is on
    pub meditation_pause: Option<Duration>,
    /// Current instant
    pub now: Instant,
}

/// Estimates how long the rest of a document takes to read
#[derive(Debug, Clone)]
pub struct TimingEstimator {
    default_chars_per_second: f64,
    session: Option<TimingSession>,
    last_throughput: Option<f64>,
}

impl Default for TimingEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_SECOND)
    }
}

impl TimingEstimator {
    /// Create an estimator with the given fallback throughput
    pub fn new(default_chars_per_second: f64) -> Self {
        let default_chars_per_second =
            if default_chars_per_second.is_finite() && default_chars_per_second > 0.0 {
                default_chars_per_second
            } else {
                DEFAULT_CHARS_PER_SECOND
            };

        Self {
            default_chars_per_second,
            session: None,
            last_throughput: None,
        }
    }

    /// Start measuring from `chars_at_start` characters into the document
    ///
    /// Replaces any running session.
    pub fn begin_session(&mut self, now: Instant, chars_at_start: usize) {
        self.session = Some(TimingSession {
            started_at: now,
            chars_at_start,
            gap_time: Duration::ZERO,
            gap_started: None,
        });
    }

    /// Stop measuring, keeping the session's throughput for later estimates
    pub fn end_session(&mut self, now: Instant, chars_read: usize) {
        if let Some(session) = self.session.take() {
            if let Some(throughput) = Self::measure(&session, now, chars_read) {
                self.last_throughput = Some(throughput);
            }
        }
    }

    /// Whether a session is running
    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    /// A meditation gap started
    pub fn begin_gap(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            if session.gap_started.is_none() {
                session.gap_started = Some(now);
            }
        }
    }

    /// A meditation gap ended (fired or cancelled)
    pub fn end_gap(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            if let Some(start) = session.gap_started.take() {
                session.gap_time += now.saturating_duration_since(start);
            }
        }
    }

    /// Characters per second before the rate multiplier
    ///
    /// `chars_read` is the number of characters before the cursor.
    pub fn throughput(&self, now: Instant, chars_read: usize) -> f64 {
        self.session
            .and_then(|session| Self::measure(&session, now, chars_read))
            .or(self.last_throughput)
            .unwrap_or(self.default_chars_per_second)
    }

    /// Estimate the time left to read from the cursor to the end
    pub fn estimate(&self, input: EstimateInput<'_>) -> Duration {
        let sentences = input.sentences;
        let cursor = input.cursor.min(sentences.len());

        let rate = if input.rate.is_finite() && input.rate > 0.0 {
            f64::from(input.rate)
        } else {
            1.0
        };
        let throughput = self.throughput(input.now, sentences.chars_before(cursor)) * rate;

        let remaining_chars = sentences.chars_from(cursor) as f64;
        let speech_secs = remaining_chars / throughput;

        let pause_secs = input.meditation_pause.map_or(0.0, |pause| {
            (sentences.len() - cursor) as f64 * pause.as_secs_f64()
        });

        Duration::try_from_secs_f64(speech_secs + pause_secs).unwrap_or(Duration::ZERO)
    }

    fn measure(session: &TimingSession, now: Instant, chars_read: usize) -> Option<f64> {
        let read = chars_read.checked_sub(session.chars_at_start)?;
        if read == 0 {
            return None;
        }

        let elapsed = now.saturating_duration_since(session.started_at);
        let speaking = elapsed.checked_sub(session.gap_time(now))?.as_secs_f64();
        (speaking > 0.0).then(|| read as f64 / speaking)
    }
}

/// Format a duration as `H:MM` (an hour or more) or `M:SS`
pub fn format_eta(remaining: Duration) -> String {
    let total = remaining.as_secs_f64().round() as u64;
    let hours = total / 3600;

    if hours > 0 {
        format!("{}:{:02}", hours, (total % 3600) / 60)
    } else {
        format!("{}:{:02}", total / 60, total % 60)
    }
}
