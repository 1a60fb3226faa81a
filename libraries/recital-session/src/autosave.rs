//! Persistence policy for reading positions
//!
//! The controller only *requests* saves. This policy decides when a request
//! actually reaches the store: pause, stop, finish and close save right away,
//! sentence advances and periodic checkpoints are debounced so a fast reader
//! does not hit the database on every sentence.

use recital_core::types::{DocumentId, PositionSnapshot};
use recital_playback::PersistTrigger;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct PendingSave {
    snapshot: PositionSnapshot,
    due: Instant,
}

/// Debounced save queue holding at most one snapshot
#[derive(Debug)]
pub struct AutosavePolicy {
    debounce: Duration,
    pending: Option<PendingSave>,
    last_saved: Option<PositionSnapshot>,
}

impl AutosavePolicy {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            last_saved: None,
        }
    }

    /// Queue a snapshot, replacing any older pending one
    pub fn request(&mut self, trigger: PersistTrigger, snapshot: PositionSnapshot, now: Instant) {
        let due = if trigger.is_immediate() {
            now
        } else {
            // A burst of advances keeps the first deadline
            match &self.pending {
                Some(pending) => pending.due,
                None => now + self.debounce,
            }
        };

        self.pending = Some(PendingSave { snapshot, due });
    }

    /// Drop pending work and history for a document
    pub fn clear(&mut self, document: &DocumentId) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| &p.snapshot.document_identity == document)
        {
            self.pending = None;
        }
        if self
            .last_saved
            .as_ref()
            .is_some_and(|s| &s.document_identity == document)
        {
            self.last_saved = None;
        }
    }

    /// Take the pending snapshot if its deadline passed
    ///
    /// A snapshot at the position that was saved last is dropped instead.
    pub fn take_due(&mut self, now: Instant) -> Option<PositionSnapshot> {
        if self.pending.as_ref().is_some_and(|p| p.due <= now) {
            self.take_any()
        } else {
            None
        }
    }

    /// Take the pending snapshot regardless of its deadline
    pub fn take_any(&mut self) -> Option<PositionSnapshot> {
        let pending = self.pending.take()?;
        if self
            .last_saved
            .as_ref()
            .is_some_and(|saved| saved.same_position(&pending.snapshot))
        {
            return None;
        }
        Some(pending.snapshot)
    }

    /// Record a successful save
    pub fn mark_saved(&mut self, snapshot: PositionSnapshot) {
        self.last_saved = Some(snapshot);
    }

    /// Put a failed snapshot back so the next flush retries it
    ///
    /// A newer request that arrived in the meantime wins.
    pub fn mark_failed(&mut self, snapshot: PositionSnapshot, retry_at: Instant) {
        if self.pending.is_none() {
            self.pending = Some(PendingSave {
                snapshot,
                due: retry_at,
            });
        }
    }

    /// Deadline of the pending snapshot
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_saved(&self) -> Option<&PositionSnapshot> {
        self.last_saved.as_ref()
    }
}
