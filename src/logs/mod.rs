//! Log tail reconciliation.
//!
//! The control API only ever returns the most recent `N` lines of the
//! service log. Each refresh re-fetches that window, so consecutive
//! snapshots overlap. [`LogBuffer::reconcile`] finds the overlap by anchoring
//! on the last line already held and appends only what follows it.
//!
//! When the anchor cannot be found (the log rotated, or the window moved
//! past everything we hold) the buffer is replaced wholesale. That case is
//! expected with bounded server history and is not an error.

use std::collections::VecDeque;

use crate::utils::sequence::{Sequencer, Ticket};

/// Maximum number of lines kept on screen.
pub const DEFAULT_CAPACITY: usize = 500;

// ---------------------------------------------------------------------------
// Snapshot parsing
// ---------------------------------------------------------------------------

/// Split a raw `/logs` payload into lines, dropping blank ones.
///
/// Handles both `\n` and `\r\n` endings. Lines are kept verbatim otherwise;
/// leading whitespace is significant for stack traces.
pub fn split_snapshot(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// What a reconciliation pass changed, for the view to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDelta {
    /// The snapshot held nothing new.
    Unchanged,
    /// `lines` were appended; afterwards `evicted` lines fell off the front.
    Appended { lines: Vec<String>, evicted: usize },
    /// Overlap was lost. The view must be cleared and rebuilt from `lines`,
    /// which is the complete new buffer.
    Replaced { lines: Vec<String> },
}

/// Ordered, bounded buffer of rendered log lines.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A zero capacity is bumped to one so the anchor line always survives.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// The anchor for the next reconciliation pass.
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Merge a freshly fetched snapshot into the buffer.
    ///
    /// 1. Empty buffer: the whole snapshot is new.
    /// 2. Otherwise the first snapshot line *containing* the last buffered
    ///    line marks the boundary; everything after it is appended.
    /// 3. No such line: desync, the buffer becomes the snapshot.
    ///
    /// The buffer is then trimmed from the front to `capacity`.
    pub fn reconcile(&mut self, snapshot: Vec<String>) -> LogDelta {
        let start = match self.lines.back() {
            None => Some(0),
            Some(anchor) => find_anchor(&snapshot, anchor).map(|idx| idx + 1),
        };

        match start {
            Some(start) if start >= snapshot.len() => LogDelta::Unchanged,
            Some(start) => {
                let increment: Vec<String> = snapshot.into_iter().skip(start).collect();
                self.lines.extend(increment.iter().cloned());
                let evicted = self.evict_overflow();
                LogDelta::Appended {
                    lines: increment,
                    evicted,
                }
            }
            None => {
                self.lines = snapshot.into();
                self.evict_overflow();
                LogDelta::Replaced {
                    lines: self.lines.iter().cloned().collect(),
                }
            }
        }
    }

    fn evict_overflow(&mut self) -> usize {
        let overflow = self.lines.len().saturating_sub(self.capacity);
        self.lines.drain(..overflow);
        overflow
    }
}

/// Index of the first line that contains `anchor`.
///
/// Containment rather than equality: the raw snapshot line may carry
/// formatting around the text we stored. Ties go to the oldest match.
fn find_anchor(snapshot: &[String], anchor: &str) -> Option<usize> {
    snapshot.iter().position(|line| line.contains(anchor))
}

// ---------------------------------------------------------------------------
// Sequenced tail
// ---------------------------------------------------------------------------

/// A [`LogBuffer`] guarded by request sequencing.
///
/// Two overlapping refreshes may complete out of order; the older one is
/// dropped instead of being reconciled on top of the newer buffer.
#[derive(Debug, Default)]
pub struct LogTail {
    buffer: LogBuffer,
    sequencer: Sequencer,
}

impl LogTail {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: LogBuffer::with_capacity(capacity),
            sequencer: Sequencer::new(),
        }
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Take a ticket before issuing the `/logs` request.
    pub fn begin(&mut self) -> Ticket {
        self.sequencer.issue()
    }

    /// Apply a snapshot fetched under `ticket`. Returns `None` if the
    /// response is stale.
    pub fn apply(&mut self, ticket: Ticket, snapshot: Vec<String>) -> Option<LogDelta> {
        if !self.sequencer.accept(ticket) {
            return None;
        }
        Some(self.buffer.reconcile(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
