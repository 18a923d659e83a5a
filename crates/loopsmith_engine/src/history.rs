// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of whole-sequence snapshots.
//!
//! Every sequence gets its own pair of stacks, keyed by [`SequenceId`].
//! Snapshots are full value copies of frames, durations and the current
//! frame. Frame pixels are immutable, so a copy never aliases anything the
//! live sequence can still change.

use crate::sequence::{FrameSequence, SequenceId, SequenceState};
use indexmap::IndexMap;
use std::collections::VecDeque;

/// Maximum undo history depth per sequence
pub const MAX_HISTORY: usize = 50;

/// Saved state of one sequence
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Sequence the state belongs to
    pub sequence: SequenceId,
    /// Frames, durations and current frame
    pub state: SequenceState,
    /// Human-readable description of the edit that followed
    pub label: String,
}

impl Snapshot {
    /// Capture the current state of `sequence`
    pub fn capture(sequence: &FrameSequence, label: impl Into<String>) -> Self {
        Self {
            sequence: sequence.id(),
            state: sequence.state(),
            label: label.into(),
        }
    }
}

/// Undo and redo stacks of a single sequence
#[derive(Debug, Default)]
struct SequenceHistory {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Total snapshots in undo stacks
    pub undo_count: usize,
    /// Total snapshots in redo stacks
    pub redo_count: usize,
    /// Sequences with history
    pub tracked_sequences: usize,
    /// Maximum undo depth per sequence
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    stacks: IndexMap<SequenceId, SequenceHistory>,
    max_depth: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            stacks: IndexMap::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state of `sequence` before an edit.
    ///
    /// Clears that sequence's redo stack and drops the oldest snapshot once
    /// the depth limit is exceeded.
    pub fn snapshot(&mut self, sequence: &FrameSequence, label: &str) {
        self.push(Snapshot::capture(sequence, label));
    }

    /// Record a snapshot captured earlier, once its edit has succeeded.
    ///
    /// Same stack rules as [`History::snapshot`].
    pub fn push(&mut self, snapshot: Snapshot) {
        let max_depth = self.max_depth;
        let id = snapshot.sequence;
        let stacks = self.stacks.entry(id).or_default();

        stacks.redo_stack.clear();
        tracing::trace!(sequence = %id, label = %snapshot.label, "Snapshot taken");
        stacks.undo_stack.push_back(snapshot);
        while stacks.undo_stack.len() > max_depth {
            stacks.undo_stack.pop_front();
        }
    }

    /// Undo the last edit of `sequence`.
    ///
    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, sequence: &mut FrameSequence) -> bool {
        let Some(stacks) = self.stacks.get_mut(&sequence.id()) else {
            return false;
        };
        let Some(snapshot) = stacks.undo_stack.pop_back() else {
            return false;
        };

        stacks
            .redo_stack
            .push_back(Snapshot::capture(sequence, snapshot.label.clone()));
        tracing::debug!(sequence = %sequence.id(), label = %snapshot.label, "Undo");
        sequence.restore(snapshot.state);
        true
    }

    /// Redo the last undone edit of `sequence`.
    ///
    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self, sequence: &mut FrameSequence) -> bool {
        let max_depth = self.max_depth;
        let Some(stacks) = self.stacks.get_mut(&sequence.id()) else {
            return false;
        };
        let Some(snapshot) = stacks.redo_stack.pop_back() else {
            return false;
        };

        stacks
            .undo_stack
            .push_back(Snapshot::capture(sequence, snapshot.label.clone()));
        while stacks.undo_stack.len() > max_depth {
            stacks.undo_stack.pop_front();
        }
        tracing::debug!(sequence = %sequence.id(), label = %snapshot.label, "Redo");
        sequence.restore(snapshot.state);
        true
    }

    /// Check if undo is available for a sequence
    pub fn can_undo(&self, id: SequenceId) -> bool {
        self.undo_depth(id) > 0
    }

    /// Check if redo is available for a sequence
    pub fn can_redo(&self, id: SequenceId) -> bool {
        self.redo_depth(id) > 0
    }

    /// Undo stack depth of a sequence
    pub fn undo_depth(&self, id: SequenceId) -> usize {
        self.stacks.get(&id).map_or(0, |s| s.undo_stack.len())
    }

    /// Redo stack depth of a sequence
    pub fn redo_depth(&self, id: SequenceId) -> usize {
        self.stacks.get(&id).map_or(0, |s| s.redo_stack.len())
    }

    /// Description of the next undo
    pub fn undo_label(&self, id: SequenceId) -> Option<&str> {
        self.stacks
            .get(&id)
            .and_then(|s| s.undo_stack.back())
            .map(|s| s.label.as_str())
    }

    /// Description of the next redo
    pub fn redo_label(&self, id: SequenceId) -> Option<&str> {
        self.stacks
            .get(&id)
            .and_then(|s| s.redo_stack.back())
            .map(|s| s.label.as_str())
    }

    /// Drop the history of one sequence
    pub fn forget(&mut self, id: SequenceId) {
        self.stacks.shift_remove(&id);
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.stacks.values().map(|s| s.undo_stack.len()).sum(),
            redo_count: self.stacks.values().map(|s| s.redo_stack.len()).sum(),
            tracked_sequences: self.stacks.len(),
            max_depth: self.max_depth,
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn sequence() -> FrameSequence {
        FrameSequence::from_frames((0..4u8).map(|i| (Frame::solid(3, 3, [i, i, i, 255]), 10 + u32::from(i))))
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        let mut seq = sequence();
        let original = seq.state();

        history.snapshot(&seq, "Reverse");
        seq.reverse();
        history.snapshot(&seq, "Pendulum");
        seq.pendulum();
        history.snapshot(&seq, "Resize");
        seq.resize(6);
        history.snapshot(&seq, "Delete");
        seq.delete(1);
        let edited = seq.state();

        for _ in 0..4 {
            assert!(history.undo(&mut seq));
        }
        assert_eq!(seq.state(), original);
        assert!(!history.undo(&mut seq));

        for _ in 0..4 {
            assert!(history.redo(&mut seq));
        }
        assert_eq!(seq.state(), edited);
        assert!(!history.redo(&mut seq));
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new();
        let mut seq = sequence();

        history.snapshot(&seq, "Reverse");
        seq.reverse();
        history.undo(&mut seq);
        assert!(history.can_redo(seq.id()));

        history.snapshot(&seq, "Pendulum");
        seq.pendulum();
        assert!(!history.can_redo(seq.id()));
    }

    #[test]
    fn test_depth_limit_evicts_oldest() {
        let mut history = History::with_max_depth(3);
        let mut seq = sequence();

        for delta in 1..=5 {
            history.snapshot(&seq, &format!("Adjust {delta}"));
            seq.adjust_duration(&[0], delta);
        }
        assert_eq!(history.undo_depth(seq.id()), 3);
        assert_eq!(history.undo_label(seq.id()), Some("Adjust 5"));

        while history.undo(&mut seq) {}
        // The first two snapshots were evicted: 10 + 1 + 2
        assert_eq!(seq.durations()[0], 13);
    }

    #[test]
    fn test_stacks_are_per_sequence() {
        let mut history = History::new();
        let mut a = sequence();
        let mut b = sequence();

        history.snapshot(&a, "Reverse");
        a.reverse();

        assert!(!history.undo(&mut b));
        assert!(history.undo(&mut a));
        assert_eq!(history.stats().redo_count, 1);
        assert_eq!(history.redo_label(a.id()), Some("Reverse"));
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut history = History::new();
        let mut seq = sequence();
        assert!(!history.undo(&mut seq));
        assert!(!history.redo(&mut seq));
        assert_eq!(seq.len(), 4);
    }
}
