// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame selection state.
//!
//! Selection is a set of frame indices. Every structural edit that shifts
//! indices must also remap the selection through one of the helpers here so
//! that no stale index survives the edit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a click on a frame changes the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectMode {
    /// Replace the selection with the clicked frame
    #[default]
    Single,
    /// Add or remove the clicked frame (Ctrl+Click)
    Toggle,
    /// Extend from the last selected frame to the clicked one (Shift+Click)
    Range,
}

/// Selected frame indices, kept sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSelection {
    indices: BTreeSet<usize>,
}

impl FrameSelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an index is selected
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Add an index (idempotent)
    pub fn add(&mut self, index: usize) {
        self.indices.insert(index);
    }

    /// Remove an index
    pub fn remove(&mut self, index: usize) {
        self.indices.remove(&index);
    }

    /// Toggle an index
    pub fn toggle(&mut self, index: usize) {
        if !self.indices.remove(&index) {
            self.indices.insert(index);
        }
    }

    /// Replace the selection with a single index
    pub fn set(&mut self, index: usize) {
        self.indices.clear();
        self.indices.insert(index);
    }

    /// Replace the selection with a contiguous range
    pub fn set_range(&mut self, range: std::ops::Range<usize>) {
        self.indices = range.collect();
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Check if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of selected frames
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Lowest selected index
    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    /// Highest selected index
    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Selected indices in ascending order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Selected indices as a sorted vector
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Drop every index at or beyond `len`
    pub fn retain_below(&mut self, len: usize) {
        self.indices.retain(|&i| i < len);
    }

    /// Mirror indices for a sequence of `len` frames that was reversed
    pub fn mirror(&mut self, len: usize) {
        self.retain_below(len);
        self.indices = self.indices.iter().map(|&i| len - 1 - i).collect();
    }

    /// Account for an entry inserted at `index`
    pub fn shift_for_insert(&mut self, index: usize) {
        self.indices = self
            .indices
            .iter()
            .map(|&i| if i >= index { i + 1 } else { i })
            .collect();
    }

    /// Account for the entry at `index` being removed
    pub fn shift_for_remove(&mut self, index: usize) {
        self.indices = self
            .indices
            .iter()
            .filter(|&&i| i != index)
            .map(|&i| if i > index { i - 1 } else { i })
            .collect();
    }
}

impl FromIterator<usize> for FrameSelection {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut selection = FrameSelection::new();
        selection.toggle(3);
        assert!(selection.contains(3));
        selection.toggle(3);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_mirror() {
        let mut selection: FrameSelection = [0, 1, 4].into_iter().collect();
        selection.mirror(5);
        assert_eq!(selection.to_vec(), vec![0, 3, 4]);
    }

    #[test]
    fn test_mirror_drops_stale() {
        let mut selection: FrameSelection = [1, 7].into_iter().collect();
        selection.mirror(3);
        assert_eq!(selection.to_vec(), vec![1]);
    }

    #[test]
    fn test_shift_for_remove() {
        let mut selection: FrameSelection = [0, 2, 3].into_iter().collect();
        selection.shift_for_remove(2);
        assert_eq!(selection.to_vec(), vec![0, 2]);
    }

    #[test]
    fn test_shift_for_insert() {
        let mut selection: FrameSelection = [0, 2].into_iter().collect();
        selection.shift_for_insert(1);
        assert_eq!(selection.to_vec(), vec![0, 3]);
    }
}
