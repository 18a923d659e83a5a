// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame sequence: ordered frames paired with display durations.
//!
//! Frames and durations live in one `Vec<TimedFrame>`, so an insert or
//! removal can never leave the two out of step. Parallel views are offered
//! for code that wants them.

use crate::display::{DisplayTransform, ScreenRect};
use crate::frame::{Frame, FrameSize, PixelRect};
use crate::selection::{FrameSelection, SelectMode};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    /// Create a new random sequence ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame and how long it stays on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedFrame {
    /// Pixels
    pub frame: Frame,
    /// Display time in milliseconds, always at least 1
    pub duration_ms: u32,
}

impl TimedFrame {
    /// Pair a frame with a duration; zero durations are raised to 1
    pub fn new(frame: Frame, duration_ms: u32) -> Self {
        Self {
            frame,
            duration_ms: duration_ms.max(1),
        }
    }
}

/// Restorable state of a sequence (used by undo/redo)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceState {
    /// Frames with their durations
    pub entries: Vec<TimedFrame>,
    /// Frame shown in the preview
    pub current_index: usize,
}

/// Read-only summary of a sequence for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceInfo {
    /// Current frame, 1-based
    pub current_frame: usize,
    /// Number of frames
    pub frame_count: usize,
    /// Sum of all durations
    pub total_duration_ms: u64,
    /// Geometry of the current frame
    pub size: Option<FrameSize>,
    /// Sum of selected durations, when anything is selected
    pub selected_duration_ms: Option<u64>,
}

impl std::fmt::Display for SequenceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Displaying frame {} of {} ({} ms in total)",
            self.current_frame, self.frame_count, self.total_duration_ms
        )?;
        if let Some(size) = self.size {
            write!(f, "\n{size}")?;
        }
        if let Some(selected) = self.selected_duration_ms {
            write!(f, "\nduration of selected frames: {selected} ms")?;
        }
        Ok(())
    }
}

/// An editable animation timeline
#[derive(Debug, Clone)]
pub struct FrameSequence {
    id: SequenceId,
    entries: Vec<TimedFrame>,
    current_index: usize,
    selection: FrameSelection,
}

impl FrameSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self {
            id: SequenceId::new(),
            entries: Vec::new(),
            current_index: 0,
            selection: FrameSelection::new(),
        }
    }

    /// Create a sequence from decoded (frame, duration) pairs
    pub fn from_frames(frames: impl IntoIterator<Item = (Frame, u32)>) -> Self {
        let mut sequence = Self::new();
        sequence.populate(frames);
        sequence
    }

    /// Replace the contents with freshly decoded frames
    pub fn populate(&mut self, frames: impl IntoIterator<Item = (Frame, u32)>) {
        self.entries = frames
            .into_iter()
            .map(|(frame, duration)| TimedFrame::new(frame, duration))
            .collect();
        self.current_index = 0;
        self.selection.clear();
    }

    /// Drop all frames
    pub fn reset(&mut self) {
        self.entries.clear();
        self.current_index = 0;
        self.selection.clear();
    }

    /// Sequence identity
    pub fn id(&self) -> SequenceId {
        self.id
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sequence has no frames
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frames with their durations
    pub fn entries(&self) -> &[TimedFrame] {
        &self.entries
    }

    /// Frame at `index`
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.entries.get(index).map(|e| &e.frame)
    }

    /// All frames, in order
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &Frame> + '_ {
        self.entries.iter().map(|e| &e.frame)
    }

    /// All durations, in order
    pub fn durations(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.duration_ms).collect()
    }

    /// Sum of all durations
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.duration_ms)).sum()
    }

    /// Index of the frame shown in the preview
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Frame shown in the preview
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame(self.current_index)
    }

    /// Geometry of the first frame
    pub fn size(&self) -> Option<FrameSize> {
        self.entries.first().map(|e| e.frame.size())
    }

    /// Selected frames
    pub fn selection(&self) -> &FrameSelection {
        &self.selection
    }

    /// Copy out the restorable state
    pub fn state(&self) -> SequenceState {
        SequenceState {
            entries: self.entries.clone(),
            current_index: self.current_index,
        }
    }

    /// Replace frames, durations and current frame with a saved state.
    ///
    /// Selection is not part of the saved state and is cleared.
    pub fn restore(&mut self, state: SequenceState) {
        self.entries = state.entries;
        self.current_index = state.current_index;
        self.selection.clear();
        self.clamp_current();
    }

    /// Install a composed result: frames replaced, preview rewound
    pub fn replace_entries(&mut self, entries: Vec<TimedFrame>) {
        self.entries = entries;
        self.current_index = 0;
        self.selection.clear();
    }

    /// Status summary
    pub fn info(&self) -> SequenceInfo {
        let selected_duration_ms = (!self.selection.is_empty()).then(|| {
            self.selection
                .iter()
                .filter_map(|i| self.entries.get(i))
                .map(|e| u64::from(e.duration_ms))
                .sum()
        });

        SequenceInfo {
            current_frame: if self.is_empty() { 0 } else { self.current_index + 1 },
            frame_count: self.len(),
            total_duration_ms: self.total_duration_ms(),
            size: self.current_frame().map(Frame::size),
            selected_duration_ms,
        }
    }

    fn clamp_current(&mut self) {
        self.current_index = self.current_index.min(self.len().saturating_sub(1));
    }

    // ---------------------------------------------------------------------
    // Playback and selection
    // ---------------------------------------------------------------------

    /// Step the preview to the next frame, wrapping at the end
    pub fn advance_frame(&mut self) -> usize {
        if !self.is_empty() {
            self.current_index = (self.current_index + 1) % self.len();
        }
        self.current_index
    }

    /// Show a specific frame
    pub fn set_current(&mut self, index: usize) {
        self.current_index = index;
        self.clamp_current();
    }

    /// Apply a click on the frame at `index`
    pub fn select(&mut self, index: usize, mode: SelectMode) {
        if index >= self.len() {
            return;
        }

        match (mode, self.selection.last()) {
            (SelectMode::Range, Some(last)) => {
                let (start, end) = (last.min(index), last.max(index));
                self.selection.set_range(start..end + 1);
            }
            (SelectMode::Toggle, _) => {
                self.selection.toggle(index);
                self.current_index = index;
            }
            (SelectMode::Single | SelectMode::Range, _) => {
                self.selection.set(index);
                self.current_index = index;
            }
        }
    }

    /// Select every frame
    pub fn select_all(&mut self) {
        self.selection.set_range(0..self.len());
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ---------------------------------------------------------------------
    // Edit operations
    // ---------------------------------------------------------------------

    /// Reverse frame order.
    ///
    /// Selection and the current frame follow their frames to the mirrored
    /// positions, so applying this twice is the identity.
    pub fn reverse(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        let len = self.len();
        self.entries.reverse();
        self.selection.mirror(len);
        self.current_index = len - 1 - self.current_index.min(len - 1);
        true
    }

    /// Append a reversed copy so the animation plays forward then back
    pub fn pendulum(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        let backwards: Vec<TimedFrame> = self.entries.iter().rev().cloned().collect();
        self.entries.extend(backwards);
        true
    }

    /// Resize every frame to `target_height`, keeping the first frame's
    /// aspect ratio for all of them
    pub fn resize(&mut self, target_height: u32) -> bool {
        let Some(first) = self.size() else {
            return false;
        };
        if target_height == 0 {
            return false;
        }

        let target = FrameSize::new(first.width_at_height(target_height), target_height);
        for entry in &mut self.entries {
            entry.frame = entry.frame.resized(target);
        }
        tracing::debug!(sequence = %self.id, %target, "Resized frames");
        true
    }

    /// Crop every frame to a rectangle drawn over the preview.
    ///
    /// `viewport` is the preview area the current frame is fitted into.
    /// Rectangles smaller than `min_size` on screen are ignored.
    pub fn crop(&mut self, rect: ScreenRect, viewport: (u32, u32), min_size: u32) -> Result<bool> {
        let Some(image) = self.current_frame().map(Frame::size) else {
            return Ok(false);
        };
        if !rect.is_at_least(min_size) {
            tracing::debug!(?rect, min_size, "Ignoring undersized crop");
            return Ok(false);
        }

        let transform = DisplayTransform::fit(viewport.0, viewport.1, image)?;
        let pixels = transform.to_pixel_rect(rect, image);
        Ok(self.crop_pixels(pixels))
    }

    /// Crop every frame to an image-space rectangle, clamped to each frame
    pub fn crop_pixels(&mut self, rect: PixelRect) -> bool {
        if self.is_empty() {
            return false;
        }
        for entry in &mut self.entries {
            let clamped = rect.clamped_to(entry.frame.size());
            entry.frame = entry.frame.cropped(clamped);
        }
        tracing::debug!(sequence = %self.id, ?rect, "Cropped frames");
        true
    }

    /// Move the frames at `indices` so they sit together starting at
    /// `target_index`.
    ///
    /// `target_index` is read against the list with the moved frames already
    /// taken out, and is clamped to its end. The moved frames become the
    /// selection.
    pub fn reorder(&mut self, indices: &[usize], target_index: usize) -> bool {
        let mut moving_indices: Vec<usize> =
            indices.iter().copied().filter(|&i| i < self.len()).collect();
        moving_indices.sort_unstable();
        moving_indices.dedup();
        if moving_indices.is_empty() {
            return false;
        }

        let mut moving = Vec::with_capacity(moving_indices.len());
        for &i in moving_indices.iter().rev() {
            moving.push(self.entries.remove(i));
        }
        moving.reverse();

        let insert_at = target_index.min(self.entries.len());
        let count = moving.len();
        let tail = self.entries.split_off(insert_at);
        self.entries.extend(moving);
        self.entries.extend(tail);

        self.selection.set_range(insert_at..insert_at + count);
        self.clamp_current();
        true
    }

    /// Drag the frame at `source` onto `target`.
    ///
    /// Moves the whole selection when there is one, otherwise just `source`.
    pub fn drag(&mut self, source: usize, target: usize) -> bool {
        let indices = if self.selection.is_empty() {
            vec![source]
        } else {
            self.selection.to_vec()
        };
        self.reorder(&indices, target)
    }

    /// Insert a copy of the frame at `index` right after it
    pub fn duplicate(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index).cloned() else {
            return false;
        };
        self.entries.insert(index + 1, entry);
        self.selection.shift_for_insert(index + 1);
        true
    }

    /// Remove the frame at `index` unless it is the last one left
    pub fn delete(&mut self, index: usize) -> bool {
        if index >= self.len() || self.len() <= 1 {
            return false;
        }
        self.entries.remove(index);
        self.selection.shift_for_remove(index);
        self.clamp_current();
        true
    }

    /// Remove every selected frame and clear the selection
    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        for index in self.selection.to_vec().into_iter().rev() {
            if index < self.entries.len() {
                self.entries.remove(index);
            }
        }
        self.selection.clear();
        self.clamp_current();
        true
    }

    /// Add `delta_ms` to the duration of each frame in `indices`.
    ///
    /// Durations never drop below 1 ms. Unknown indices are skipped.
    pub fn adjust_duration(&mut self, indices: &[usize], delta_ms: i32) -> bool {
        let mut changed = false;
        for &index in indices {
            let Some(entry) = self.entries.get_mut(index) else {
                continue;
            };
            let adjusted = (i64::from(entry.duration_ms) + i64::from(delta_ms))
                .clamp(1, i64::from(u32::MAX));
            entry.duration_ms = adjusted as u32;
            changed = true;
        }
        changed
    }

    /// Adjust the duration of every selected frame
    pub fn adjust_selected_duration(&mut self, delta_ms: i32) -> bool {
        let indices = self.selection.to_vec();
        self.adjust_duration(&indices, delta_ms)
    }
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new()
    }
}
