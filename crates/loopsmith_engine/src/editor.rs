// SPDX-License-Identifier: MIT OR Apache-2.0
//! The editing workspace.
//!
//! An [`Editor`] owns two sequence slots, the undo history, playback state
//! and settings. Every mutation goes through [`Editor::apply`], which takes
//! the history snapshot before handing the command to the sequence, so no
//! edit can forget to be undoable.

use crate::compose::{self, CompositionMode, CompositionReport};
use crate::decode::Decoder;
use crate::display::ScreenRect;
use crate::error::{EngineError, Result};
use crate::export::{ExportSummary, Exporter};
use crate::frame::{Frame, PixelRect};
use crate::history::{History, Snapshot};
use crate::playback::PlaybackController;
use crate::selection::SelectMode;
use crate::sequence::{FrameSequence, SequenceInfo, TimedFrame};
use crate::settings::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One of the editor's two sequence positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Slot {
    /// The sequence being edited and exported
    #[default]
    Primary,
    /// The sequence folded into the primary by merge or concatenate
    Secondary,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Primary => write!(f, "primary"),
            Slot::Secondary => write!(f, "secondary"),
        }
    }
}

/// A request to change a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditCommand {
    /// Reverse frame order
    Reverse,
    /// Append a reversed copy
    Pendulum,
    /// Resize every frame to this height
    Resize(u32),
    /// Crop to a rectangle drawn over a preview of the given viewport size
    Crop {
        /// Rectangle in viewport coordinates
        rect: ScreenRect,
        /// Preview area (width, height)
        viewport: (u32, u32),
    },
    /// Crop to a rectangle in image pixels
    CropPixels(PixelRect),
    /// Move frames so they start at `target`
    Reorder {
        /// Frames to move
        indices: Vec<usize>,
        /// Insertion point after the moved frames are taken out
        target: usize,
    },
    /// Insert a copy after a frame
    Duplicate(usize),
    /// Remove one frame
    Delete(usize),
    /// Click on a frame
    Select {
        /// Frame clicked
        index: usize,
        /// Click modifier
        #[serde(default)]
        mode: SelectMode,
    },
    /// Select every frame
    SelectAll,
    /// Deselect everything
    ClearSelection,
    /// Remove the selected frames
    DeleteSelected,
    /// Change the duration of some frames
    AdjustDuration {
        /// Frames to change
        indices: Vec<usize>,
        /// Milliseconds to add (negative to shorten)
        delta_ms: i32,
    },
    /// Change the duration of the selected frames
    AdjustSelectedDuration(i32),
    /// Show a specific frame
    SetCurrent(usize),
    /// Undo the last edit
    Undo,
    /// Redo the last undone edit
    Redo,
    /// Play the secondary sequence beside the primary
    Merge,
    /// Play the secondary sequence after the primary
    Concatenate,
}

impl EditCommand {
    /// Human-readable description, used as the history label
    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::Reverse => "Reverse",
            EditCommand::Pendulum => "Pendulum",
            EditCommand::Resize(_) => "Resize",
            EditCommand::Crop { .. } | EditCommand::CropPixels(_) => "Crop",
            EditCommand::Reorder { .. } => "Reorder",
            EditCommand::Duplicate(_) => "Duplicate",
            EditCommand::Delete(_) => "Delete",
            EditCommand::Select { .. } => "Select",
            EditCommand::SelectAll => "Select All",
            EditCommand::ClearSelection => "Clear Selection",
            EditCommand::DeleteSelected => "Delete Selected",
            EditCommand::AdjustDuration { .. } | EditCommand::AdjustSelectedDuration(_) => {
                "Adjust Duration"
            }
            EditCommand::SetCurrent(_) => "Set Current Frame",
            EditCommand::Undo => "Undo",
            EditCommand::Redo => "Redo",
            EditCommand::Merge => "Merge",
            EditCommand::Concatenate => "Concatenate",
        }
    }

    /// Whether the command changes frames or durations and so is undoable
    pub fn is_undoable(&self) -> bool {
        !matches!(
            self,
            EditCommand::Select { .. }
                | EditCommand::SelectAll
                | EditCommand::ClearSelection
                | EditCommand::SetCurrent(_)
                | EditCommand::Undo
                | EditCommand::Redo
        )
    }
}

/// What applying a command did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyOutcome {
    /// Whether the sequence changed
    pub changed: bool,
    /// Composition summary for merge and concatenate
    pub composition: Option<CompositionReport>,
}

impl ApplyOutcome {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            composition: None,
        }
    }
}

/// Two sequence slots plus their shared history
#[derive(Debug)]
pub struct Editor {
    primary: FrameSequence,
    secondary: FrameSequence,
    history: History,
    playback: PlaybackController,
    settings: EngineSettings,
}

impl Editor {
    /// Create an empty editor
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            primary: FrameSequence::new(),
            secondary: FrameSequence::new(),
            history: History::with_max_depth(settings.history_capacity),
            playback: PlaybackController::new(settings.playback_interval_ms),
            settings,
        }
    }

    /// Active settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Sequence in `slot`
    pub fn sequence(&self, slot: Slot) -> &FrameSequence {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Secondary => &self.secondary,
        }
    }

    fn sequence_mut(&mut self, slot: Slot) -> &mut FrameSequence {
        match slot {
            Slot::Primary => &mut self.primary,
            Slot::Secondary => &mut self.secondary,
        }
    }

    /// Status summary of the sequence in `slot`
    pub fn info(&self, slot: Slot) -> SequenceInfo {
        self.sequence(slot).info()
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Playback state
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Put `sequence` into `slot`, discarding what was there and its history
    pub fn load(&mut self, slot: Slot, sequence: FrameSequence) {
        let previous = std::mem::replace(self.sequence_mut(slot), sequence);
        self.history.forget(previous.id());
        tracing::debug!(%slot, frames = self.sequence(slot).len(), "Sequence loaded");
    }

    /// Load decoded (frame, duration) pairs into `slot`
    pub fn load_frames(&mut self, slot: Slot, frames: impl IntoIterator<Item = (Frame, u32)>) {
        self.load(slot, FrameSequence::from_frames(frames));
    }

    /// Decode `path` into `slot`
    pub fn open(&mut self, slot: Slot, path: &Path) -> Result<()> {
        let sequence = Decoder::with_default_duration(self.settings.default_frame_duration_ms).load(path)?;
        self.load(slot, sequence);
        Ok(())
    }

    /// Apply `command` to the sequence in `slot`.
    ///
    /// Undoable commands capture a snapshot before the edit and record it
    /// once the edit succeeds, even when it turns out to change nothing. A
    /// rejected edit leaves both history stacks alone. Merge and
    /// concatenate always read the secondary slot and write the primary one.
    pub fn apply(&mut self, slot: Slot, command: EditCommand) -> Result<ApplyOutcome> {
        match command {
            EditCommand::Undo => return Ok(ApplyOutcome::changed(self.undo(slot))),
            EditCommand::Redo => return Ok(ApplyOutcome::changed(self.redo(slot))),
            EditCommand::Merge => return self.compose(CompositionMode::Merge),
            EditCommand::Concatenate => return self.compose(CompositionMode::Concatenate),
            _ => {}
        }

        let label = command.label();
        let pending = command
            .is_undoable()
            .then(|| Snapshot::capture(self.sequence(slot), label));

        let min_crop_size = self.settings.min_crop_size;
        let sequence = self.sequence_mut(slot);
        let changed = match command {
            EditCommand::Reverse => sequence.reverse(),
            EditCommand::Pendulum => sequence.pendulum(),
            EditCommand::Resize(height) => sequence.resize(height),
            EditCommand::Crop { rect, viewport } => sequence.crop(rect, viewport, min_crop_size)?,
            EditCommand::CropPixels(rect) => sequence.crop_pixels(rect),
            EditCommand::Reorder { indices, target } => sequence.reorder(&indices, target),
            EditCommand::Duplicate(index) => sequence.duplicate(index),
            EditCommand::Delete(index) => sequence.delete(index),
            EditCommand::Select { index, mode } => {
                sequence.select(index, mode);
                true
            }
            EditCommand::SelectAll => {
                sequence.select_all();
                true
            }
            EditCommand::ClearSelection => {
                sequence.clear_selection();
                true
            }
            EditCommand::DeleteSelected => sequence.delete_selected(),
            EditCommand::AdjustDuration { indices, delta_ms } => {
                sequence.adjust_duration(&indices, delta_ms)
            }
            EditCommand::AdjustSelectedDuration(delta_ms) => sequence.adjust_selected_duration(delta_ms),
            EditCommand::SetCurrent(index) => {
                sequence.set_current(index);
                true
            }
            EditCommand::Undo | EditCommand::Redo | EditCommand::Merge | EditCommand::Concatenate => {
                false
            }
        };

        if changed {
            tracing::debug!(%slot, command = label, frames = sequence.len(), "Applied edit");
        } else {
            tracing::warn!(%slot, command = label, "Edit had no effect");
        }
        if let Some(snapshot) = pending {
            self.history.push(snapshot);
        }
        Ok(ApplyOutcome::changed(changed))
    }

    /// Apply a list of commands in order, stopping at the first error
    pub fn apply_all(
        &mut self,
        slot: Slot,
        commands: impl IntoIterator<Item = EditCommand>,
    ) -> Result<Vec<ApplyOutcome>> {
        commands
            .into_iter()
            .map(|command| self.apply(slot, command))
            .collect()
    }

    /// Undo the last edit of the sequence in `slot`
    pub fn undo(&mut self, slot: Slot) -> bool {
        let sequence = match slot {
            Slot::Primary => &mut self.primary,
            Slot::Secondary => &mut self.secondary,
        };
        self.history.undo(sequence)
    }

    /// Redo the last undone edit of the sequence in `slot`
    pub fn redo(&mut self, slot: Slot) -> bool {
        let sequence = match slot {
            Slot::Primary => &mut self.primary,
            Slot::Secondary => &mut self.secondary,
        };
        self.history.redo(sequence)
    }

    /// Fold the secondary sequence into the primary one.
    ///
    /// Playback is paused first. The primary's state is snapshotted so the
    /// composition can be undone; the secondary's history is dropped along
    /// with its frames.
    pub fn compose(&mut self, mode: CompositionMode) -> Result<ApplyOutcome> {
        if self.primary.is_empty() || self.secondary.is_empty() {
            return Err(EngineError::CompositionPrecondition(format!(
                "{} needs frames in both slots (primary has {}, secondary has {})",
                mode.name(),
                self.primary.len(),
                self.secondary.len()
            )));
        }

        self.playback.pause();
        self.history.snapshot(&self.primary, mode.name());
        let options = self.settings.composition_options();
        let report = compose::compose(mode, &mut self.primary, &mut self.secondary, &options)?;
        self.history.forget(self.secondary.id());

        Ok(ApplyOutcome {
            changed: true,
            composition: Some(report),
        })
    }

    /// Start or pause playback of the primary sequence
    pub fn toggle_playback(&mut self) {
        self.playback.toggle();
        tracing::debug!(state = ?self.playback.state, "Playback toggled");
    }

    /// Stop playback and rewind the primary sequence
    pub fn stop_playback(&mut self) {
        self.playback.stop(&mut self.primary);
    }

    /// Advance the primary sequence one frame if playing
    pub fn tick(&mut self) -> Option<usize> {
        self.playback.tick(&mut self.primary)
    }

    /// Exporter configured from the settings
    pub fn exporter(&self) -> Exporter {
        Exporter::with_options(self.settings.export_options())
    }

    /// Value copy of the primary sequence's frames for background export
    pub fn export_entries(&self) -> Result<Vec<TimedFrame>> {
        if self.primary.is_empty() {
            return Err(EngineError::EmptySequence);
        }
        Ok(self.primary.entries().to_vec())
    }

    /// Export the primary sequence to `path`
    pub fn export(&self, path: &Path) -> Result<ExportSummary> {
        self.exporter().export_sequence(&self.primary, path)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
