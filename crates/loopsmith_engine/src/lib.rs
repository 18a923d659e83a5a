// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-sequence editing engine for Loopsmith.
//!
//! This crate provides the editing core for short animated images:
//! - Frame sequences with per-frame durations and a selection
//! - Single-sequence edits (reorder, duplicate, delete, crop, resize,
//!   reverse, pendulum, duration adjustment)
//! - Merging or concatenating two sequences into one
//! - Bounded per-sequence undo/redo
//! - GIF export with chunked palettes and full-color WebP export
//!
//! ## Architecture
//!
//! The engine is built on:
//! - Immutable, shared frame buffers (`image::RgbaImage`)
//! - An [`Editor`] that snapshots before every edit it dispatches
//! - Stateless composition and export functions over explicit references

pub mod compose;
pub mod decode;
pub mod display;
pub mod editor;
pub mod error;
pub mod export;
pub mod frame;
pub mod history;
pub mod playback;
pub mod selection;
pub mod sequence;
pub mod settings;

pub use compose::{CompositionMode, CompositionOptions, CompositionReport, Reconciliation, Side};
pub use decode::{Decoder, SourceKind};
pub use display::{DisplayTransform, ScreenRect};
pub use editor::{ApplyOutcome, EditCommand, Editor, Slot};
pub use error::{EngineError, Result};
pub use export::{ExportFormat, ExportOptions, ExportSummary, Exporter};
pub use frame::{Frame, FrameSize, PixelRect};
pub use history::{History, HistoryStats};
pub use playback::{PlaybackController, PlaybackState};
pub use selection::{FrameSelection, SelectMode};
pub use sequence::{FrameSequence, SequenceId, SequenceInfo, TimedFrame};
pub use settings::{EngineSettings, SettingsError};
