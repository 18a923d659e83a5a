// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine settings.
//!
//! Tunables for history depth, palette quantization, composition and
//! playback. Every field falls back to its default, so a settings file only
//! needs the values it changes.

use crate::compose::{CompositionOptions, DEFAULT_FILL_COLOR, DEFAULT_MAX_COMPOSITE_DIMENSION};
use crate::decode::DEFAULT_FRAME_DURATION_MS;
use crate::export::{ExportOptions, PALETTE_CHUNK_SIZE, PALETTE_COLORS, QUANTIZER_SAMPLE_FACTOR};
use crate::history::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Smallest on-screen crop rectangle, per side
pub const MIN_CROP_SIZE: u32 = 20;

/// Delay between playback ticks
pub const PLAYBACK_INTERVAL_MS: u64 = 100;

/// Errors from loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid RON
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// A value is out of range
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Tunable engine constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Undo depth per sequence
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Frames sharing one GIF palette
    #[serde(default = "default_palette_chunk_size")]
    pub palette_chunk_size: usize,
    /// Colors per GIF palette
    #[serde(default = "default_palette_colors")]
    pub palette_colors: usize,
    /// NeuQuant sampling factor (1 = best, 30 = fastest)
    #[serde(default = "default_quantizer_sample_factor")]
    pub quantizer_sample_factor: i32,
    /// Largest merged canvas side
    #[serde(default = "default_max_composite_dimension")]
    pub max_composite_dimension: u32,
    /// Canvas background (RGBA)
    #[serde(default = "default_fill_color")]
    pub fill_color: [u8; 4],
    /// Smallest on-screen crop side
    #[serde(default = "default_min_crop_size")]
    pub min_crop_size: u32,
    /// Duration for frames without timing
    #[serde(default = "default_frame_duration_ms")]
    pub default_frame_duration_ms: u32,
    /// Delay between playback ticks
    #[serde(default = "default_playback_interval_ms")]
    pub playback_interval_ms: u64,
}

fn default_history_capacity() -> usize {
    MAX_HISTORY
}
fn default_palette_chunk_size() -> usize {
    PALETTE_CHUNK_SIZE
}
fn default_palette_colors() -> usize {
    PALETTE_COLORS
}
fn default_quantizer_sample_factor() -> i32 {
    QUANTIZER_SAMPLE_FACTOR
}
fn default_max_composite_dimension() -> u32 {
    DEFAULT_MAX_COMPOSITE_DIMENSION
}
fn default_fill_color() -> [u8; 4] {
    DEFAULT_FILL_COLOR
}
fn default_min_crop_size() -> u32 {
    MIN_CROP_SIZE
}
fn default_frame_duration_ms() -> u32 {
    DEFAULT_FRAME_DURATION_MS
}
fn default_playback_interval_ms() -> u64 {
    PLAYBACK_INTERVAL_MS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            palette_chunk_size: default_palette_chunk_size(),
            palette_colors: default_palette_colors(),
            quantizer_sample_factor: default_quantizer_sample_factor(),
            max_composite_dimension: default_max_composite_dimension(),
            fill_color: default_fill_color(),
            min_crop_size: default_min_crop_size(),
            default_frame_duration_ms: default_frame_duration_ms(),
            playback_interval_ms: default_playback_interval_ms(),
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: EngineSettings = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Render as pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field, reason: &str| {
            Err(SettingsError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.history_capacity == 0 {
            return invalid("history_capacity", "must be at least 1");
        }
        if self.palette_chunk_size == 0 {
            return invalid("palette_chunk_size", "must be at least 1");
        }
        if !(2..=PALETTE_COLORS).contains(&self.palette_colors) {
            return invalid("palette_colors", "must be between 2 and 256");
        }
        if !(1..=30).contains(&self.quantizer_sample_factor) {
            return invalid("quantizer_sample_factor", "must be between 1 and 30");
        }
        if self.max_composite_dimension == 0 {
            return invalid("max_composite_dimension", "must be at least 1");
        }
        if self.default_frame_duration_ms == 0 {
            return invalid("default_frame_duration_ms", "must be at least 1");
        }
        if self.playback_interval_ms == 0 {
            return invalid("playback_interval_ms", "must be at least 1");
        }
        Ok(())
    }

    /// Options for the exporter
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            chunk_size: self.palette_chunk_size,
            palette_colors: self.palette_colors,
            sample_factor: self.quantizer_sample_factor,
        }
    }

    /// Options for merge and concatenate
    pub fn composition_options(&self) -> CompositionOptions {
        CompositionOptions {
            fill_color: self.fill_color,
            max_dimension: self.max_composite_dimension,
        }
    }
}
