// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reading source files into (frame, duration) pairs.

use crate::error::{EngineError, Result};
use crate::frame::Frame;
use crate::sequence::FrameSequence;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Delay, DynamicImage, ImageFormat};
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

/// Duration given to frames with no timing information
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

/// Extensions accepted as sources (lowercase, without the dot)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["gif", "webp", "png", "jpg", "jpeg"];

/// How a source file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Animated or single-frame GIF
    Gif,
    /// Animated or still WebP
    WebP,
    /// Still image that becomes a one-frame sequence
    Still(ImageFormat),
}

impl SourceKind {
    /// Classify a path by its extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::WebP),
            "png" => Ok(Self::Still(ImageFormat::Png)),
            "jpg" | "jpeg" => Ok(Self::Still(ImageFormat::Jpeg)),
            _ => Err(EngineError::UnsupportedInput(format!(
                "{} is not one of: {}",
                path.display(),
                ACCEPTED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

/// Turns image files into frame lists
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    default_duration_ms: u32,
}

impl Decoder {
    /// Create a decoder using the default frame duration
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_FRAME_DURATION_MS)
    }

    /// Create a decoder that gives untimed frames `duration_ms`
    pub fn with_default_duration(duration_ms: u32) -> Self {
        Self {
            default_duration_ms: duration_ms.max(1),
        }
    }

    /// Decode a file into a fresh sequence
    pub fn load(&self, path: &Path) -> Result<FrameSequence> {
        let frames = self.decode_file(path)?;
        let sequence = FrameSequence::from_frames(frames);
        tracing::info!(
            path = %path.display(),
            frames = sequence.len(),
            total_ms = sequence.total_duration_ms(),
            "Loaded sequence"
        );
        Ok(sequence)
    }

    /// Decode a file into (frame, duration) pairs
    pub fn decode_file(&self, path: &Path) -> Result<Vec<(Frame, u32)>> {
        let kind = SourceKind::from_path(path)?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        self.decode_reader(kind, reader, path)
    }

    /// Decode from any seekable reader; `origin` is only used in errors
    pub fn decode_reader<R: BufRead + Seek>(
        &self,
        kind: SourceKind,
        reader: R,
        origin: &Path,
    ) -> Result<Vec<(Frame, u32)>> {
        let failed = |source| EngineError::Decode {
            path: origin.to_path_buf(),
            source,
        };

        let frames = match kind {
            SourceKind::Gif => {
                let decoder = GifDecoder::new(reader).map_err(failed)?;
                self.collect_animation(decoder).map_err(failed)?
            }
            SourceKind::WebP => {
                let decoder = WebPDecoder::new(reader).map_err(failed)?;
                if decoder.has_animation() {
                    self.collect_animation(decoder).map_err(failed)?
                } else {
                    let image = DynamicImage::from_decoder(decoder).map_err(failed)?;
                    vec![(Frame::new(image.to_rgba8()), self.default_duration_ms)]
                }
            }
            SourceKind::Still(format) => {
                let image = image::load(reader, format).map_err(failed)?;
                vec![(Frame::new(image.to_rgba8()), self.default_duration_ms)]
            }
        };

        if frames.is_empty() {
            return Err(EngineError::EmptySequence);
        }
        tracing::debug!(path = %origin.display(), ?kind, frames = frames.len(), "Decoded source");
        Ok(frames)
    }

    fn collect_animation<'a>(
        &self,
        decoder: impl AnimationDecoder<'a>,
    ) -> image::ImageResult<Vec<(Frame, u32)>> {
        let frames = decoder.into_frames().collect_frames()?;
        Ok(frames
            .into_iter()
            .map(|frame| {
                let duration = self.duration_of(frame.delay());
                (Frame::new(frame.into_buffer()), duration)
            })
            .collect())
    }

    /// Frame delay in whole milliseconds, or the default when it is zero
    fn duration_of(&self, delay: Delay) -> u32 {
        let (numer, denom) = delay.numer_denom_ms();
        match numer.checked_div(denom) {
            Some(0) | None => self.default_duration_ms,
            Some(ms) => ms,
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
