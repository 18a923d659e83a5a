// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding sequences to animated GIF and WebP.
//!
//! GIF frames are limited to 256 colors. Rather than one global table,
//! frames are handled in fixed-size chunks: the chunk's first frame trains
//! an adaptive palette and every frame of the chunk is mapped onto it
//! without dithering. WebP keeps full RGBA and needs no quantization.
//!
//! Encoded bytes go to a `.part` file next to the destination, which is
//! renamed into place only after everything succeeded.

use crate::error::{EngineError, Result};
use crate::frame::{Frame, FrameSize};
use crate::sequence::{FrameSequence, TimedFrame};
use color_quant::NeuQuant;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Frames sharing one palette
pub const PALETTE_CHUNK_SIZE: usize = 64;

/// Colors per palette
pub const PALETTE_COLORS: usize = 256;

/// NeuQuant sampling factor (1 = best, 30 = fastest)
pub const QUANTIZER_SAMPLE_FACTOR: i32 = 10;

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Animated GIF with chunked palettes
    Gif,
    /// Animated WebP in full color
    WebP,
}

impl ExportFormat {
    /// Pick the format from a destination path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                EngineError::UnsupportedInput(format!("{} has no extension", path.display()))
            })?;

        match ext.as_str() {
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::WebP),
            _ => Err(EngineError::UnsupportedInput(format!(
                "only .gif or .webp can be exported, got .{ext}"
            ))),
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Whether frames must be reduced to a palette
    pub fn needs_palette(&self) -> bool {
        matches!(self, Self::Gif)
    }

    /// All export formats
    pub fn all() -> &'static [ExportFormat] {
        &[Self::Gif, Self::WebP]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gif => write!(f, "GIF"),
            Self::WebP => write!(f, "WebP"),
        }
    }
}

/// Quantization tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Frames sharing one palette
    pub chunk_size: usize,
    /// Colors per palette (at most 256)
    pub palette_colors: usize,
    /// NeuQuant sampling factor
    pub sample_factor: i32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chunk_size: PALETTE_CHUNK_SIZE,
            palette_colors: PALETTE_COLORS,
            sample_factor: QUANTIZER_SAMPLE_FACTOR,
        }
    }
}

/// Result of a finished export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// File written
    pub path: PathBuf,
    /// Container used
    pub format: ExportFormat,
    /// Frames written
    pub frame_count: usize,
    /// Sum of frame durations
    pub total_duration_ms: u64,
    /// Palettes built (zero for full-color output)
    pub palettes: usize,
    /// Size of the file
    pub bytes_written: usize,
}

/// Adaptive palette trained on one frame
struct ChunkPalette {
    quantizer: NeuQuant,
    rgb: Vec<u8>,
}

impl ChunkPalette {
    fn train(frame: &Frame, colors: usize, sample_factor: i32) -> Self {
        let opaque = opaque_pixels(frame);
        let quantizer = NeuQuant::new(sample_factor, colors, &opaque);
        let rgb = quantizer.color_map_rgb();
        Self { quantizer, rgb }
    }

    /// Nearest palette index for every pixel, no dithering
    fn index_frame(&self, frame: &Frame) -> Vec<u8> {
        opaque_pixels(frame)
            .chunks_exact(4)
            .map(|pixel| self.quantizer.index_of(pixel) as u8)
            .collect()
    }
}

/// RGBA bytes with alpha forced opaque
fn opaque_pixels(frame: &Frame) -> Vec<u8> {
    frame
        .as_raw()
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
        .collect()
}

/// Milliseconds to GIF centiseconds, rounded half up and at least 1
fn centiseconds(duration_ms: u32) -> u16 {
    ((duration_ms.saturating_add(5)) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

fn gif_error(err: gif::EncodingError) -> EngineError {
    EngineError::EncodeFailure(format!("GIF: {err}"))
}

fn webp_error(err: webp_animation::Error) -> EngineError {
    EngineError::EncodeFailure(format!("WebP: {err:?}"))
}

/// Writes sequences to animation files
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    /// Create an exporter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exporter with custom options
    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Current options
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a sequence to `path`, picking the format from its extension
    pub fn export_sequence(&self, sequence: &FrameSequence, path: &Path) -> Result<ExportSummary> {
        self.export(sequence.entries(), path)
    }

    /// Export frames with their durations to `path`.
    ///
    /// The extension is checked before anything is encoded. Nothing is left
    /// at `path` unless the whole file was written.
    pub fn export(&self, entries: &[TimedFrame], path: &Path) -> Result<ExportSummary> {
        let format = ExportFormat::from_path(path)?;
        let (bytes, palettes) = self.encode(format, entries)?;
        write_atomically(path, &bytes)?;

        let summary = ExportSummary {
            path: path.to_path_buf(),
            format,
            frame_count: entries.len(),
            total_duration_ms: entries.iter().map(|e| u64::from(e.duration_ms)).sum(),
            palettes,
            bytes_written: bytes.len(),
        };
        tracing::info!(
            path = %path.display(),
            %format,
            frames = summary.frame_count,
            bytes = summary.bytes_written,
            "Exported animation"
        );
        Ok(summary)
    }

    /// Encode to an in-memory file; returns the bytes and the palette count
    pub fn encode(&self, format: ExportFormat, entries: &[TimedFrame]) -> Result<(Vec<u8>, usize)> {
        let size = uniform_size(entries)?;
        match format {
            ExportFormat::Gif => self.encode_gif(entries, size),
            ExportFormat::WebP => encode_webp(entries, size).map(|bytes| (bytes, 0)),
        }
    }

    fn encode_gif(&self, entries: &[TimedFrame], size: FrameSize) -> Result<(Vec<u8>, usize)> {
        let too_large = || {
            EngineError::EncodeFailure(format!("GIF cannot hold {size} frames (max 65535 per side)"))
        };
        let width = u16::try_from(size.width).map_err(|_| too_large())?;
        let height = u16::try_from(size.height).map_err(|_| too_large())?;
        let chunk_size = self.options.chunk_size.max(1);
        let colors = self.options.palette_colors.clamp(2, PALETTE_COLORS);

        let mut bytes = Vec::new();
        let mut palettes = 0;
        {
            let mut encoder = gif::Encoder::new(&mut bytes, width, height, &[]).map_err(gif_error)?;
            encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_error)?;

            for chunk in entries.chunks(chunk_size) {
                let palette = ChunkPalette::train(&chunk[0].frame, colors, self.options.sample_factor);
                palettes += 1;
                tracing::debug!(chunk = palettes, frames = chunk.len(), "Built chunk palette");

                for entry in chunk {
                    let mut frame = gif::Frame::default();
                    frame.width = width;
                    frame.height = height;
                    frame.buffer = Cow::Owned(palette.index_frame(&entry.frame));
                    frame.palette = Some(palette.rgb.clone());
                    frame.delay = centiseconds(entry.duration_ms);
                    encoder.write_frame(&frame).map_err(gif_error)?;
                }
            }
        }
        Ok((bytes, palettes))
    }
}

fn encode_webp(entries: &[TimedFrame], size: FrameSize) -> Result<Vec<u8>> {
    let mut encoder = webp_animation::Encoder::new((size.width, size.height)).map_err(webp_error)?;

    let mut timestamp: i32 = 0;
    for entry in entries {
        encoder
            .add_frame(entry.frame.as_raw(), timestamp)
            .map_err(webp_error)?;
        timestamp = i32::try_from(entry.duration_ms)
            .ok()
            .and_then(|d| timestamp.checked_add(d))
            .ok_or_else(|| EngineError::EncodeFailure("WebP timeline too long".to_string()))?;
    }

    let data = encoder.finalize(timestamp).map_err(webp_error)?;
    Ok(data.to_vec())
}

/// Shared frame size; every frame must match the first
fn uniform_size(entries: &[TimedFrame]) -> Result<FrameSize> {
    let size = entries
        .first()
        .map(|e| e.frame.size())
        .ok_or(EngineError::EmptySequence)?;
    if let Some((index, entry)) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| e.frame.size() != size)
    {
        return Err(EngineError::EncodeFailure(format!(
            "frame {} is {} but the animation is {size}",
            index + 1,
            entry.frame.size()
        )));
    }
    Ok(size)
}

/// Write `bytes` to `path` through a sibling `.part` file
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part_name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    part_name.push(".part");
    let part = path.with_file_name(part_name);

    let result = std::fs::write(&part, bytes).and_then(|()| std::fs::rename(&part, path));
    if let Err(err) = result {
        let _ = std::fs::remove_file(&part);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::AnimationDecoder;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loopsmith-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn entries(durations: &[u32]) -> Vec<TimedFrame> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| TimedFrame::new(Frame::solid(8, 6, [i as u8 * 60, 30, 200, 255]), d))
            .collect()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.GIF")).unwrap(), ExportFormat::Gif);
        assert_eq!(ExportFormat::from_path(Path::new("a.webp")).unwrap(), ExportFormat::WebP);
        assert!(matches!(
            ExportFormat::from_path(Path::new("a.png")),
            Err(EngineError::UnsupportedInput(_))
        ));
        assert!(ExportFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_centiseconds() {
        assert_eq!(centiseconds(100), 10);
        assert_eq!(centiseconds(45), 5);
        assert_eq!(centiseconds(44), 4);
        assert_eq!(centiseconds(1), 1);
    }

    #[test]
    fn test_gif_round_trip() {
        let dir = temp_dir();
        let path = dir.join("out.gif");
        let exporter = Exporter::with_options(ExportOptions {
            chunk_size: 2,
            ..ExportOptions::default()
        });

        let summary = exporter.export(&entries(&[50, 120, 30]), &path).unwrap();
        assert_eq!(summary.frame_count, 3);
        assert_eq!(summary.palettes, 2);
        assert_eq!(summary.total_duration_ms, 200);
        assert!(!dir.join("out.gif.part").exists());

        let file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
        let decoder = image::codecs::gif::GifDecoder::new(file).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        let delays: Vec<u32> = frames
            .iter()
            .map(|f| {
                let (numer, denom) = f.delay().numer_denom_ms();
                numer / denom
            })
            .collect();
        assert_eq!(delays, vec![50, 120, 30]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_gif_loops_forever() {
        let (bytes, _) = Exporter::new()
            .encode(ExportFormat::Gif, &entries(&[10, 10]))
            .unwrap();
        // NETSCAPE2.0 application block with a loop count of zero
        let marker = b"NETSCAPE2.0\x03\x01\x00\x00";
        assert!(bytes.windows(marker.len()).any(|w| w == marker));
    }

    #[test]
    fn test_webp_is_animated() {
        let (bytes, palettes) = Exporter::new()
            .encode(ExportFormat::WebP, &entries(&[40, 60]))
            .unwrap();
        assert_eq!(palettes, 0);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        assert!(bytes.windows(4).any(|w| w == b"ANIM"));
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = temp_dir();
        let path = dir.join("out.png");
        let err = Exporter::new().export(&entries(&[10]), &path).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedInput(_)));
        assert!(!path.exists());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let err = Exporter::new().encode(ExportFormat::Gif, &[]).unwrap_err();
        assert!(matches!(err, EngineError::EmptySequence));
    }

    #[test]
    fn test_mismatched_geometry_rejected() {
        let dir = temp_dir();
        let path = dir.join("out.gif");
        let mut frames = entries(&[10]);
        frames.push(TimedFrame::new(Frame::solid(4, 4, [0, 0, 0, 255]), 10));

        let err = Exporter::new().export(&frames, &path).unwrap_err();
        assert!(matches!(err, EngineError::EncodeFailure(_)));
        assert!(!path.exists());
        std::fs::remove_dir_all(dir).ok();
    }
}
