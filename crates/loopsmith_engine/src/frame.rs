// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame buffers and the pixel operations the editor performs on them.
//!
//! A [`Frame`] never changes after it is built. Every pixel edit
//! (crop, resize, composite) produces a new buffer, so history snapshots
//! holding an older frame can never observe the edit.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FrameSize {
    /// Create a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of this size scaled to `target_height`, keeping the aspect ratio.
    ///
    /// The ratio is taken as height over width and the result is rounded
    /// half away from zero. Never returns zero.
    pub fn width_at_height(&self, target_height: u32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return target_height.max(1);
        }
        let aspect_ratio = self.height as f64 / self.width as f64;
        ((target_height as f64 / aspect_ratio).round() as u32).max(1)
    }

    /// Largest size with the same aspect ratio that fits in `max_dimension`.
    ///
    /// Returns `self` unchanged when it already fits.
    pub fn fit_within(&self, max_dimension: u32) -> FrameSize {
        if self.width <= max_dimension && self.height <= max_dimension {
            return *self;
        }
        let ratio = self.width as f64 / self.height as f64;
        if ratio >= 1.0 {
            let height = ((max_dimension as f64 / ratio).round() as u32).max(1);
            FrameSize::new(max_dimension, height)
        } else {
            let width = ((max_dimension as f64 * ratio).round() as u32).max(1);
            FrameSize::new(width, max_dimension)
        }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

/// One decoded still image of an animation.
///
/// The pixel data is shared behind an [`Arc`]; cloning a frame is cheap and
/// safe because the buffer is never mutated in place.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Arc<RgbaImage>,
}

impl Frame {
    /// Wrap an RGBA buffer
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// A frame filled with a single color
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Frame dimensions
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width(), self.height())
    }

    /// Borrow the pixel buffer
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Whether two frames share the same buffer
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Resample to an exact size with a Lanczos3 filter
    pub fn resized(&self, size: FrameSize) -> Frame {
        if size == self.size() {
            return self.clone();
        }
        Frame::new(imageops::resize(
            self.pixels.as_ref(),
            size.width,
            size.height,
            FilterType::Lanczos3,
        ))
    }

    /// Copy out a rectangular region; the region must lie inside the frame
    pub fn cropped(&self, rect: PixelRect) -> Frame {
        Frame::new(
            imageops::crop_imm(self.pixels.as_ref(), rect.x, rect.y, rect.width, rect.height)
                .to_image(),
        )
    }

    /// Downscale to fit in `max_dimension`, keeping the aspect ratio
    pub fn fit_within(&self, max_dimension: u32) -> Frame {
        self.resized(self.size().fit_within(max_dimension))
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.size() == other.size() && self.pixels.as_raw() == other.pixels.as_raw())
    }
}

impl Eq for Frame {}

/// Rectangle in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelRect {
    /// Create a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Clamp to the bounds of `size`, keeping at least one pixel each way
    pub fn clamped_to(&self, size: FrameSize) -> PixelRect {
        let left = self.x.min(size.width.saturating_sub(1));
        let top = self.y.min(size.height.saturating_sub(1));
        let right = self.x.saturating_add(self.width).min(size.width).max(left + 1);
        let bottom = self.y.saturating_add(self.height).min(size.height).max(top + 1);
        PixelRect::new(left, top, right - left, bottom - top)
    }
}

/// Solid-color canvas that frames are composited onto
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a canvas filled with `fill`
    pub fn new(size: FrameSize, fill: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, Rgba(fill)),
        }
    }

    /// Alpha-composite `frame` with its top-left corner at (`x`, `y`)
    pub fn draw(&mut self, frame: &Frame, x: i64, y: i64) {
        imageops::overlay(&mut self.image, frame.pixels(), x, y);
    }

    /// Finish into a frame
    pub fn into_frame(self) -> Frame {
        Frame::new(self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_at_height_rounds() {
        assert_eq!(FrameSize::new(3, 2).width_at_height(4), 6);
        // 4:3 at height 10 is 13.33
        assert_eq!(FrameSize::new(4, 3).width_at_height(10), 13);
        assert_eq!(FrameSize::new(100, 50).width_at_height(100), 200);
        assert_eq!(FrameSize::new(1, 1000).width_at_height(10), 1);
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(FrameSize::new(100, 50).fit_within(1920), FrameSize::new(100, 50));
        assert_eq!(FrameSize::new(3840, 1080).fit_within(1920), FrameSize::new(1920, 540));
        assert_eq!(FrameSize::new(500, 4000).fit_within(1000), FrameSize::new(125, 1000));
    }

    #[test]
    fn test_clamp_rect() {
        let size = FrameSize::new(10, 10);
        assert_eq!(PixelRect::new(2, 3, 4, 4).clamped_to(size), PixelRect::new(2, 3, 4, 4));
        assert_eq!(PixelRect::new(8, 8, 10, 10).clamped_to(size), PixelRect::new(8, 8, 2, 2));
        assert_eq!(PixelRect::new(20, 20, 5, 5).clamped_to(size), PixelRect::new(9, 9, 1, 1));
    }

    #[test]
    fn test_crop_and_resize_are_new_buffers() {
        let frame = Frame::solid(10, 8, [255, 0, 0, 255]);
        let cropped = frame.cropped(PixelRect::new(1, 1, 4, 3));
        assert_eq!(cropped.size(), FrameSize::new(4, 3));
        assert!(!cropped.ptr_eq(&frame));

        let resized = frame.resized(FrameSize::new(20, 16));
        assert_eq!(resized.size(), FrameSize::new(20, 16));
        assert_eq!(frame.size(), FrameSize::new(10, 8));
    }

    #[test]
    fn test_canvas_composites_over_fill() {
        let mut canvas = Canvas::new(FrameSize::new(4, 2), [0, 0, 0, 255]);
        canvas.draw(&Frame::solid(2, 2, [0, 255, 0, 255]), 2, 0);
        canvas.draw(&Frame::solid(2, 2, [0, 0, 255, 0]), 0, 0);
        let frame = canvas.into_frame();
        assert_eq!(frame.pixels().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(frame.pixels().get_pixel(3, 1).0, [0, 255, 0, 255]);
    }
}
