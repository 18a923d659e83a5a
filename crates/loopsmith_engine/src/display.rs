// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping between on-screen preview coordinates and image pixels.
//!
//! The preview shows the current frame scaled to fit its viewport and
//! centered. A rubber-band rectangle drawn on the preview has to go through
//! the same scale and offset in reverse before it can crop pixels.

use crate::error::{EngineError, Result};
use crate::frame::{FrameSize, PixelRect};
use serde::{Deserialize, Serialize};

/// Rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl ScreenRect {
    /// Create a new screen rectangle
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two corner points, in any order
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let (left, right) = (a.0.min(b.0), a.0.max(b.0));
        let (top, bottom) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top))
    }

    /// Whether both sides reach `min_size`
    pub fn is_at_least(&self, min_size: u32) -> bool {
        let min = i64::from(min_size);
        i64::from(self.width) >= min && i64::from(self.height) >= min
    }
}

/// Fit-and-center transform of one image inside a viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Screen pixels per image pixel
    pub scale: f64,
    /// Horizontal centering offset
    pub offset_x: f64,
    /// Vertical centering offset
    pub offset_y: f64,
}

impl DisplayTransform {
    /// Compute the transform for an image of `image` size shown in a
    /// `viewport_width` x `viewport_height` area
    pub fn fit(viewport_width: u32, viewport_height: u32, image: FrameSize) -> Result<Self> {
        if viewport_width == 0 || viewport_height == 0 {
            return Err(EngineError::InvalidSelection(format!(
                "viewport has no area ({viewport_width} x {viewport_height})"
            )));
        }
        if image.width == 0 || image.height == 0 {
            return Err(EngineError::EmptySequence);
        }

        let scale = (viewport_width as f64 / image.width as f64)
            .min(viewport_height as f64 / image.height as f64);
        let offset_x = (viewport_width as f64 - image.width as f64 * scale) / 2.0;
        let offset_y = (viewport_height as f64 - image.height as f64 * scale) / 2.0;

        Ok(Self {
            viewport_width,
            viewport_height,
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Convert a screen x coordinate to an image column (not clamped)
    fn image_x(&self, x: i64) -> i64 {
        ((x as f64 - self.offset_x) / self.scale).trunc() as i64
    }

    /// Convert a screen y coordinate to an image row (not clamped)
    fn image_y(&self, y: i64) -> i64 {
        ((y as f64 - self.offset_y) / self.scale).trunc() as i64
    }

    /// Translate a screen rectangle into image pixels, clamped to `image`
    pub fn to_pixel_rect(&self, rect: ScreenRect, image: FrameSize) -> PixelRect {
        let clamp_x = |v: i64| v.clamp(0, i64::from(image.width)) as u32;
        let clamp_y = |v: i64| v.clamp(0, i64::from(image.height)) as u32;

        let (x, y) = (i64::from(rect.x), i64::from(rect.y));
        let left = clamp_x(self.image_x(x));
        let top = clamp_y(self.image_y(y));
        let right = clamp_x(self.image_x(x + i64::from(rect.width)));
        let bottom = clamp_y(self.image_y(y + i64::from(rect.height)));

        PixelRect::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top))
            .clamped_to(image)
    }
}
