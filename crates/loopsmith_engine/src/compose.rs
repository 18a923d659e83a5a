// SPDX-License-Identifier: MIT OR Apache-2.0
//! Folding two sequences into one.
//!
//! Two modes are supported:
//! - **Merge** plays both sequences at the same time, side by side. Their
//!   timelines are brought to the same total length and then swept together,
//!   emitting a new frame whenever either side changes.
//! - **Concatenate** plays one sequence after the other on a shared canvas.
//!
//! Before either mode the shorter (by pixel height) sequence is resized to
//! the taller one's height. On success the first sequence receives the
//! result and the second is reset.

use crate::error::{EngineError, Result};
use crate::frame::{Canvas, FrameSize};
use crate::sequence::{FrameSequence, TimedFrame};
use serde::{Deserialize, Serialize};

/// Default cap on either side of a merged canvas
pub const DEFAULT_MAX_COMPOSITE_DIMENSION: u32 = 1920;

/// Default canvas fill (opaque black)
pub const DEFAULT_FILL_COLOR: [u8; 4] = [0, 0, 0, 255];

/// How two sequences are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositionMode {
    /// Simultaneous, side by side
    Merge,
    /// One after the other
    Concatenate,
}

impl CompositionMode {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Merge => "Merge",
            Self::Concatenate => "Concatenate",
        }
    }
}

/// Tunables for composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionOptions {
    /// Color behind frames and in letterbox bars
    pub fill_color: [u8; 4],
    /// Merged canvases larger than this on either side are scaled down
    pub max_dimension: u32,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            fill_color: DEFAULT_FILL_COLOR,
            max_dimension: DEFAULT_MAX_COMPOSITE_DIMENSION,
        }
    }
}

/// Which input a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    /// The first sequence (receives the result)
    First,
    /// The second sequence (reset afterwards)
    Second,
}

/// Outcome of bringing two timelines to the same total length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Sequence whose durations were rescaled, if any
    pub rescaled: Option<Side>,
    /// Total the rescaled sequence was stretched towards
    pub target_total_ms: u64,
    /// Total the rescaled sequence actually reached
    pub rescaled_total_ms: u64,
    /// Fractional milliseconds dropped by rounding and not redistributed
    pub leftover_ms: f64,
}

/// Summary of a finished composition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionReport {
    /// Mode used
    pub mode: CompositionMode,
    /// Frames produced
    pub frame_count: usize,
    /// Total duration produced
    pub total_duration_ms: u64,
    /// Canvas size before any downscaling
    pub canvas: FrameSize,
    /// Duration reconciliation, for merges that needed one
    pub reconciliation: Option<Reconciliation>,
}

/// Round `value` up when its fraction is one half or more.
///
/// Returns the rounded integer and the fraction that was dropped, which is
/// zero when rounding went up. Fractions within 1e-4 of one half count as
/// one half.
pub fn round_half_up(value: f64) -> (u64, f64) {
    let integer = value.trunc();
    let fraction = value - integer;
    if fraction > 0.5 || (fraction - 0.5).abs() <= 1e-4 {
        (integer as u64 + 1, 0.0)
    } else {
        (integer as u64, fraction)
    }
}

/// Rescale the timeline with the smaller total so both totals match.
///
/// Each duration of the shorter timeline becomes
/// `round_half_up(long_total * d / short_total)`. The fractions dropped by
/// rounding are summed into [`Reconciliation::leftover_ms`] but are not put
/// back, so the rescaled total can miss the target by a few milliseconds.
pub fn reconcile_durations(first: &mut [u32], second: &mut [u32]) -> Reconciliation {
    let first_total: u64 = first.iter().map(|&d| u64::from(d)).sum();
    let second_total: u64 = second.iter().map(|&d| u64::from(d)).sum();

    let (side, short, short_total, long_total) = if first_total > second_total {
        (Side::Second, second, second_total, first_total)
    } else if second_total > first_total {
        (Side::First, first, first_total, second_total)
    } else {
        return Reconciliation {
            rescaled: None,
            target_total_ms: first_total,
            rescaled_total_ms: first_total,
            leftover_ms: 0.0,
        };
    };

    let mut leftover = 0.0;
    for duration in short.iter_mut() {
        let proportion = f64::from(*duration) / short_total as f64;
        let (rounded, fraction) = round_half_up(long_total as f64 * proportion);
        leftover += fraction;
        *duration = rounded.clamp(1, u64::from(u32::MAX)) as u32;
    }
    let rescaled_total = short.iter().map(|&d| u64::from(d)).sum();

    if rescaled_total != long_total {
        tracing::debug!(
            target_ms = long_total,
            actual_ms = rescaled_total,
            leftover,
            "Duration reconciliation drifted"
        );
    }

    Reconciliation {
        rescaled: Some(side),
        target_total_ms: long_total,
        rescaled_total_ms: rescaled_total,
        leftover_ms: leftover,
    }
}

/// Sizes of both sequences after matching heights.
///
/// The sequence with the smaller height takes the other's height and a width
/// that keeps its own aspect ratio.
pub fn common_geometry(first: FrameSize, second: FrameSize) -> (FrameSize, FrameSize) {
    let target_height = first.height.max(second.height);
    let fit = |size: FrameSize| {
        if size.height == target_height {
            size
        } else {
            FrameSize::new(size.width_at_height(target_height), target_height)
        }
    };
    (fit(first), fit(second))
}

fn check_populated(first: &FrameSequence, second: &FrameSequence) -> Result<(FrameSize, FrameSize)> {
    match (first.size(), second.size()) {
        (Some(a), Some(b)) => Ok((a, b)),
        (None, _) => Err(EngineError::CompositionPrecondition(
            "first sequence is empty".to_string(),
        )),
        (_, None) => Err(EngineError::CompositionPrecondition(
            "second sequence is empty".to_string(),
        )),
    }
}

/// Frames of `sequence`, resized to `size` when the first frame differs
fn fitted_entries(sequence: &FrameSequence, size: FrameSize) -> Vec<TimedFrame> {
    let needs_resize = sequence.size() != Some(size);
    sequence
        .entries()
        .iter()
        .map(|entry| {
            if needs_resize {
                TimedFrame::new(entry.frame.resized(size), entry.duration_ms)
            } else {
                entry.clone()
            }
        })
        .collect()
}

/// Repeat a one-frame sequence so it rides along `timeline`'s durations
fn broadcast(single: &TimedFrame, timeline: &[TimedFrame]) -> Vec<TimedFrame> {
    timeline
        .iter()
        .map(|entry| TimedFrame::new(single.frame.clone(), entry.duration_ms))
        .collect()
}

/// Play `first` and `second` side by side.
///
/// The result replaces `first`; `second` is reset.
pub fn merge(
    first: &mut FrameSequence,
    second: &mut FrameSequence,
    options: &CompositionOptions,
) -> Result<CompositionReport> {
    let (size_a, size_b) = check_populated(first, second)?;
    let (size_a, size_b) = common_geometry(size_a, size_b);

    let mut left = fitted_entries(first, size_a);
    let mut right = fitted_entries(second, size_b);

    let mut reconciliation = None;
    if left.len() == 1 {
        left = broadcast(&left[0], &right);
    } else if right.len() == 1 {
        right = broadcast(&right[0], &left);
    } else {
        let mut left_durations: Vec<u32> = left.iter().map(|e| e.duration_ms).collect();
        let mut right_durations: Vec<u32> = right.iter().map(|e| e.duration_ms).collect();
        let outcome = reconcile_durations(&mut left_durations, &mut right_durations);
        for (entry, duration) in left.iter_mut().zip(left_durations) {
            entry.duration_ms = duration;
        }
        for (entry, duration) in right.iter_mut().zip(right_durations) {
            entry.duration_ms = duration;
        }
        reconciliation = Some(outcome);
    }

    let canvas_size = FrameSize::new(size_a.width + size_b.width, size_a.height);
    let mut remaining_left: Vec<u32> = left.iter().map(|e| e.duration_ms).collect();
    let mut remaining_right: Vec<u32> = right.iter().map(|e| e.duration_ms).collect();
    let mut output = Vec::with_capacity(left.len().max(right.len()));

    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let mut canvas = Canvas::new(canvas_size, options.fill_color);
        canvas.draw(&left[i].frame, 0, 0);
        canvas.draw(&right[j].frame, i64::from(size_a.width), 0);
        let frame = canvas.into_frame().fit_within(options.max_dimension);

        let consumed = remaining_left[i].min(remaining_right[j]);
        remaining_left[i] -= consumed;
        remaining_right[j] -= consumed;
        if remaining_left[i] == 0 {
            i += 1;
        }
        if remaining_right[j] == 0 {
            j += 1;
        }

        output.push(TimedFrame::new(frame, consumed));
    }

    let report = CompositionReport {
        mode: CompositionMode::Merge,
        frame_count: output.len(),
        total_duration_ms: output.iter().map(|e| u64::from(e.duration_ms)).sum(),
        canvas: canvas_size,
        reconciliation,
    };
    tracing::info!(
        frames = report.frame_count,
        total_ms = report.total_duration_ms,
        canvas = %canvas_size,
        "Merged sequences"
    );

    first.replace_entries(output);
    second.reset();
    Ok(report)
}

/// Play `first` and then `second` on a shared, letterboxed canvas.
///
/// The result replaces `first`; `second` is reset.
pub fn concatenate(
    first: &mut FrameSequence,
    second: &mut FrameSequence,
    options: &CompositionOptions,
) -> Result<CompositionReport> {
    let (size_a, size_b) = check_populated(first, second)?;
    let (size_a, size_b) = common_geometry(size_a, size_b);
    let canvas_size = FrameSize::new(size_a.width.max(size_b.width), size_a.height);

    let output: Vec<TimedFrame> = fitted_entries(first, size_a)
        .into_iter()
        .chain(fitted_entries(second, size_b))
        .map(|entry| {
            if entry.frame.size() == canvas_size {
                return entry;
            }
            let mut canvas = Canvas::new(canvas_size, options.fill_color);
            let x = (i64::from(canvas_size.width) - i64::from(entry.frame.width())) / 2;
            canvas.draw(&entry.frame, x, 0);
            TimedFrame::new(canvas.into_frame(), entry.duration_ms)
        })
        .collect();

    let report = CompositionReport {
        mode: CompositionMode::Concatenate,
        frame_count: output.len(),
        total_duration_ms: output.iter().map(|e| u64::from(e.duration_ms)).sum(),
        canvas: canvas_size,
        reconciliation: None,
    };
    tracing::info!(
        frames = report.frame_count,
        total_ms = report.total_duration_ms,
        canvas = %canvas_size,
        "Concatenated sequences"
    );

    first.replace_entries(output);
    second.reset();
    Ok(report)
}

/// Combine two sequences with the given mode
pub fn compose(
    mode: CompositionMode,
    first: &mut FrameSequence,
    second: &mut FrameSequence,
    options: &CompositionOptions,
) -> Result<CompositionReport> {
    match mode {
        CompositionMode::Merge => merge(first, second, options),
        CompositionMode::Concatenate => concatenate(first, second, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn sequence(size: (u32, u32), durations: &[u32]) -> FrameSequence {
        FrameSequence::from_frames(
            durations
                .iter()
                .enumerate()
                .map(|(i, &d)| (Frame::solid(size.0, size.1, [i as u8 * 40, 100, 0, 255]), d)),
        )
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), (3, 0.0));
        assert_eq!(round_half_up(2.7), (3, 0.0));
        assert_eq!(round_half_up(2.49995), (3, 0.0));
        let (value, fraction) = round_half_up(2.25);
        assert_eq!(value, 2);
        assert!((fraction - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_reconcile_scales_shorter() {
        let mut a = vec![100, 100];
        let mut b = vec![30, 70];
        let outcome = reconcile_durations(&mut a, &mut b);
        assert_eq!(a, vec![100, 100]);
        assert_eq!(b, vec![60, 140]);
        assert_eq!(outcome.rescaled, Some(Side::Second));
        assert_eq!(outcome.rescaled_total_ms, 200);
    }

    #[test]
    fn test_reconcile_keeps_drift() {
        // 100 * 1/3 = 33.33 each: three fractions of 1/3 are dropped
        let mut a = vec![10, 10, 10];
        let mut b = vec![50, 50];
        let outcome = reconcile_durations(&mut a, &mut b);
        assert_eq!(a, vec![33, 33, 33]);
        assert_eq!(outcome.rescaled, Some(Side::First));
        assert_eq!(outcome.target_total_ms, 100);
        assert_eq!(outcome.rescaled_total_ms, 99);
        assert!((outcome.leftover_ms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reconcile_equal_totals_untouched() {
        let mut a = vec![40, 60];
        let mut b = vec![50, 50];
        let outcome = reconcile_durations(&mut a, &mut b);
        assert_eq!(outcome.rescaled, None);
        assert_eq!(a, vec![40, 60]);
    }

    #[test]
    fn test_common_geometry() {
        let (a, b) = common_geometry(FrameSize::new(40, 20), FrameSize::new(10, 40));
        assert_eq!(a, FrameSize::new(80, 40));
        assert_eq!(b, FrameSize::new(10, 40));
    }

    #[test]
    fn test_concatenate_example() {
        let mut a = sequence((20, 10), &[50, 50]);
        let mut b = sequence((10, 10), &[20, 20, 20]);
        let report = concatenate(&mut a, &mut b, &CompositionOptions::default()).unwrap();

        assert_eq!(a.len(), 5);
        assert_eq!(a.durations(), vec![50, 50, 20, 20, 20]);
        assert_eq!(a.total_duration_ms(), 160);
        assert_eq!(report.canvas, FrameSize::new(20, 10));
        assert!(a.frames().all(|f| f.size() == FrameSize::new(20, 10)));
        assert!(b.is_empty());
        assert_eq!(a.current_index(), 0);

        // Narrower frames are centered with fill bars
        let padded = a.frame(2).unwrap();
        assert_eq!(padded.pixels().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(padded.pixels().get_pixel(10, 5).0, [0, 100, 0, 255]);
    }

    #[test]
    fn test_concatenate_resizes_shorter_height() {
        let mut a = sequence((20, 10), &[10]);
        let mut b = sequence((20, 20), &[10]);
        concatenate(&mut a, &mut b, &CompositionOptions::default()).unwrap();
        assert!(a.frames().all(|f| f.size() == FrameSize::new(40, 20)));
    }

    #[test]
    fn test_merge_reconciles_durations() {
        let mut a = sequence((10, 10), &[100, 100]);
        let mut b = sequence((10, 10), &[30, 70]);
        let report = merge(&mut a, &mut b, &CompositionOptions::default()).unwrap();

        // B becomes [60, 140]; sweep cuts at 60, 100, 200
        assert_eq!(a.durations(), vec![60, 40, 100]);
        assert_eq!(a.total_duration_ms(), 200);
        assert!(a.len() >= 2);
        assert_eq!(report.canvas, FrameSize::new(20, 10));
        assert!(a.frames().all(|f| f.size() == FrameSize::new(20, 10)));
        assert!(b.is_empty());
    }

    #[test]
    fn test_merge_broadcasts_single_frame() {
        let mut a = sequence((10, 10), &[500]);
        let mut b = sequence((10, 10), &[10, 20, 30, 40]);
        let report = merge(&mut a, &mut b, &CompositionOptions::default()).unwrap();

        assert_eq!(a.len(), 4);
        assert_eq!(a.durations(), vec![10, 20, 30, 40]);
        assert!(report.reconciliation.is_none());

        let left: Vec<[u8; 4]> = a.frames().map(|f| f.pixels().get_pixel(0, 0).0).collect();
        assert!(left.iter().all(|&p| p == left[0]));
        let right: Vec<[u8; 4]> = a.frames().map(|f| f.pixels().get_pixel(15, 0).0).collect();
        assert_eq!(right[0], [0, 100, 0, 255]);
        assert_eq!(right[3], [120, 100, 0, 255]);
    }

    #[test]
    fn test_merge_resizes_to_common_height() {
        let mut a = sequence((40, 20), &[50, 50]);
        let mut b = sequence((10, 40), &[25, 25, 50]);
        let report = merge(&mut a, &mut b, &CompositionOptions::default()).unwrap();

        assert_eq!(report.canvas, FrameSize::new(90, 40));
        assert!(a.frames().all(|f| f.size() == FrameSize::new(90, 40)));
        assert_eq!(a.durations(), vec![25, 25, 50]);
        assert_eq!(report.total_duration_ms, 100);
    }

    #[test]
    fn test_merge_caps_canvas() {
        let mut a = sequence((30, 10), &[10, 10]);
        let mut b = sequence((30, 10), &[10, 10]);
        let options = CompositionOptions {
            max_dimension: 30,
            ..CompositionOptions::default()
        };
        merge(&mut a, &mut b, &options).unwrap();
        assert!(a.frames().all(|f| f.size() == FrameSize::new(30, 5)));
    }

    #[test]
    fn test_requires_two_populated() {
        let mut a = sequence((10, 10), &[10]);
        let mut b = FrameSequence::new();
        let err = merge(&mut a, &mut b, &CompositionOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::CompositionPrecondition(_)));
        assert_eq!(a.len(), 1);
    }
}
