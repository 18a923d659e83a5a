// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview playback state.
//!
//! The engine only steps frames; whoever owns the clock calls
//! [`PlaybackController::tick`] once per [`PlaybackController::interval`].

use crate::sequence::FrameSequence;
use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped at the first frame
    #[default]
    Stopped,
    /// Advancing on every tick
    Playing,
    /// Holding the current frame
    Paused,
}

impl PlaybackState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Play/pause control for the preview
#[derive(Debug, Clone)]
pub struct PlaybackController {
    /// Playback state
    pub state: PlaybackState,
    interval: Duration,
    ticks: u64,
}

impl PlaybackController {
    /// Create a stopped controller ticking every `interval_ms`
    pub fn new(interval_ms: u64) -> Self {
        Self {
            state: PlaybackState::Stopped,
            interval: Duration::from_millis(interval_ms.max(1)),
            ticks: 0,
        }
    }

    /// Time between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames advanced since playback last started
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Start playback
    pub fn play(&mut self) {
        if self.state == PlaybackState::Stopped {
            self.ticks = 0;
        }
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Toggle play/pause
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Stop playback and rewind `sequence` to its first frame
    pub fn stop(&mut self, sequence: &mut FrameSequence) {
        self.state = PlaybackState::Stopped;
        sequence.set_current(0);
    }

    /// Advance `sequence` by one frame if playing.
    ///
    /// Returns the new current index, or `None` when nothing moved.
    pub fn tick(&mut self, sequence: &mut FrameSequence) -> Option<usize> {
        if !self.is_playing() || sequence.is_empty() {
            return None;
        }
        self.ticks += 1;
        Some(sequence.advance_frame())
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(crate::settings::PLAYBACK_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn sequence(len: u8) -> FrameSequence {
        FrameSequence::from_frames((0..len).map(|i| (Frame::solid(2, 2, [i, 0, 0, 255]), 100)))
    }

    #[test]
    fn test_tick_only_while_playing() {
        let mut playback = PlaybackController::default();
        let mut seq = sequence(3);

        assert_eq!(playback.tick(&mut seq), None);
        playback.play();
        assert_eq!(playback.tick(&mut seq), Some(1));
        assert_eq!(playback.tick(&mut seq), Some(2));
        assert_eq!(playback.tick(&mut seq), Some(0));

        playback.pause();
        assert_eq!(playback.tick(&mut seq), None);
        assert_eq!(seq.current_index(), 0);
        assert_eq!(playback.ticks(), 3);
    }

    #[test]
    fn test_toggle_and_stop() {
        let mut playback = PlaybackController::new(40);
        let mut seq = sequence(4);
        assert_eq!(playback.interval(), Duration::from_millis(40));

        playback.toggle();
        assert!(playback.is_playing());
        playback.tick(&mut seq);
        playback.tick(&mut seq);
        playback.toggle();
        assert_eq!(playback.state, PlaybackState::Paused);

        playback.stop(&mut seq);
        assert_eq!(playback.state, PlaybackState::Stopped);
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn test_empty_sequence_never_ticks() {
        let mut playback = PlaybackController::default();
        let mut seq = FrameSequence::new();
        playback.play();
        assert_eq!(playback.tick(&mut seq), None);
    }
}
