// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback ticker thread.
//!
//! Locks the shared editor once per interval and advances the primary
//! sequence. Edits hold the same lock for their whole duration, so a tick
//! always sees a sequence between edits.

use loopsmith_engine::{Editor, Slot};
use parking_lot::Mutex;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle to a running ticker
pub struct PlaybackTicker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<u64>,
}

impl PlaybackTicker {
    /// Start ticking `editor` at its configured playback interval
    pub fn spawn(editor: Arc<Mutex<Editor>>) -> std::io::Result<Self> {
        let interval = editor.lock().playback().interval();
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("loopsmith-playback".to_string())
            .spawn(move || ticker_loop(&editor, &stop_rx, interval))?;

        Ok(Self { stop_tx, handle })
    }

    /// Stop the thread and return how many frames it advanced
    pub fn stop(self) -> u64 {
        let _ = self.stop_tx.send(());
        match self.handle.join() {
            Ok(ticks) => ticks,
            Err(_) => {
                tracing::error!("Playback thread panicked");
                0
            }
        }
    }
}

fn ticker_loop(editor: &Mutex<Editor>, stop_rx: &mpsc::Receiver<()>, interval: Duration) -> u64 {
    let mut ticks = 0;
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if let Some(index) = editor.lock().tick() {
                    ticks += 1;
                    tracing::trace!(frame = index, "Tick");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    ticks
}

/// Play the primary sequence for `duration`, then pause.
///
/// Returns the number of frames advanced.
pub fn preview(editor: &Arc<Mutex<Editor>>, duration: Duration) -> std::io::Result<u64> {
    {
        let mut editor = editor.lock();
        if !editor.playback().is_playing() {
            editor.toggle_playback();
        }
    }

    let ticker = PlaybackTicker::spawn(Arc::clone(editor))?;
    std::thread::sleep(duration);
    let ticks = ticker.stop();

    let mut editor = editor.lock();
    editor.toggle_playback();
    tracing::info!(
        ticks,
        frame = editor.sequence(Slot::Primary).current_index() + 1,
        "Preview finished"
    );
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopsmith_engine::{EngineSettings, Frame};

    fn shared_editor(interval_ms: u64) -> Arc<Mutex<Editor>> {
        let mut editor = Editor::new(EngineSettings {
            playback_interval_ms: interval_ms,
            ..EngineSettings::default()
        });
        editor.load_frames(
            Slot::Primary,
            (0..3u8).map(|i| (Frame::solid(2, 2, [i, i, i, 255]), 10)),
        );
        Arc::new(Mutex::new(editor))
    }

    #[test]
    fn test_preview_advances_and_pauses() {
        let editor = shared_editor(5);
        let ticks = preview(&editor, Duration::from_millis(100)).unwrap();
        assert!(ticks > 0);

        let editor = editor.lock();
        assert!(!editor.playback().is_playing());
        assert_eq!(editor.sequence(Slot::Primary).current_index() as u64, ticks % 3);
    }

    #[test]
    fn test_ticker_idle_while_paused() {
        let editor = shared_editor(5);
        let ticker = PlaybackTicker::spawn(Arc::clone(&editor)).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(ticker.stop(), 0);
        assert_eq!(editor.lock().sequence(Slot::Primary).current_index(), 0);
    }
}
