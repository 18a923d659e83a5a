// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background export worker.
//!
//! Export jobs carry their own copy of the frames, so encoding never touches
//! the live sequence. Jobs run one at a time in submission order and cannot
//! be cancelled once queued.

use crate::error::CliError;
use loopsmith_engine::{ExportOptions, ExportSummary, Exporter, TimedFrame};
use std::path::PathBuf;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for an export job
pub type JobId = Uuid;

/// One export request
#[derive(Debug)]
pub struct ExportJob {
    /// Job identifier
    pub id: JobId,
    /// Destination file
    pub path: PathBuf,
    /// Frames and durations to write
    pub entries: Vec<TimedFrame>,
    /// Quantization tunables
    pub options: ExportOptions,
}

/// Finished export
#[derive(Debug)]
pub struct ExportOutcome {
    /// Job this belongs to
    pub id: JobId,
    /// Summary, or why the export failed
    pub result: loopsmith_engine::Result<ExportSummary>,
}

/// Export worker handle
pub struct ExportWorker {
    /// Channel for sending export jobs
    job_tx: Option<mpsc::UnboundedSender<ExportJob>>,
    /// Channel for receiving finished exports
    result_rx: mpsc::UnboundedReceiver<ExportOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl ExportWorker {
    /// Start the worker thread
    pub fn spawn() -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let handle = std::thread::Builder::new()
            .name("loopsmith-export".to_string())
            .spawn(move || export_worker(job_rx, result_tx))?;

        Ok(Self {
            job_tx: Some(job_tx),
            result_rx,
            handle: Some(handle),
        })
    }

    /// Queue an export of `entries` to `path`
    pub fn submit(
        &self,
        path: PathBuf,
        entries: Vec<TimedFrame>,
        options: ExportOptions,
    ) -> Result<JobId, CliError> {
        let id = Uuid::new_v4();
        let job = ExportJob {
            id,
            path,
            entries,
            options,
        };
        tracing::debug!(job = %id, path = %job.path.display(), frames = job.entries.len(), "Queued export");

        self.job_tx
            .as_ref()
            .ok_or(CliError::WorkerStopped)?
            .send(job)
            .map_err(|_| CliError::WorkerStopped)?;
        Ok(id)
    }

    /// Block until the next export finishes
    pub fn wait(&mut self) -> Result<ExportOutcome, CliError> {
        self.result_rx.blocking_recv().ok_or(CliError::WorkerStopped)
    }

    /// Close the queue and wait for the thread to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Export thread panicked");
            }
        }
    }
}

impl Drop for ExportWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread that encodes queued jobs
fn export_worker(
    mut job_rx: mpsc::UnboundedReceiver<ExportJob>,
    result_tx: mpsc::UnboundedSender<ExportOutcome>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create export runtime: {e}");
            return;
        }
    };

    rt.block_on(async {
        while let Some(job) = job_rx.recv().await {
            let outcome = run_job(job).await;
            if result_tx.send(outcome).is_err() {
                break; // Channel closed
            }
        }
    });
}

async fn run_job(job: ExportJob) -> ExportOutcome {
    let ExportJob {
        id,
        path,
        entries,
        options,
    } = job;

    let encoded = tokio::task::spawn_blocking(move || {
        Exporter::with_options(options).export(&entries, &path)
    })
    .await;

    let result = match encoded {
        Ok(result) => result,
        Err(e) => Err(loopsmith_engine::EngineError::EncodeFailure(format!(
            "export task failed: {e}"
        ))),
    };
    if let Err(e) = &result {
        tracing::warn!(job = %id, "Export failed: {e}");
    }
    ExportOutcome { id, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopsmith_engine::{EngineError, Frame};

    fn entries() -> Vec<TimedFrame> {
        (0..3u8)
            .map(|i| TimedFrame::new(Frame::solid(6, 6, [i * 80, 20, 20, 255]), 50))
            .collect()
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loopsmith-worker-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_export_job_completes() {
        let dir = temp_dir();
        let path = dir.join("out.gif");
        let mut worker = ExportWorker::spawn().unwrap();

        let id = worker.submit(path.clone(), entries(), ExportOptions::default()).unwrap();
        let outcome = worker.wait().unwrap();
        assert_eq!(outcome.id, id);
        let summary = outcome.result.unwrap();
        assert_eq!(summary.frame_count, 3);
        assert_eq!(summary.total_duration_ms, 150);
        assert!(path.exists());

        worker.shutdown();
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_jobs_report_in_order() {
        let dir = temp_dir();
        let mut worker = ExportWorker::spawn().unwrap();

        let first = worker
            .submit(dir.join("a.webp"), entries(), ExportOptions::default())
            .unwrap();
        let second = worker
            .submit(dir.join("b.bmp"), entries(), ExportOptions::default())
            .unwrap();

        let outcome = worker.wait().unwrap();
        assert_eq!(outcome.id, first);
        assert!(outcome.result.is_ok());

        let outcome = worker.wait().unwrap();
        assert_eq!(outcome.id, second);
        assert!(matches!(outcome.result, Err(EngineError::UnsupportedInput(_))));
        assert!(!dir.join("b.bmp").exists());

        std::fs::remove_dir_all(dir).ok();
    }
}
