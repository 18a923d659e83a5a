// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loopsmith - headless animated image editor
//!
//! Drives the editing engine from the command line:
//! - Inspect GIF, WebP, PNG and JPEG sources
//! - Merge or concatenate two animations
//! - Run RON edit scripts with full undo/redo support
//! - Preview playback and export to GIF or WebP
//!
//! ## Architecture
//!
//! The editor lives behind an `Arc<Mutex<_>>` shared with the playback
//! ticker thread. Exports run on a dedicated worker thread that receives
//! value copies of the frames over a channel.

mod cli;
mod config;
mod error;
mod script;
mod ticker;
mod worker;

use clap::Parser;
use cli::{Args, Command, EditArgs};
use error::CliError;
use loopsmith_engine::{Decoder, EngineSettings, Editor, Slot};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use worker::ExportWorker;

fn main() {
    let args = Args::parse();
    init_logging(args.verbosity);

    tracing::debug!("Starting Loopsmith v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Install the fmt subscriber; `-v` flags win over `RUST_LOG`
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives = format!("loopsmith_cli={level},loopsmith_engine={level}");

    let env_filter = if verbosity == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives))
    } else {
        EnvFilter::new(&directives)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let settings = config::load_settings(args.config.as_deref())?;
    match args.command {
        Command::Info { input, json } => info(&settings, &input, json),
        Command::Edit(edit) => edit_and_export(settings, edit),
    }
}

/// JSON shape of `loopsmith info --json`
#[derive(Serialize)]
struct InfoReport {
    path: PathBuf,
    #[serde(flatten)]
    info: loopsmith_engine::SequenceInfo,
    durations_ms: Vec<u32>,
}

fn info(settings: &EngineSettings, input: &Path, json: bool) -> Result<(), CliError> {
    let sequence = Decoder::with_default_duration(settings.default_frame_duration_ms).load(input)?;

    if json {
        let report = InfoReport {
            path: input.to_path_buf(),
            info: sequence.info(),
            durations_ms: sequence.durations(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", sequence.info());
    }
    Ok(())
}

fn edit_and_export(settings: EngineSettings, args: EditArgs) -> Result<(), CliError> {
    let mut editor = Editor::new(settings);
    editor.open(Slot::Primary, &args.input)?;

    if let Some(second) = &args.with {
        editor.open(Slot::Secondary, second)?;
        let outcome = editor.compose(args.mode.into())?;
        if let Some(drift) = outcome
            .composition
            .and_then(|report| report.reconciliation)
            .filter(|r| r.rescaled.is_some())
        {
            tracing::info!(
                target_ms = drift.target_total_ms,
                reached_ms = drift.rescaled_total_ms,
                leftover_ms = drift.leftover_ms,
                "Durations rescaled to a common length"
            );
        }
    }

    if let Some(path) = &args.script {
        let commands = script::load_script(path)?;
        script::run_script(&mut editor, commands)?;
    }

    let editor = Arc::new(Mutex::new(editor));
    if let Some(ms) = args.play_ms {
        ticker::preview(&editor, Duration::from_millis(ms)).map_err(loopsmith_engine::EngineError::from)?;
    }

    let (entries, options) = {
        let editor = editor.lock();
        println!("{}", editor.info(Slot::Primary));
        (editor.export_entries()?, editor.settings().export_options())
    };

    let mut worker = ExportWorker::spawn().map_err(loopsmith_engine::EngineError::from)?;
    let job = worker.submit(args.output, entries, options)?;
    let outcome = worker.wait()?;
    tracing::debug!(job = %outcome.id, same_job = outcome.id == job, "Export finished");
    let summary = outcome.result?;
    worker.shutdown();

    println!(
        "Wrote {} ({}, {} frames, {} ms, {} bytes)",
        summary.path.display(),
        summary.format,
        summary.frame_count,
        summary.total_duration_ms,
        summary.bytes_written
    );
    Ok(())
}
