// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use loopsmith_engine::CompositionMode;
use std::path::PathBuf;

/// Headless editor for animated GIF and WebP loops
#[derive(Parser, Debug)]
#[command(name = "loopsmith", author, version, about, long_about = None)]
pub struct Args {
    /// Engine settings file (RON); defaults are used when omitted
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (default: info, -v: debug, -vv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a file and print its summary
    Info {
        /// GIF, WebP, PNG or JPEG file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load, edit and export an animation
    Edit(EditArgs),
}

/// Arguments of `loopsmith edit`
#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Sequence to edit
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Second sequence to combine with the first
    #[arg(long = "with", value_name = "FILE")]
    pub with: Option<PathBuf>,

    /// How the second sequence is combined
    #[arg(long, value_enum, default_value_t = ModeArg::Merge)]
    pub mode: ModeArg,

    /// RON list of edit commands applied in order
    #[arg(short = 's', long = "script", value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Run playback preview for this many milliseconds before exporting
    #[arg(long = "play-ms", value_name = "MS")]
    pub play_ms: Option<u64>,

    /// Destination (.gif or .webp)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,
}

/// Composition mode as typed on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Side by side, at the same time
    Merge,
    /// One after the other
    Concat,
}

impl From<ModeArg> for CompositionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Merge => CompositionMode::Merge,
            ModeArg::Concat => CompositionMode::Concatenate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_edit() {
        let args = Args::try_parse_from([
            "loopsmith", "-vv", "edit", "a.gif", "--with", "b.webp", "--mode", "concat",
            "--play-ms", "500", "-o", "out.webp",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 2);
        let Command::Edit(edit) = args.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.with, Some(PathBuf::from("b.webp")));
        assert_eq!(CompositionMode::from(edit.mode), CompositionMode::Concatenate);
        assert_eq!(edit.play_ms, Some(500));
        assert_eq!(edit.output, PathBuf::from("out.webp"));
    }

    #[test]
    fn test_parse_info_with_global_config() {
        let args = Args::try_parse_from(["loopsmith", "info", "a.png", "--json", "--config", "s.ron"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("s.ron")));
        assert!(matches!(args.command, Command::Info { json: true, .. }));
    }

    #[test]
    fn test_edit_requires_output() {
        assert!(Args::try_parse_from(["loopsmith", "edit", "a.gif"]).is_err());
    }
}
