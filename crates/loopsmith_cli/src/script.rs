// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit scripts.
//!
//! A script is a RON list of [`EditCommand`] values, for example:
//!
//! ```ron
//! [
//!     Resize(240),
//!     Select(index: 0),
//!     Select(index: 3, mode: Range),
//!     AdjustSelectedDuration(40),
//!     Pendulum,
//! ]
//! ```

use crate::error::CliError;
use loopsmith_engine::{EditCommand, Editor, Slot};
use std::path::Path;

/// Parse a script from RON text
pub fn parse_script(text: &str, path: &Path) -> Result<Vec<EditCommand>, CliError> {
    ron::from_str(text).map_err(|source| CliError::Script {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a script file
pub fn load_script(path: &Path) -> Result<Vec<EditCommand>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ScriptIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text, path)
}

/// Apply every command to the primary slot, stopping at the first failure.
///
/// Returns how many commands changed the sequence.
pub fn run_script(editor: &mut Editor, commands: Vec<EditCommand>) -> Result<usize, CliError> {
    let total = commands.len();
    let mut changed = 0;

    for (step, command) in commands.into_iter().enumerate() {
        let label = command.label();
        let outcome = editor
            .apply(Slot::Primary, command)
            .map_err(|source| CliError::ScriptStep {
                step: step + 1,
                command: label,
                source,
            })?;
        if outcome.changed {
            changed += 1;
        }
        if let Some(report) = outcome.composition {
            tracing::info!(mode = report.mode.name(), frames = report.frame_count, "Script composed sequences");
        }
    }

    tracing::info!(total, changed, "Script finished");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopsmith_engine::{EngineError, Frame, SelectMode};

    fn editor() -> Editor {
        let mut editor = Editor::default();
        editor.load_frames(
            Slot::Primary,
            (0..4u8).map(|i| (Frame::solid(10, 5, [i * 60, 0, 0, 255]), 100)),
        );
        editor
    }

    #[test]
    fn test_parse_script() {
        let commands = parse_script(
            "[Resize(240), Select(index: 3, mode: Range), Pendulum]",
            Path::new("s.ron"),
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                EditCommand::Resize(240),
                EditCommand::Select {
                    index: 3,
                    mode: SelectMode::Range
                },
                EditCommand::Pendulum,
            ]
        );
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_script("[Explode]", Path::new("bad.ron")).unwrap_err();
        assert!(matches!(err, CliError::Script { .. }));
        assert!(err.to_string().contains("bad.ron"));
    }

    #[test]
    fn test_run_script() {
        let mut editor = editor();
        let commands = vec![
            EditCommand::Select {
                index: 1,
                mode: SelectMode::Single,
            },
            EditCommand::AdjustSelectedDuration(-40),
            EditCommand::Duplicate(0),
            EditCommand::Delete(99),
        ];
        let changed = run_script(&mut editor, commands).unwrap();
        assert_eq!(changed, 3);
        assert_eq!(editor.sequence(Slot::Primary).durations(), vec![100, 100, 60, 100, 100]);
    }

    #[test]
    fn test_failing_step_is_reported() {
        let mut editor = editor();
        let err = run_script(&mut editor, vec![EditCommand::Reverse, EditCommand::Merge]).unwrap_err();
        assert!(matches!(
            err,
            CliError::ScriptStep {
                step: 2,
                source: EngineError::CompositionPrecondition(_),
                ..
            }
        ));
    }
}
