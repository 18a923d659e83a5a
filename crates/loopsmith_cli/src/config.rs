// SPDX-License-Identifier: MIT OR Apache-2.0
//! Settings file loading.

use crate::error::CliError;
use loopsmith_engine::EngineSettings;
use std::path::Path;

/// Load engine settings from `path`, or use defaults when none is given
pub fn load_settings(path: Option<&Path>) -> Result<EngineSettings, CliError> {
    let Some(path) = path else {
        tracing::debug!("No settings file given, using defaults");
        return Ok(EngineSettings::default());
    };

    let settings = EngineSettings::load(path)?;
    tracing::info!(path = %path.display(), "Using settings file");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopsmith_engine::SettingsError;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("loopsmith-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        assert_eq!(load_settings(None).unwrap(), EngineSettings::default());
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_file("settings.ron", "(palette_chunk_size: 8, fill_color: (255, 255, 255, 255))");
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.palette_chunk_size, 8);
        assert_eq!(settings.fill_color, [255, 255, 255, 255]);
        assert_eq!(settings.history_capacity, 50);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let path = temp_file("settings.ron", "(palette_colors: 0)");
        assert!(matches!(
            load_settings(Some(&path)),
            Err(CliError::Settings(SettingsError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let path = std::env::temp_dir().join("loopsmith-no-such-settings.ron");
        assert!(matches!(
            load_settings(Some(&path)),
            Err(CliError::Settings(SettingsError::Io(_)))
        ));
    }
}
