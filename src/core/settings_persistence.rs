//! Settings persistence
//!
//! Saves and loads [`SessionSettings`] to/from a JSON file.
//!
//! # File Location
//!
//! Settings are stored in `settings.json` in the user's configuration
//! directory, e.g. `~/.config/chess_session/settings.json` on Linux. If no
//! configuration directory can be determined the current directory is used.
//!
//! # Error Handling
//!
//! - [`load_settings`] never fails: missing, unreadable or invalid files fall
//!   back to defaults with a warning
//! - [`try_load_settings`] and [`save_settings`] report errors to the caller

use crate::core::error::CoreResult;
use crate::core::resources::SessionSettings;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Resolve the default settings file path
pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "trilltino", "chess_session") {
        proj_dirs.config_dir().join(SETTINGS_FILENAME)
    } else {
        PathBuf::from(SETTINGS_FILENAME)
    }
}

/// Load and validate settings from `path`
pub fn try_load_settings(path: &Path) -> CoreResult<SessionSettings> {
    let contents = fs::read_to_string(path)?;
    let settings: SessionSettings = serde_json::from_str(&contents)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path`, falling back to defaults on any failure
pub fn load_settings(path: &Path) -> SessionSettings {
    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return SessionSettings::default();
    }

    match try_load_settings(path) {
        Ok(settings) => {
            info!("[SETTINGS] Loaded settings from {:?}", path);
            settings
        }
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                path, e
            );
            SessionSettings::default()
        }
    }
}

/// Write `settings` to `path`, creating the parent directory if needed
pub fn save_settings(settings: &SessionSettings, path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;
    use crate::game::components::PlayerSide;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("chess_session_{}_{}", name, std::process::id()))
            .join(SETTINGS_FILENAME)
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("round_trip");
        let settings = SessionSettings {
            starting_time_ms: 600_000,
            increment_ms: 5_000,
            player_side: PlayerSide::Black,
            ..Default::default()
        };

        save_settings(&settings, &path).unwrap();
        assert_eq!(try_load_settings(&path).unwrap(), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = scratch_path("missing");
        assert_eq!(load_settings(&path), SessionSettings::default());
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let path = scratch_path("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            try_load_settings(&path),
            Err(CoreError::SettingsSerialization(_))
        ));
        assert_eq!(load_settings(&path), SessionSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_out_of_range_values_use_defaults() {
        let path = scratch_path("out_of_range");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "starting_time_ms": -1 }"#).unwrap();

        assert_eq!(load_settings(&path), SessionSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
