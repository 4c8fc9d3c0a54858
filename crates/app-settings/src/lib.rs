use core_types::{CanvasSize, Checkerboard, Rgb};
use engine::mask::{DEFAULT_BRUSH_SIZE, DEFAULT_TOLERANCE, MAX_BRUSH_SIZE, MAX_TOLERANCE, MIN_BRUSH_SIZE};
use engine::EditorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppSettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings path unavailable")]
    MissingSettingsPath,
}

pub type Result<T> = std::result::Result<T, AppSettingsError>;

/// Persisted editor preferences. Missing fields fall back to defaults so an
/// older settings file keeps loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub canvas: CanvasSize,
    pub default_tolerance: u8,
    pub brush_size: u32,
    pub checkerboard: Checkerboard,
    pub last_source: Option<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            default_tolerance: DEFAULT_TOLERANCE,
            brush_size: DEFAULT_BRUSH_SIZE,
            checkerboard: Checkerboard::default(),
            last_source: None,
        }
    }
}

impl EditorSettings {
    pub fn load() -> Result<Self> {
        load_impl()
    }

    pub fn save(&self) -> Result<()> {
        save_impl(self)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn get_last_source(&self) -> Option<PathBuf> {
        self.last_source.clone()
    }

    pub fn set_last_source(&mut self, path: PathBuf) {
        self.last_source = Some(path);
    }

    /// Engine options with out-of-range values pulled back into range.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            canvas: self.canvas.clamped(),
            checkerboard: self.checkerboard,
            default_tolerance: self.default_tolerance.min(MAX_TOLERANCE),
            brush_size: self.brush_size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
            initial_target: Rgb::WHITE,
        }
    }
}

#[cfg(target_os = "windows")]
fn load_impl() -> Result<EditorSettings> {
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ};
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key = hkcu
        .open_subkey_with_flags("Software\\SpecimenDigitizer", KEY_READ)
        .ok();

    if let Some(key) = key {
        if let Ok(payload) = key.get_value::<String, _>("EditorSettings") {
            return Ok(serde_json::from_str(&payload)?);
        }
    }

    Ok(EditorSettings::default())
}

#[cfg(target_os = "windows")]
fn save_impl(settings: &EditorSettings) -> Result<()> {
    use winreg::enums::{HKEY_CURRENT_USER, KEY_WRITE};
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu.create_subkey_with_flags("Software\\SpecimenDigitizer", KEY_WRITE)?;
    let payload = serde_json::to_string(settings)?;
    key.set_value("EditorSettings", &payload)?;
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn load_impl() -> Result<EditorSettings> {
    EditorSettings::load_from(&settings_file_path()?)
}

#[cfg(not(target_os = "windows"))]
fn save_impl(settings: &EditorSettings) -> Result<()> {
    settings.save_to(&settings_file_path()?)
}

#[cfg(target_os = "macos")]
fn settings_file_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or(AppSettingsError::MissingSettingsPath)?;
    let mut path = base.home_dir().to_path_buf();
    path.push("Library");
    path.push("Preferences");
    path.push("org.specimen-digitizer");
    path.push("settings.json");
    Ok(path)
}

#[cfg(all(not(target_os = "macos"), not(target_os = "windows")))]
fn settings_file_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or(AppSettingsError::MissingSettingsPath)?;
    let mut path = base.config_dir().to_path_buf();
    path.push("specimen-digitizer");
    path.push("settings.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = EditorSettings::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, EditorSettings::default());
        assert_eq!(settings.canvas, CanvasSize::new(600, 600));
        assert_eq!(settings.default_tolerance, 20);
        assert_eq!(settings.brush_size, 20);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = EditorSettings {
            canvas: CanvasSize::new(400, 300),
            default_tolerance: 35,
            ..EditorSettings::default()
        };
        settings.set_last_source(PathBuf::from("/photos/beetle.jpg"));
        settings.save_to(&path).unwrap();

        let loaded = EditorSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.get_last_source(), Some(PathBuf::from("/photos/beetle.jpg")));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "brush_size": 40 }"#).unwrap();

        let loaded = EditorSettings::load_from(&path).unwrap();
        assert_eq!(loaded.brush_size, 40);
        assert_eq!(loaded.canvas, CanvasSize::default());
        assert_eq!(loaded.checkerboard, Checkerboard::default());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            EditorSettings::load_from(&path),
            Err(AppSettingsError::Json(_))
        ));
    }

    #[test]
    fn editor_options_are_clamped() {
        let settings = EditorSettings {
            canvas: CanvasSize::new(0, 250),
            default_tolerance: 180,
            brush_size: 500,
            ..EditorSettings::default()
        };
        let options = settings.editor_options();
        assert_eq!(options.canvas, CanvasSize::new(1, 250));
        assert_eq!(options.default_tolerance, 100);
        assert_eq!(options.brush_size, 80);
    }

    #[test]
    fn oversized_canvas_is_capped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "canvas": { "width": 100000, "height": 100000 } }"#).unwrap();

        let options = EditorSettings::load_from(&path).unwrap().editor_options();
        assert_eq!(
            options.canvas,
            CanvasSize::new(CanvasSize::MAX_EDGE, CanvasSize::MAX_EDGE)
        );
    }
}
