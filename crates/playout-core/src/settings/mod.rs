//! Server Settings Persistence
//!
//! Provides persistent server settings with:
//! - Atomic file writes (temp file + rename)
//! - Advisory locking against concurrent writers
//! - Defaults for every missing or invalid value

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::unit::Profile;
use crate::{Frame, SettingsResult, MAX_UNITS};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Prefix of every resource path; empty or ending in `/`
    #[serde(default)]
    pub root_dir: String,

    /// Units instantiated at startup
    #[serde(default = "default_units")]
    pub units: usize,

    #[serde(default)]
    pub profile: ProfileSettings,

    #[serde(default)]
    pub media: MediaSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_units() -> usize {
    4
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            root_dir: String::new(),
            units: default_units(),
            profile: ProfileSettings::default(),
            media: MediaSettings::default(),
        }
    }
}

impl ServerSettings {
    /// Clamps values so loaded state is always usable
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;
        self.units = self.units.clamp(1, MAX_UNITS as usize);

        let root = self.root_dir.trim();
        self.root_dir = if root.is_empty() || root.ends_with('/') {
            root.to_string()
        } else {
            format!("{root}/")
        };

        if self.profile.name.trim().is_empty() {
            self.profile.name = default_profile_name();
        }
        if !self.profile.fps.is_finite() || self.profile.fps <= 0.0 {
            self.profile.fps = default_fps();
        }
        self.media.default_length = self.media.default_length.max(1);
    }

    /// Consumer profile the units render with
    pub fn unit_profile(&self) -> Profile {
        Profile {
            name: self.profile.name.clone(),
            fps: self.profile.fps,
        }
    }
}

/// Consumer profile settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    #[serde(default = "default_profile_name")]
    pub name: String,

    #[serde(default = "default_fps")]
    pub fps: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            fps: default_fps(),
        }
    }
}

fn default_profile_name() -> String {
    Profile::default().name
}

fn default_fps() -> f64 {
    Profile::default().fps
}

/// Media probing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSettings {
    /// Length in frames reported for probed files
    #[serde(default = "default_length")]
    pub default_length: Frame,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            default_length: default_length(),
        }
    }
}

fn default_length() -> Frame {
    250
}

/// Loads and saves [`ServerSettings`] at a fixed path
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Manager for `settings.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path.with_extension("json.lock")
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> SettingsResult<T>,
    ) -> SettingsResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Loads settings, falling back to defaults when the file is absent or
    /// unreadable
    pub fn load(&self) -> ServerSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(ServerSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings: ServerSettings = serde_json::from_str(&content)?;
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                ServerSettings::default()
            }
        }
    }

    /// Saves settings atomically and returns the normalized copy written
    pub fn save(&self, settings: &ServerSettings) -> SettingsResult<ServerSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();
            let content = serde_json::to_string_pretty(&normalized)?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }
            if let Err(e) = self.replace_with(&temp_path, &content) {
                let _ = fs::remove_file(&temp_path);
                return Err(e.into());
            }

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Writes `content` to `temp_path` and renames it over the settings file
    fn replace_with(&self, temp_path: &Path, content: &str) -> io::Result<()> {
        let mut file = fs::File::create(temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // rename does not replace an existing file on Windows
        if cfg!(windows) && self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
        }
        fs::rename(temp_path, &self.settings_path)
    }
}
