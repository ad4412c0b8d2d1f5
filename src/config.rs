use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    assets::{AssetSources, FavoriteStore, ServiceMetadata, StaticCatalog},
    error::{ConfigError, Result},
};

/// Application directory name used under the platform data directory
pub const APP_DIR: &str = "effect-assets";

/// Main configuration for effect-assets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Definition sources and favorites
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Services the engine reports as built in
    #[serde(default)]
    pub engine: EngineConfig,

    /// Frame size and rate of the current project
    #[serde(default)]
    pub profile: Profile,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.profile.validate()?;
        Ok(())
    }

    /// Definition sources for the asset registry
    pub fn sources(&self) -> AssetSources {
        AssetSources {
            bundled_dirs: self.registry.bundled_dirs.clone(),
            user_dirs: self.registry.user_dirs.clone(),
            blacklist: self.registry.blacklist.clone(),
        }
    }

    /// Engine catalog described by the `[engine]` section
    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::from_services(self.engine.services.iter().cloned())
    }
}

impl FavoriteStore for Config {
    fn favorites(&self) -> Vec<String> {
        self.registry.favorites.clone()
    }

    fn set_favorites(&mut self, favorites: Vec<String>) {
        self.registry.favorites = favorites;
    }
}

/// Where effect definitions are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directories shipped with the application (lower precedence)
    #[serde(default)]
    pub bundled_dirs: Vec<PathBuf>,

    /// User directories (highest precedence)
    #[serde(default)]
    pub user_dirs: Vec<PathBuf>,

    /// Engine services to hide, one per line
    #[serde(default)]
    pub blacklist: Option<PathBuf>,

    /// Favorite effect ids
    #[serde(default)]
    pub favorites: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bundled_dirs: vec![PathBuf::from("data/effects")],
            user_dirs: default_user_dir().into_iter().collect(),
            blacklist: None,
            favorites: Vec::new(),
        }
    }
}

/// `<data dir>/effect-assets/effects`, when the platform has a data directory
pub fn default_user_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|mut p| {
        p.push(APP_DIR);
        p.push("effects");
        p
    })
}

/// Built-in engine services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub services: Vec<ServiceMetadata>,
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if let Some(index) = self.services.iter().position(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: format!("engine.services[{}].name", index),
                value: String::new()
            }.into());
        }

        Ok(())
    }
}

/// Project frame size and rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps_num: 25,
            fps_den: 1,
        }
    }
}

impl Profile {
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn fps(&self) -> f64 {
        f64::from(self.fps_num) / f64::from(self.fps_den)
    }

    /// Format a frame position as `HH:MM:SS:FF`
    pub fn timecode(&self, frame: i64) -> String {
        let fps = self.fps().round().max(1.0) as u64;
        let sign = if frame < 0 { "-" } else { "" };
        let frame = frame.unsigned_abs();
        let seconds = frame / fps;
        format!(
            "{}{:02}:{:02}:{:02}:{:02}",
            sign,
            seconds / 3600,
            (seconds / 60) % 60,
            seconds % 60,
            frame % fps
        )
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "profile.size".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        if self.fps_num == 0 || self.fps_den == 0 {
            return Err(ConfigError::InvalidValue {
                key: "profile.fps".to_string(),
                value: format!("{}/{}", self.fps_num, self.fps_den)
            }.into());
        }

        Ok(())
    }
}
