use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

const APP_NAME: &str = "media-rename";
const CONFIG_FILE: &str = "config.toml";
const LOG_DIR: &str = "logs";

/// Flat record of everything the editor persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub templates: TemplatesConfig,
    pub rename: RenameConfig,
    pub logging: LoggingConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub show_folder: String,
    pub season_folder: String,
    pub episode: String,
    pub movie: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            show_folder: "{show} ({year})".to_string(),
            season_folder: "Season {season_padded}".to_string(),
            episode: "{show} - S{season_padded}E{episode_padded} - {episode_title}".to_string(),
            movie: "{title} ({year})".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    pub include_subtitles: bool,
    pub dry_run: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            include_subtitles: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Days of log files to keep; 0 keeps everything.
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub workers: usize,
    pub ffprobe_enabled: bool,
    pub tmdb: ServiceConfig,
    pub tvdb: ServiceConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            ffprobe_enabled: true,
            tmdb: ServiceConfig {
                language: Some("en-US".to_string()),
                ..ServiceConfig::default()
            },
            tvdb: ServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub enabled: bool,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Opaque persistence seam for the configuration record.
pub trait ConfigStore: Send {
    fn load(&self) -> Result<Config>;
    fn save(&mut self, config: &Config) -> Result<()>;
}

/// TOML file store under the platform config directory.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config_dir()?.join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!("No config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store, used when nothing should touch the disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    pub config: Config,
    pub fail_saves: bool,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Config> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &Config) -> Result<()> {
        if self.fail_saves {
            return Err(ConfigError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only store"),
            });
        }
        self.config = config.clone();
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::NoConfigDir)
}

pub fn log_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_local_dir().join(LOG_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path().join("config.toml"));
        assert_eq!(store.load().unwrap(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut store = FileConfigStore::new(dir.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        config.templates.movie = "{title}".to_string();
        config.providers.tmdb.enabled = true;
        config.providers.tmdb.api_key = "abc".to_string();
        config.providers.workers = 8;

        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[providers]\nworkers = 2\n").unwrap();

        let config = FileConfigStore::new(&path).load().unwrap();
        assert_eq!(config.providers.workers, 2);
        assert!(config.providers.ffprobe_enabled);
        assert_eq!(config.templates, TemplatesConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[providers\nworkers = ").unwrap();

        let err = FileConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
