use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No home directory, so no platform configuration directory either.
    NoConfigDir,

    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },

    /// Failed to write the configuration file.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    Serialize(toml::ser::Error),
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => {
                write!(f, "Failed to determine the configuration directory")
            }
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Serialize(source) => write!(f, "Failed to serialize config: {source}"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::NoConfigDir => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source),
            ConfigError::Serialize(source) => Some(source),
        }
    }
}

impl Config {
    /// Load from `config_path`. A missing file yields the defaults.
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: config_path.to_path_buf(),
            source,
        };

        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;

        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(config_path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

/// Platform configuration directory (e.g., `~/.config/luna` on Linux).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("org", "luna", "luna")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(ConfigError::NoConfigDir)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}
