//! Loading and saving the hotbar configuration file
//!
//! The file lives at `<config dir>/hotbar/hotbar.toml` unless a path is
//! given explicitly. Relative icon paths are resolved against the directory
//! the file was loaded from, so a config and its icons can be moved together.

use std::fs;
use std::path::{Path, PathBuf};

use hotbar_types::HotbarConfig;
use thiserror::Error;
use tracing::debug;

/// Load a config file and resolve its icon paths.
pub fn load_file(path: &Path) -> Result<HotbarConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config: HotbarConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(base) = path.parent() {
        resolve_icons(&mut config, base);
    }

    debug!(
        path = %path.display(),
        actions = config.actions.len(),
        policies = config.policies.len(),
        bindings = config.bindings.len(),
        "Loaded config"
    );
    Ok(config)
}

/// Save a config as pretty TOML, creating the parent directory if needed.
pub fn save_file(path: &Path, config: &HotbarConfig) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Get the default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hotbar").join("hotbar.toml"))
}

fn resolve_icons(config: &mut HotbarConfig, base: &Path) {
    for action in &mut config.actions {
        if let Some(icon) = action.icon.as_mut()
            && icon.is_relative()
        {
            *icon = base.join(&*icon);
        }
    }
}

/// Errors that can occur reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}
