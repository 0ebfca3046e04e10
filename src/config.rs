//! Optional config file support: `~/.ecsview.toml`.
//!
//! Every key is optional and CLI flags always win. Unknown keys are
//! ignored so the file can be shared across versions.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Output format name, as accepted by --format.
    pub format: Option<String>,
    /// Color mode name, as accepted by --color.
    pub color: Option<String>,
    pub max_line_len: Option<usize>,
    pub lenient: Option<bool>,
}

pub fn config_file_path() -> Option<PathBuf> {
    let home_var = if cfg!(windows) { "UserProfile" } else { "HOME" };
    let home = std::env::var_os(home_var)?;
    Some(PathBuf::from(home).join(".ecsview.toml"))
}

/// Loads the user config file. A missing file is not an error.
pub fn load_config() -> Result<FileConfig, ConfigError> {
    match config_file_path() {
        Some(path) => load_config_file(&path),
        None => Ok(FileConfig::default()),
    }
}

pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source: err,
            });
        }
    };
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_a_partial_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(".ecsview.toml");
        fs::write(&path, "format = \"compact\"\nmax_line_len = 32768\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.format.as_deref(), Some("compact"));
        assert_eq!(config.max_line_len, Some(32_768));
        assert_eq!(config.color, None);
        assert_eq!(config.lenient, None);
    }

    #[test]
    fn missing_file_is_the_default_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config_file(&dir.path().join("nope.toml")).unwrap();
        assert!(config.format.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(".ecsview.toml");
        fs::write(&path, "someday = true\n").unwrap();
        assert!(load_config_file(&path).is_ok());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(".ecsview.toml");
        fs::write(&path, "format = [what\n").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
