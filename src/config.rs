//! Library configuration
//!
//! Stored as a plain RON file (default `spritepack.ron`) next to the project.
//! Every field is optional in the file; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assetdb::append_extension;

/// Default config file name
pub const CONFIG_FILE: &str = "spritepack.ron";

/// Error type for config operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the library lives and how meta files are named
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root of the managed library
    pub library_dir: PathBuf,
    /// Subdirectory of `library_dir` holding imported artifacts
    pub imports_dir: String,
    /// Extension appended to a source path to get its meta record
    pub meta_extension: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("library"),
            imports_dir: "imports".to_string(),
            meta_extension: "meta".to_string(),
        }
    }
}

impl LibraryConfig {
    /// Load a config from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    /// Load a config, or fall back to defaults if the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save the config as pretty RON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .indentor("  ".to_string());
        let ron_string = ron::ser::to_string_pretty(self, config)?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Meta record path for a source asset (`hero.json` → `hero.json.meta`)
    pub fn meta_path_for(&self, asset_path: &Path) -> PathBuf {
        append_extension(asset_path, &self.meta_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: LibraryConfig = ron::from_str("(library_dir: \"out/lib\")").unwrap();
        assert_eq!(config.library_dir, PathBuf::from("out/lib"));
        assert_eq!(config.imports_dir, "imports");
        assert_eq!(config.meta_extension, "meta");
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = LibraryConfig::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = LibraryConfig {
            library_dir: PathBuf::from("cache"),
            imports_dir: "artifacts".to_string(),
            meta_extension: "spmeta".to_string(),
        };
        config.save(&path).unwrap();

        let loaded = LibraryConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "(library_dir: ").unwrap();
        assert!(matches!(
            LibraryConfig::load(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_meta_path_for() {
        let config = LibraryConfig::default();
        assert_eq!(
            config.meta_path_for(Path::new("sprites/hero.json")),
            PathBuf::from("sprites/hero.json.meta")
        );
    }
}
