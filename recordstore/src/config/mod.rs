use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "RECORDSTORE_DATA_DIR";
pub const PREFIX_ENV: &str = "RECORDSTORE_PREFIX";
pub const DEFAULT_PREFIX: &str = "db_";
const EXTENSION: &str = "json";

/// Where store files live and how they are named:
/// `<data_dir>/<prefix><name>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: PathBuf::from("."),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `RECORDSTORE_DATA_DIR` and `RECORDSTORE_PREFIX`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(prefix) = std::env::var(PREFIX_ENV) {
            config.prefix = prefix;
        }
        config
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Path of the backing file for store `name`.
    pub fn store_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self
            .data_dir
            .join(format!("{}{}.{}", self.prefix, name, EXTENSION)))
    }

    /// Names of the stores present in the data directory, sorted.
    pub fn list_stores(&self) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/{}*.{}",
            glob::Pattern::escape(&self.data_dir.to_string_lossy()),
            glob::Pattern::escape(&self.prefix),
            EXTENSION
        );
        let mut names: Vec<String> = glob::glob(&pattern)
            .map_err(|e| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Glob error: {e}"),
                ))
            })?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .filter_map(|p| self.name_from_path(&p))
            .collect();
        names.sort();
        Ok(names)
    }

    fn name_from_path(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        let name = stem.strip_prefix(self.prefix.as_str())?;
        validate_name(name).ok()?;
        Some(name.to_string())
    }
}

/// Store names become part of a file name: no separators, no dot-only names.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_path() {
        let config = StoreConfig::new("/data");
        assert_eq!(
            config.store_path("hello").unwrap(),
            PathBuf::from("/data/db_hello.json")
        );
        let config = config.with_prefix("");
        assert_eq!(
            config.store_path("hello").unwrap(),
            PathBuf::from("/data/hello.json")
        );
    }

    #[test]
    fn test_invalid_names() {
        let config = StoreConfig::default();
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(
                matches!(config.store_path(name), Err(StoreError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_list_stores() {
        let tmp = TempDir::new().unwrap();
        for file in ["db_users.json", "db_events.json", "other.json", "db_notes.txt"] {
            std::fs::write(tmp.path().join(file), "[]").unwrap();
        }
        std::fs::create_dir(tmp.path().join("db_dir.json")).unwrap();

        let config = StoreConfig::new(tmp.path());
        assert_eq!(config.list_stores().unwrap(), vec!["events", "users"]);
    }
}
