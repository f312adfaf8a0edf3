// config.rs
// Loader settings, readable from a TOML file such as:
//
//   use_cache = true
//   cache_capacity = 8
//   large_file_threshold = 209715200

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cache::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::error::LoaderError;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Try the bulk array parser before the line-oriented one
    pub use_bulk_parser: bool,
    /// Cache parsed snapshot frames by path
    pub use_cache: bool,
    /// Maximum number of cached frames (1..=20)
    pub cache_capacity: usize,
    /// Custom files above this size (bytes) go through the streaming parser
    pub large_file_threshold: u64,
    /// Streaming window size in bytes
    pub chunk_size: usize,
    /// Files above this size (bytes) get a "large file" log notice
    pub large_file_notice: u64,
    /// Upper bound on rows pre-allocated when a particle cap is given
    pub prealloc_limit: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            use_bulk_parser: true,
            use_cache: true,
            cache_capacity: DEFAULT_CAPACITY,
            large_file_threshold: 100 * MIB,
            chunk_size: 10 * MIB as usize,
            large_file_notice: 10 * MIB,
            prealloc_limit: 10_000,
        }
    }
}

impl LoaderConfig {
    /// Parse and validate a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, LoaderError> {
        let config: LoaderConfig =
            toml::from_str(text).map_err(|e| LoaderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoaderError::NotFound(path.to_path_buf()),
            _ => LoaderError::Io(e),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, LoaderError> {
        toml::to_string(self).map_err(|e| LoaderError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), LoaderError> {
        if !(1..=MAX_CAPACITY).contains(&self.cache_capacity) {
            return Err(LoaderError::Config(format!(
                "cache_capacity must be between 1 and {}, got {}",
                MAX_CAPACITY, self.cache_capacity
            )));
        }
        if self.chunk_size == 0 {
            return Err(LoaderError::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(LoaderConfig::from_toml_str("").unwrap(), LoaderConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = LoaderConfig::from_toml_str("cache_capacity = 12\nuse_bulk_parser = false\n").unwrap();
        assert_eq!(config.cache_capacity, 12);
        assert!(!config.use_bulk_parser);
        assert!(config.use_cache);
        assert_eq!(config.large_file_threshold, 100 * MIB);
    }

    #[test]
    fn out_of_range_capacity() {
        assert!(matches!(
            LoaderConfig::from_toml_str("cache_capacity = 0"),
            Err(LoaderError::Config(_))
        ));
        assert!(LoaderConfig::from_toml_str("cache_capacity = 21").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = LoaderConfig {
            chunk_size: 4096,
            ..LoaderConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(LoaderConfig::from_toml_str(&text).unwrap(), config);
    }
}
