//! Store configuration loaded from TOML.
//!
//! # Example
//!
//! ```toml
//! [store]
//! backend = "file"
//! path = "macros.json"
//!
//! [ids]
//! generator = "sequential"
//! start = "0000000000000001"
//! ```
//!
//! Every section is optional. The defaults are an in-memory store with
//! randomly generated ids.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use macrostore_storage::{
    Id, IdError, IdGenerator, MacroError, RandomIdGenerator, SequentialIdGenerator,
};
use serde::{Deserialize, Serialize};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub ids: IdSettings,
}

/// `[store]` section: which backend holds the macros.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: BackendKind,
    /// JSON document path. Required when `backend = "file"`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    File,
}

/// `[ids]` section: how new macro ids are generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSettings {
    #[serde(default)]
    pub generator: GeneratorKind,
    /// First id handed out by the sequential generator, as 16 hex chars.
    pub start: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("store.path is required when store.backend = \"file\"")]
    MissingPath,

    #[error("invalid ids.start {value:?}: {source}")]
    InvalidStart { value: String, source: IdError },

    #[error("failed to open store: {0}")]
    Store(#[from] MacroError),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StoreConfig {
    /// Config file looked up in the working directory when none is given.
    pub const DEFAULT_FILE: &'static str = "macrostore.toml";

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == BackendKind::File && self.store.path.is_none() {
            return Err(ConfigError::MissingPath);
        }
        self.ids.start_id()?;
        Ok(())
    }

    pub fn id_generator(&self) -> Result<Arc<dyn IdGenerator>, ConfigError> {
        self.ids.generator()
    }

    /// Like [`id_generator`](Self::id_generator), but a sequential generator
    /// never hands out an id at or below `highest`.
    pub fn id_generator_after(
        &self,
        highest: Option<Id>,
    ) -> Result<Arc<dyn IdGenerator>, ConfigError> {
        self.ids.generator_after(highest)
    }
}

impl IdSettings {
    const DEFAULT_START: &'static str = "0000000000000001";

    fn start_id(&self) -> Result<Id, ConfigError> {
        let value = self.start.as_deref().unwrap_or(Self::DEFAULT_START);
        value.parse().map_err(|source| ConfigError::InvalidStart {
            value: value.to_string(),
            source,
        })
    }

    pub fn generator(&self) -> Result<Arc<dyn IdGenerator>, ConfigError> {
        self.generator_after(None)
    }

    /// Sequential ids resume at `max(start, highest + 1)`.
    pub fn generator_after(
        &self,
        highest: Option<Id>,
    ) -> Result<Arc<dyn IdGenerator>, ConfigError> {
        let generator: Arc<dyn IdGenerator> = match self.generator {
            GeneratorKind::Random => Arc::new(RandomIdGenerator),
            GeneratorKind::Sequential => {
                let start = self.start_id()?;
                let resume = highest
                    .and_then(|id| id.get().checked_add(1))
                    .and_then(|next| Id::new(next).ok())
                    .filter(|next| *next > start)
                    .unwrap_or(start);
                Arc::new(SequentialIdGenerator::new(resume))
            }
        };
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.ids.generator, GeneratorKind::Random);
    }

    #[test]
    fn parses_file_backend_with_sequential_ids() {
        let config = StoreConfig::from_toml_str(
            r#"
            [store]
            backend = "file"
            path = "data/macros.json"

            [ids]
            generator = "sequential"
            start = "00000000000000ff"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, BackendKind::File);
        assert_eq!(config.store.path, Some(PathBuf::from("data/macros.json")));

        let gen = config.id_generator().unwrap();
        assert_eq!(gen.id().get(), 0xff);
        assert_eq!(gen.id().get(), 0x100);
    }

    #[test]
    fn sequential_without_start_begins_at_one() {
        let config = StoreConfig::from_toml_str("[ids]\ngenerator = \"sequential\"\n").unwrap();
        assert_eq!(config.id_generator().unwrap().id().get(), 1);
    }

    #[test]
    fn sequential_resumes_after_highest_stored_id() {
        let config = StoreConfig::from_toml_str("[ids]\ngenerator = \"sequential\"\n").unwrap();
        let gen = config.id_generator_after(Some(Id::new(0x41).unwrap())).unwrap();
        assert_eq!(gen.id().get(), 0x42);
        assert_eq!(gen.id().get(), 0x43);
    }

    #[test]
    fn sequential_keeps_start_above_highest_stored_id() {
        let config = StoreConfig::from_toml_str(
            "[ids]\ngenerator = \"sequential\"\nstart = \"0000000000000100\"\n",
        )
        .unwrap();
        let gen = config.id_generator_after(Some(Id::new(0x05).unwrap())).unwrap();
        assert_eq!(gen.id().get(), 0x100);
    }

    #[test]
    fn sequential_falls_back_to_start_when_highest_is_max() {
        let config = StoreConfig::from_toml_str("[ids]\ngenerator = \"sequential\"\n").unwrap();
        let gen = config.id_generator_after(Some(Id::new(u64::MAX).unwrap())).unwrap();
        assert_eq!(gen.id().get(), 1);
    }

    #[test]
    fn file_backend_requires_path() {
        let err = StoreConfig::from_toml_str("[store]\nbackend = \"file\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPath));
    }

    #[test]
    fn bad_start_id_is_rejected() {
        let err = StoreConfig::from_toml_str("[ids]\nstart = \"xyz\"\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid ids.start \"xyz\": id must have a length of 16 bytes"
        );
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = StoreConfig::from_toml_str("[store]\nbackend = \"postgres\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            StoreConfig::load(&path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(
            StoreConfig::load_or_default(&path).unwrap(),
            StoreConfig::default()
        );
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macrostore.toml");
        std::fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(
            StoreConfig::load(&path).unwrap().store.backend,
            BackendKind::Memory
        );
    }
}
