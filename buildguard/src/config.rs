//! Runtime configuration: which catalog to talk to and how attributes are
//! named in it. Loaded from a JSON file or assembled by the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogGateway, InMemoryCatalog, Neo4jCatalog, Neo4jConfig};
use crate::core::{BuildGuardError, ValidationOptions, DEFAULT_CALL_TIMEOUT};
use crate::rules::AttributeVocabulary;

/// Catalog backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// JSON catalog document on disk.
    Memory { path: PathBuf },
    Neo4j(Neo4jConfig),
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig::Neo4j(Neo4jConfig::default())
    }
}

/// Vocabulary selection: a named preset or an explicit mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VocabularyConfig {
    Preset(VocabularyPreset),
    Custom(AttributeVocabulary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyPreset {
    English,
    Legacy,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        VocabularyConfig::Preset(VocabularyPreset::English)
    }
}

impl VocabularyConfig {
    pub fn resolve(&self) -> AttributeVocabulary {
        match self {
            VocabularyConfig::Preset(VocabularyPreset::English) => AttributeVocabulary::default(),
            VocabularyConfig::Preset(VocabularyPreset::Legacy) => AttributeVocabulary::legacy(),
            VocabularyConfig::Custom(vocabulary) => vocabulary.clone(),
        }
    }
}

/// Top-level configuration file.
///
/// ```json
/// {
///   "catalog": { "backend": "neo4j", "uri": "http://localhost:7474", "password": "..." },
///   "vocabulary": "legacy",
///   "call_timeout_secs": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildGuardConfig {
    pub catalog: CatalogConfig,
    pub vocabulary: VocabularyConfig,
    pub call_timeout_secs: u64,
    pub strict_mode: bool,
}

impl Default for BuildGuardConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            vocabulary: VocabularyConfig::default(),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT.as_secs(),
            strict_mode: false,
        }
    }
}

impl BuildGuardConfig {
    pub fn load(path: &Path) -> Result<Self, BuildGuardError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BuildGuardError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, BuildGuardError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| BuildGuardError::Config(format!("invalid configuration: {}", e)))?;
        if config.call_timeout_secs == 0 {
            return Err(BuildGuardError::Config(
                "call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Validation options derived from this configuration.
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_mode: self.strict_mode,
            rules: vec![],
            vocabulary: self.vocabulary.resolve(),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// Open the configured catalog backend.
pub fn connect(config: &CatalogConfig) -> Result<Arc<dyn CatalogGateway>, BuildGuardError> {
    match config {
        CatalogConfig::Memory { path } => {
            tracing::info!(path = %path.display(), "opening catalog document");
            Ok(Arc::new(InMemoryCatalog::load(path)?))
        }
        CatalogConfig::Neo4j(neo4j) => {
            tracing::info!(uri = %neo4j.uri, database = %neo4j.database, "connecting to neo4j catalog");
            Ok(Arc::new(Neo4jCatalog::new(neo4j)?))
        }
    }
}
