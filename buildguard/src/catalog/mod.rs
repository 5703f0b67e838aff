//! Catalog Gateway
//!
//! Read-only access to the hardware catalog. The validation core only ever
//! needs two lookups: resolving a normalized product name to a part record,
//! and fetching the values of one characteristic type for a part.

pub mod memory;
pub mod neo4j;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::{CatalogDocument, InMemoryCatalog, ProductRecord};
pub use neo4j::{GraphSchema, Neo4jCatalog, Neo4jConfig};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unreachable: {0}")]
    Transport(String),
    #[error("Catalog call '{operation}' timed out after {after:?}")]
    Timeout { operation: String, after: Duration },
    #[error("Catalog query failed: {code} - {message}")]
    Query { code: String, message: String },
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
    #[error("Failed to load catalog: {0}")]
    Load(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::InvalidResponse(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

/// Part category as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Cpu,
    Motherboard,
    Memory,
    Storage,
    PowerSupply,
    Case,
    Gpu,
    /// Categories no rule looks at (coolers, fans, ...).
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Cpu => "cpu",
            Category::Motherboard => "motherboard",
            Category::Memory => "memory",
            Category::Storage => "storage",
            Category::PowerSupply => "power-supply",
            Category::Case => "case",
            Category::Gpu => "gpu",
            Category::Other(name) => name,
        }
    }

    /// Categories outside the fixed set that the rule battery reads.
    pub fn is_other(&self) -> bool {
        matches!(self, Category::Other(_))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Category::Cpu,
            "motherboard" => Category::Motherboard,
            "memory" => Category::Memory,
            "storage" => Category::Storage,
            "power-supply" => Category::PowerSupply,
            "case" => Category::Case,
            "gpu" => Category::Gpu,
            other => Category::Other(other.to_string()),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from(raw.as_str()))
    }
}

/// Opaque identifier assigned by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub String);

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog record matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPart {
    pub display_name: String,
    pub normalized_key: String,
    pub category: Category,
    pub catalog_id: CatalogId,
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    Unique(ResolvedPart),
    /// Several records share the key; `chosen` is the first in catalog order.
    Ambiguous {
        chosen: ResolvedPart,
        alternatives: Vec<ResolvedPart>,
    },
}

impl Resolution {
    /// Build a resolution from matches listed in catalog order.
    pub fn from_matches(matches: Vec<ResolvedPart>) -> Self {
        let mut matches = matches.into_iter();
        match matches.next() {
            None => Resolution::NotFound,
            Some(chosen) => {
                let alternatives: Vec<_> = matches.collect();
                if alternatives.is_empty() {
                    Resolution::Unique(chosen)
                } else {
                    Resolution::Ambiguous {
                        chosen,
                        alternatives,
                    }
                }
            }
        }
    }

    /// The part the run should use, if any.
    pub fn part(&self) -> Option<&ResolvedPart> {
        match self {
            Resolution::NotFound => None,
            Resolution::Unique(part) => Some(part),
            Resolution::Ambiguous { chosen, .. } => Some(chosen),
        }
    }
}

/// Read-only view of the catalog store consumed by the validation core.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Resolve a normalized product name.
    async fn resolve_by_name(&self, normalized_key: &str) -> Result<Resolution, CatalogError>;

    /// Values of one characteristic type for a product, in catalog order.
    /// An empty list means the catalog has no data for it.
    async fn fetch_attributes(
        &self,
        normalized_key: &str,
        attribute_type: &str,
    ) -> Result<Vec<String>, CatalogError>;
}

/// Wraps a gateway and bounds every call with a timeout.
pub struct TimeoutCatalog<'a> {
    inner: &'a dyn CatalogGateway,
    timeout: Duration,
}

impl<'a> TimeoutCatalog<'a> {
    pub fn new(inner: &'a dyn CatalogGateway, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<'a> CatalogGateway for TimeoutCatalog<'a> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn resolve_by_name(&self, normalized_key: &str) -> Result<Resolution, CatalogError> {
        tokio::time::timeout(self.timeout, self.inner.resolve_by_name(normalized_key))
            .await
            .map_err(|_| CatalogError::Timeout {
                operation: format!("resolve '{}'", normalized_key),
                after: self.timeout,
            })?
    }

    async fn fetch_attributes(
        &self,
        normalized_key: &str,
        attribute_type: &str,
    ) -> Result<Vec<String>, CatalogError> {
        tokio::time::timeout(
            self.timeout,
            self.inner.fetch_attributes(normalized_key, attribute_type),
        )
        .await
        .map_err(|_| CatalogError::Timeout {
            operation: format!("fetch '{}' of '{}'", attribute_type, normalized_key),
            after: self.timeout,
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, id: &str) -> ResolvedPart {
        ResolvedPart {
            display_name: name.to_string(),
            normalized_key: name.to_lowercase(),
            category: Category::Cpu,
            catalog_id: CatalogId(id.to_string()),
        }
    }

    #[test]
    fn test_category_round_trips_catalog_strings() {
        for raw in ["cpu", "motherboard", "memory", "storage", "power-supply", "case", "gpu"] {
            let category = Category::from(raw);
            assert!(!matches!(category, Category::Other(_)), "{raw} should be known");
            assert_eq!(category.as_str(), raw);
        }
        assert_eq!(Category::from("Cooler"), Category::Other("cooler".to_string()));
    }

    #[test]
    fn test_category_serializes_as_catalog_string() {
        let json = serde_json::to_string(&Category::PowerSupply).unwrap();
        assert_eq!(json, "\"power-supply\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::PowerSupply);
    }

    #[test]
    fn test_resolution_from_matches_picks_first() {
        assert_eq!(Resolution::from_matches(vec![]), Resolution::NotFound);

        let unique = Resolution::from_matches(vec![part("A", "1")]);
        assert_eq!(unique.part().map(|p| p.catalog_id.0.as_str()), Some("1"));

        let ambiguous = Resolution::from_matches(vec![part("A", "1"), part("A", "2")]);
        match ambiguous {
            Resolution::Ambiguous {
                chosen,
                alternatives,
            } => {
                assert_eq!(chosen.catalog_id.0, "1");
                assert_eq!(alternatives.len(), 1);
                assert_eq!(alternatives[0].catalog_id.0, "2");
            }
            other => panic!("expected ambiguous resolution, got {:?}", other),
        }
    }

    struct SlowCatalog;

    #[async_trait]
    impl CatalogGateway for SlowCatalog {
        fn name(&self) -> &str {
            "slow"
        }

        async fn resolve_by_name(&self, _key: &str) -> Result<Resolution, CatalogError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Resolution::NotFound)
        }

        async fn fetch_attributes(
            &self,
            _key: &str,
            _attribute_type: &str,
        ) -> Result<Vec<String>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_timeout_catalog_reports_timeout() {
        let slow = SlowCatalog;
        let bounded = TimeoutCatalog::new(&slow, Duration::from_millis(20));

        let err = bounded.resolve_by_name("anything").await.unwrap_err();
        assert!(matches!(err, CatalogError::Timeout { .. }));

        let err = bounded.fetch_attributes("anything", "socket").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
