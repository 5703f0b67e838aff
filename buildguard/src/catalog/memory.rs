//! In-memory catalog backed by a JSON document.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CatalogError, CatalogGateway, CatalogId, Category, Resolution, ResolvedPart};
use crate::normalize::normalize;

/// On-disk catalog layout.
///
/// ```json
/// { "products": [
///     { "id": "cpu-1", "name": "AMD Ryzen 9 7900X", "category": "cpu",
///       "attributes": { "socket": ["AM5"], "tdp": ["170 W"] } }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl ProductRecord {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a characteristic value; repeated calls keep insertion order.
    pub fn with_attribute(mut self, attribute_type: &str, value: impl Into<String>) -> Self {
        self.attributes
            .entry(attribute_type.to_string())
            .or_default()
            .push(value.into());
        self
    }
}

struct IndexedProduct {
    key: String,
    record: ProductRecord,
    catalog_id: CatalogId,
}

/// Catalog held entirely in memory. Product order is catalog order.
pub struct InMemoryCatalog {
    products: Vec<IndexedProduct>,
}

impl InMemoryCatalog {
    pub fn new(document: CatalogDocument) -> Self {
        let products = document
            .products
            .into_iter()
            .enumerate()
            .map(|(index, record)| IndexedProduct {
                key: normalize(&record.name),
                catalog_id: CatalogId(
                    record
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("product-{}", index)),
                ),
                record,
            })
            .collect();
        Self { products }
    }

    pub fn from_products(products: Vec<ProductRecord>) -> Self {
        Self::new(CatalogDocument { products })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| CatalogError::Load(e.to_string()))?;
        Ok(Self::new(document))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            products = catalog.len(),
            "loaded catalog document"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn matching<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a IndexedProduct> + 'a {
        self.products.iter().filter(move |p| p.key == key)
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    fn name(&self) -> &str {
        "memory"
    }

    async fn resolve_by_name(&self, normalized_key: &str) -> Result<Resolution, CatalogError> {
        let matches = self
            .matching(normalized_key)
            .map(|p| ResolvedPart {
                display_name: p.record.name.clone(),
                normalized_key: p.key.clone(),
                category: p.record.category.clone(),
                catalog_id: p.catalog_id.clone(),
            })
            .collect();
        Ok(Resolution::from_matches(matches))
    }

    async fn fetch_attributes(
        &self,
        normalized_key: &str,
        attribute_type: &str,
    ) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .matching(normalized_key)
            .filter_map(|p| p.record.attributes.get(attribute_type))
            .flatten()
            .cloned()
            .collect())
    }
}
