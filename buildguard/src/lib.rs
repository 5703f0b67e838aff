//! BuildGuard - PC build compatibility validation library
//!
//! Resolves free-text part names against a hardware catalog and runs a
//! battery of compatibility rules (socket, form factor, GPU clearance,
//! power budget, storage interface) over the selected parts.
//!
//! # Quick Start
//!
//! ```no_run
//! use buildguard::prelude::*;
//!
//! # async fn run() -> Result<(), BuildGuardError> {
//! let catalog = InMemoryCatalog::load(std::path::Path::new("catalog.json"))?;
//! let names = vec![
//!     "AMD Ryzen 9 7900X 4.70GHz AM5".to_string(),
//!     "ASRock Z87 Extreme3 LGA1150 ATX".to_string(),
//! ];
//! let result = BuildGuardCore::validate(&names, &catalog, ValidationOptions::default()).await?;
//!
//! for error in &result.report.errors {
//!     println!("{}", error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Name folding**: case, accent and punctuation-insensitive lookup keys
//! - **Catalog backends**: JSON document in memory, Neo4j over HTTP
//! - **Declarative rules**: add rule descriptors without touching the engine
//! - **Full reports**: every applicable rule runs, failures never short-circuit

pub mod catalog;
pub mod config;
pub mod core;
pub mod engine;
pub mod normalize;
pub mod quantity;
pub mod report;
pub mod rules;

// Re-export main types
pub use catalog::{
    CatalogError, CatalogGateway, CatalogId, Category, InMemoryCatalog, Neo4jCatalog, Resolution,
    ResolvedPart,
};
pub use config::{connect, BuildGuardConfig, CatalogConfig};
pub use core::{
    parse_component_list, parse_delimited_list, parse_json_list, BuildGuardCore, BuildGuardError,
    Diagnostic, ValidationOptions, ValidationResult,
};
pub use engine::{CategorizedSelection, CompatibilityEngine};
pub use normalize::normalize;
pub use report::{RuleOutcome, RuleResult, ValidationReport};
pub use rules::{default_rules, AttributeKind, AttributeVocabulary, Check, CompatibilityRule, Operand};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BuildGuardCore, BuildGuardError, CatalogGateway, Category, CompatibilityEngine,
        Diagnostic, InMemoryCatalog, RuleOutcome, ValidationOptions, ValidationReport,
        ValidationResult,
    };
}
