//! Core validation logic shared by the CLI and library users.
//! No presentation or connection-setup concerns.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::{CatalogError, CatalogGateway, Category, Resolution, ResolvedPart, TimeoutCatalog};
use crate::engine::{CategorizedSelection, CompatibilityEngine};
use crate::normalize::normalize;
use crate::report::ValidationReport;
use crate::rules::AttributeVocabulary;

/// Default bound on a single catalog call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum BuildGuardError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Options for validation runs.
#[derive(Clone, Debug)]
pub struct ValidationOptions {
    /// Reject builds that list two parts of the same category.
    pub strict_mode: bool,
    /// Rule ids to run; empty runs the whole battery.
    pub rules: Vec<String>,
    pub vocabulary: AttributeVocabulary,
    pub call_timeout: Duration,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            rules: vec![],
            vocabulary: AttributeVocabulary::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Non-fatal findings about the input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No catalog record matches the name.
    NotFound { name: String },
    /// Several records share the key; the first was used.
    Ambiguous {
        key: String,
        chosen: ResolvedPart,
        alternatives: Vec<ResolvedPart>,
    },
    /// Two inputs share a category; the later one was kept.
    DuplicateCategory {
        category: Category,
        replaced: String,
        kept: String,
    },
}

impl Diagnostic {
    pub fn message(&self) -> String {
        match self {
            Diagnostic::NotFound { name } => format!("Product not found in catalog: {}", name),
            Diagnostic::Ambiguous {
                key,
                chosen,
                alternatives,
            } => format!(
                "{} catalog products match '{}'; using '{}' ({})",
                alternatives.len() + 1,
                key,
                chosen.display_name,
                chosen.catalog_id
            ),
            Diagnostic::DuplicateCategory {
                category,
                replaced,
                kept,
            } => format!(
                "Duplicate category {}: '{}' replaced '{}'",
                category, kept, replaced
            ),
        }
    }
}

/// Result of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    /// Names as supplied.
    pub components: Vec<String>,
    /// Parts that made it into the selection, by category.
    pub parts: Vec<ResolvedPart>,
    pub diagnostics: Vec<Diagnostic>,
    pub report: ValidationReport,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.report.valid
    }

    pub fn has_warnings(&self) -> bool {
        self.report.skipped() > 0 || !self.diagnostics.is_empty()
    }
}

/// Decode a component list given either as a JSON array of strings or as a
/// `|`-delimited string.
///
/// Input is read as JSON only when it opens like an array of strings
/// (`[` followed by `"` or `]`), so names such as `[OEM] Ryzen 5` still
/// split on `|`.
pub fn parse_component_list(raw: &str) -> Result<Vec<String>, BuildGuardError> {
    if looks_like_json_array(raw) {
        parse_json_list(raw)
    } else {
        parse_delimited_list(raw)
    }
}

/// Decode a JSON array of part names.
pub fn parse_json_list(raw: &str) -> Result<Vec<String>, BuildGuardError> {
    let items: Vec<String> = serde_json::from_str(raw.trim())?;
    clean_component_list(items)
}

/// Split a `|`-delimited string of part names.
pub fn parse_delimited_list(raw: &str) -> Result<Vec<String>, BuildGuardError> {
    clean_component_list(raw.split('|').map(str::to_string).collect())
}

fn looks_like_json_array(raw: &str) -> bool {
    let Some(rest) = raw.trim_start().strip_prefix('[') else {
        return false;
    };
    matches!(rest.trim_start().chars().next(), Some('"') | Some(']'))
}

fn clean_component_list(items: Vec<String>) -> Result<Vec<String>, BuildGuardError> {
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if items.is_empty() {
        return Err(BuildGuardError::InvalidInput(
            "component list is empty".to_string(),
        ));
    }
    Ok(items)
}

/// Core validation API.
pub struct BuildGuardCore;

impl BuildGuardCore {
    /// Resolve `names` against the catalog and run the rule battery.
    pub async fn validate(
        names: &[String],
        catalog: &dyn CatalogGateway,
        options: ValidationOptions,
    ) -> Result<ValidationResult, BuildGuardError> {
        let mut engine =
            CompatibilityEngine::with_default_rules().with_vocabulary(options.vocabulary.clone());
        engine.retain_rules(&options.rules);
        Self::validate_with_engine(names, catalog, &engine, options).await
    }

    /// Same as [`BuildGuardCore::validate`] with a caller-built engine.
    /// `options.rules` and `options.vocabulary` are not applied here.
    pub async fn validate_with_engine(
        names: &[String],
        catalog: &dyn CatalogGateway,
        engine: &CompatibilityEngine,
        options: ValidationOptions,
    ) -> Result<ValidationResult, BuildGuardError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("validate", %run_id, backend = catalog.name());
        Self::run(run_id, names, catalog, engine, &options)
            .instrument(span)
            .await
    }

    /// Normalize and resolve every name, then build the selection in input
    /// order so the last part of a category wins.
    pub async fn resolve(
        names: &[String],
        catalog: &dyn CatalogGateway,
    ) -> Result<(CategorizedSelection, Vec<Diagnostic>), BuildGuardError> {
        let lookups = names.iter().map(|name| async move {
            let key = normalize(name);
            let resolution = catalog.resolve_by_name(&key).await?;
            Ok::<_, CatalogError>((name, key, resolution))
        });
        let resolved = try_join_all(lookups).await?;

        let mut selection = CategorizedSelection::new();
        let mut diagnostics = Vec::new();

        for (name, key, resolution) in resolved {
            let part = match resolution {
                Resolution::NotFound => {
                    tracing::warn!(name = %name, key = %key, "product not found in catalog");
                    diagnostics.push(Diagnostic::NotFound { name: name.clone() });
                    continue;
                }
                Resolution::Unique(part) => part,
                Resolution::Ambiguous {
                    chosen,
                    alternatives,
                } => {
                    tracing::warn!(
                        key = %key,
                        matches = alternatives.len() + 1,
                        "ambiguous product name, using first match"
                    );
                    diagnostics.push(Diagnostic::Ambiguous {
                        key: key.clone(),
                        chosen: chosen.clone(),
                        alternatives,
                    });
                    chosen
                }
            };

            tracing::debug!(name = %name, category = %part.category, "resolved product");
            let kept = part.display_name.clone();
            if let Some(replaced) = selection.insert(part) {
                tracing::warn!(
                    category = %replaced.category,
                    replaced = %replaced.display_name,
                    kept = %kept,
                    "duplicate category, keeping the later part"
                );
                diagnostics.push(Diagnostic::DuplicateCategory {
                    category: replaced.category.clone(),
                    replaced: replaced.display_name,
                    kept,
                });
            }
        }

        Ok((selection, diagnostics))
    }

    async fn run(
        run_id: Uuid,
        names: &[String],
        catalog: &dyn CatalogGateway,
        engine: &CompatibilityEngine,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, BuildGuardError> {
        let bounded = TimeoutCatalog::new(catalog, options.call_timeout);
        let (selection, diagnostics) = Self::resolve(names, &bounded).await?;

        let outcomes = engine.evaluate(&selection, &bounded).await?;
        let mut report = ValidationReport::from_outcomes(outcomes);

        if options.strict_mode {
            for diagnostic in &diagnostics {
                if let Diagnostic::DuplicateCategory { .. } = diagnostic {
                    report.push_error(diagnostic.message());
                }
            }
        }

        tracing::info!(
            valid = report.valid,
            errors = report.errors.len(),
            skipped = report.skipped(),
            "validation finished"
        );

        Ok(ValidationResult {
            run_id,
            checked_at: Utc::now(),
            components: names.to_vec(),
            parts: selection.parts().cloned().collect(),
            diagnostics,
            report,
        })
    }
}
