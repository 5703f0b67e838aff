//! Compatibility Engine
//!
//! Runs the rule battery over a categorized selection. Every applicable rule
//! runs; a failure never stops the remaining rules.

use std::collections::BTreeMap;

use futures::future::try_join_all;

use crate::catalog::{CatalogError, CatalogGateway, Category, ResolvedPart};
use crate::report::{RuleOutcome, RuleResult};
use crate::rules::{default_rules, AttributeVocabulary, CompatibilityRule};

/// At most one part per rule category; later insertions replace earlier
/// ones. Parts of [`Category::Other`] are never replaced, since no rule
/// compares them.
#[derive(Debug, Clone, Default)]
pub struct CategorizedSelection {
    parts: BTreeMap<Category, ResolvedPart>,
    others: Vec<ResolvedPart>,
}

impl CategorizedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `part` for its category, returning the part it replaced.
    pub fn insert(&mut self, part: ResolvedPart) -> Option<ResolvedPart> {
        if part.category.is_other() {
            self.others.push(part);
            return None;
        }
        self.parts.insert(part.category.clone(), part)
    }

    /// The selected part; for [`Category::Other`] the latest one listed.
    pub fn get(&self, category: &Category) -> Option<&ResolvedPart> {
        if category.is_other() {
            return self.others.iter().rev().find(|p| &p.category == category);
        }
        self.parts.get(category)
    }

    /// Lookup key of the part selected for `category`.
    pub fn key(&self, category: &Category) -> Option<&str> {
        self.get(category).map(|p| p.normalized_key.as_str())
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.get(category).is_some()
    }

    pub fn len(&self) -> usize {
        self.parts.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.others.is_empty()
    }

    /// Rule-category parts in category order, then other parts in input order.
    pub fn parts(&self) -> impl Iterator<Item = &ResolvedPart> {
        self.parts.values().chain(self.others.iter())
    }
}

impl FromIterator<ResolvedPart> for CategorizedSelection {
    fn from_iter<I: IntoIterator<Item = ResolvedPart>>(iter: I) -> Self {
        let mut selection = Self::new();
        for part in iter {
            selection.insert(part);
        }
        selection
    }
}

/// Ordered rule battery plus the vocabulary used to name attributes.
pub struct CompatibilityEngine {
    rules: Vec<CompatibilityRule>,
    vocabulary: AttributeVocabulary,
}

impl CompatibilityEngine {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            vocabulary: AttributeVocabulary::default(),
        }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        for rule in default_rules() {
            engine.add_rule(rule);
        }
        engine
    }

    pub fn with_vocabulary(mut self, vocabulary: AttributeVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn add_rule(&mut self, rule: CompatibilityRule) {
        self.rules.push(rule);
    }

    /// Keep only rules whose id is listed. An empty list keeps everything.
    pub fn retain_rules(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.rules.retain(|rule| ids.iter().any(|id| id == &rule.id));
    }

    pub fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    pub fn vocabulary(&self) -> &AttributeVocabulary {
        &self.vocabulary
    }

    /// Evaluate every applicable rule. Results follow rule order; only
    /// catalog transport failures abort.
    pub async fn evaluate(
        &self,
        selection: &CategorizedSelection,
        catalog: &dyn CatalogGateway,
    ) -> Result<Vec<RuleResult>, CatalogError> {
        let applicable = self
            .rules
            .iter()
            .filter(|rule| rule.requires.iter().all(|c| selection.contains(c)));

        let results = try_join_all(
            applicable.map(|rule| self.evaluate_rule(rule, selection, catalog)),
        )
        .await?;

        Ok(results)
    }

    async fn evaluate_rule(
        &self,
        rule: &CompatibilityRule,
        selection: &CategorizedSelection,
        catalog: &dyn CatalogGateway,
    ) -> Result<RuleResult, CatalogError> {
        let fetches = rule
            .check
            .operands()
            .into_iter()
            .map(|operand| async move {
                match selection.key(&operand.category) {
                    Some(key) => {
                        let attribute_type = self.vocabulary.key(&operand.attribute);
                        catalog
                            .fetch_attributes(key, attribute_type)
                            .await
                            .map(Some)
                    }
                    None => Ok(None),
                }
            });
        let fetched = try_join_all(fetches).await?;

        for (index, operand) in rule.check.operands().into_iter().enumerate() {
            let Some(values) = fetched.get(index).and_then(|v| v.as_ref()) else {
                continue;
            };
            if values.len() > 1 && rule.check.uses_first_value(index) {
                tracing::debug!(
                    rule = %rule.id,
                    category = %operand.category,
                    attribute = %operand.attribute,
                    count = values.len(),
                    used = %values[0],
                    "several characteristic values, using the first"
                );
            }
        }

        let outcome = rule.check.judge(&rule.label, &fetched);
        let status = match &outcome {
            RuleOutcome::Pass(_) => "pass",
            RuleOutcome::Fail(_) => "fail",
            RuleOutcome::Skip(_) => "skip",
        };
        tracing::debug!(rule = %rule.id, status, "{}", outcome.message());

        Ok(RuleResult {
            rule_id: rule.id.clone(),
            outcome,
        })
    }
}

impl Default for CompatibilityEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
