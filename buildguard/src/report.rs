//! Rule outcomes and their aggregation into a verdict.

use serde::{Deserialize, Serialize};

/// What a single rule concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum RuleOutcome {
    Pass(String),
    Fail(String),
    /// The rule applied but could not be decided from catalog data.
    Skip(String),
}

impl RuleOutcome {
    pub fn message(&self) -> &str {
        match self {
            RuleOutcome::Pass(m) | RuleOutcome::Fail(m) | RuleOutcome::Skip(m) => m,
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, RuleOutcome::Fail(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, RuleOutcome::Skip(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub outcome: RuleOutcome,
}

/// Final verdict of a run.
///
/// `errors` holds failure messages and `details` holds pass and skip
/// messages, both in rule order. `outcomes` keeps the typed results so a
/// renderer can tell passes from skips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub details: Vec<String>,
    pub outcomes: Vec<RuleResult>,
}

impl ValidationReport {
    pub fn from_outcomes(outcomes: Vec<RuleResult>) -> Self {
        let mut errors = Vec::new();
        let mut details = Vec::new();
        for result in &outcomes {
            match &result.outcome {
                RuleOutcome::Fail(m) => errors.push(m.clone()),
                RuleOutcome::Pass(m) | RuleOutcome::Skip(m) => details.push(m.clone()),
            }
        }
        Self {
            valid: errors.is_empty(),
            errors,
            details,
            outcomes,
        }
    }

    /// Record an error that did not come from a rule (e.g. strict-mode
    /// selection problems).
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    /// Skip messages in rule order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.is_skip())
            .map(|r| r.outcome.message())
    }

    pub fn skipped(&self) -> usize {
        self.warnings().count()
    }

    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Pass(_)))
            .count()
    }
}
