//! Numeric catalog values with a trailing unit, e.g. `"550 W"` or `"320 mm"`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("empty value")]
    Empty,
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    #[error("expected unit {expected}, found '{found}'")]
    UnexpectedUnit { expected: Unit, found: String },
}

/// Units understood by the numeric rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Millimetre,
    Watt,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Millimetre => "mm",
            Unit::Watt => "W",
        }
    }

    /// Case-insensitive suffix match.
    pub fn matches(&self, suffix: &str) -> bool {
        suffix.eq_ignore_ascii_case(self.symbol())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A whole number with an optional unit token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    pub value: u32,
    pub unit: Option<String>,
}

impl Quantity {
    /// Parse `"<digits>"`, `"<digits> <unit>"` or `"<digits><unit>"`.
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(QuantityError::Empty);
        }

        let split = text
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map(|(index, _)| index)
            .unwrap_or(text.len());
        let (digits, rest) = text.split_at(split);
        let unit = rest.trim_start();

        if digits.is_empty() || !unit.chars().all(|ch| ch.is_alphabetic()) {
            return Err(QuantityError::NotANumber(raw.to_string()));
        }
        let value = digits
            .parse::<u32>()
            .map_err(|_| QuantityError::NotANumber(raw.to_string()))?;

        Ok(Self {
            value,
            unit: (!unit.is_empty()).then(|| unit.to_string()),
        })
    }

    /// Parse and require `expected` as the unit. A bare number is taken as
    /// already being in `expected`.
    pub fn parse_as(raw: &str, expected: Unit) -> Result<u32, QuantityError> {
        let quantity = Self::parse(raw)?;
        match quantity.unit {
            Some(ref unit) if !expected.matches(unit) => Err(QuantityError::UnexpectedUnit {
                expected,
                found: unit.clone(),
            }),
            _ => Ok(quantity.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_with_spaced_unit() {
        let q = Quantity::parse("550 W").unwrap();
        assert_eq!(q.value, 550);
        assert_eq!(q.unit.as_deref(), Some("W"));
    }

    #[test]
    fn test_parse_value_with_glued_unit_and_padding() {
        let q = Quantity::parse("  320mm ").unwrap();
        assert_eq!(q.value, 320);
        assert_eq!(q.unit.as_deref(), Some("mm"));
    }

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(Quantity::parse("65").unwrap().unit, None);
        assert_eq!(Quantity::parse_as("65", Unit::Watt), Ok(65));
    }

    #[test]
    fn test_unit_matching_is_case_insensitive() {
        assert_eq!(Quantity::parse_as("550 w", Unit::Watt), Ok(550));
        assert_eq!(Quantity::parse_as("550 W", Unit::Watt), Ok(550));
        assert_eq!(Quantity::parse_as("330 MM", Unit::Millimetre), Ok(330));
    }

    #[test]
    fn test_foreign_unit_is_rejected() {
        assert_eq!(
            Quantity::parse_as("13 in", Unit::Millimetre),
            Err(QuantityError::UnexpectedUnit {
                expected: Unit::Millimetre,
                found: "in".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_values() {
        assert_eq!(Quantity::parse("   "), Err(QuantityError::Empty));
        assert!(matches!(Quantity::parse("W"), Err(QuantityError::NotANumber(_))));
        assert!(matches!(Quantity::parse("2.5 W"), Err(QuantityError::NotANumber(_))));
        assert!(matches!(Quantity::parse("-5 W"), Err(QuantityError::NotANumber(_))));
        assert!(matches!(Quantity::parse("550 W max"), Err(QuantityError::NotANumber(_))));
        assert!(matches!(
            Quantity::parse("99999999999 W"),
            Err(QuantityError::NotANumber(_))
        ));
    }
}
