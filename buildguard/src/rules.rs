//! Compatibility rule descriptors.
//!
//! A rule is data: the categories it needs, the attributes it reads and the
//! comparison applied to them. The engine walks the list in order, fetches
//! what each [`Check`] asks for and hands the values back to
//! [`Check::judge`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::quantity::{Quantity, QuantityError, Unit};
use crate::report::RuleOutcome;

/// Fixed allowance for everything besides CPU and GPU, in watts.
pub const DEFAULT_POWER_HEADROOM_W: u32 = 100;

/// Characteristics read by the rule battery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Socket,
    MaxMemory,
    FormFactor,
    SupportedFormFactors,
    Length,
    MaxGpuLength,
    Power,
    Tdp,
    Interface,
    SataPorts,
    M2Ports,
    /// Characteristic type passed to the catalog verbatim.
    Custom(String),
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Socket => "socket",
            AttributeKind::MaxMemory => "max RAM",
            AttributeKind::FormFactor => "form factor",
            AttributeKind::SupportedFormFactors => "supported form factors",
            AttributeKind::Length => "length",
            AttributeKind::MaxGpuLength => "max GPU length",
            AttributeKind::Power => "power",
            AttributeKind::Tdp => "TDP",
            AttributeKind::Interface => "interface",
            AttributeKind::SataPorts => "SATA ports",
            AttributeKind::M2Ports => "M.2 ports",
            AttributeKind::Custom(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Maps attribute kinds to the characteristic type strings of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeVocabulary {
    pub socket: String,
    pub max_memory: String,
    pub form_factor: String,
    pub supported_form_factors: String,
    pub length: String,
    pub max_gpu_length: String,
    pub power: String,
    pub tdp: String,
    pub interface: String,
    pub sata_ports: String,
    pub m2_ports: String,
}

impl Default for AttributeVocabulary {
    fn default() -> Self {
        Self {
            socket: "socket".to_string(),
            max_memory: "max ram".to_string(),
            form_factor: "form factor".to_string(),
            supported_form_factors: "supported form factors".to_string(),
            length: "length".to_string(),
            max_gpu_length: "max gpu length".to_string(),
            power: "power".to_string(),
            tdp: "tdp".to_string(),
            interface: "interface".to_string(),
            sata_ports: "sata ports".to_string(),
            m2_ports: "m2 ports".to_string(),
        }
    }
}

impl AttributeVocabulary {
    /// Characteristic types of the Spanish-language product graph.
    pub fn legacy() -> Self {
        Self {
            socket: "enchufe".to_string(),
            max_memory: "ram maxima".to_string(),
            form_factor: "factor de forma".to_string(),
            supported_form_factors: "factores de forma".to_string(),
            length: "longitud".to_string(),
            max_gpu_length: "longitud maxima de gpu".to_string(),
            power: "potencia".to_string(),
            tdp: "tdp".to_string(),
            interface: "interfaz".to_string(),
            sata_ports: "puertos sata".to_string(),
            m2_ports: "puertos m2".to_string(),
        }
    }

    pub fn key<'a>(&'a self, kind: &'a AttributeKind) -> &'a str {
        match kind {
            AttributeKind::Socket => &self.socket,
            AttributeKind::MaxMemory => &self.max_memory,
            AttributeKind::FormFactor => &self.form_factor,
            AttributeKind::SupportedFormFactors => &self.supported_form_factors,
            AttributeKind::Length => &self.length,
            AttributeKind::MaxGpuLength => &self.max_gpu_length,
            AttributeKind::Power => &self.power,
            AttributeKind::Tdp => &self.tdp,
            AttributeKind::Interface => &self.interface,
            AttributeKind::SataPorts => &self.sata_ports,
            AttributeKind::M2Ports => &self.m2_ports,
            AttributeKind::Custom(name) => name,
        }
    }
}

/// One attribute of the part selected for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub category: Category,
    pub attribute: AttributeKind,
}

impl Operand {
    pub fn new(category: Category, attribute: AttributeKind) -> Self {
        Self {
            category,
            attribute,
        }
    }
}

/// Comparison applied by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// First values of both operands must be equal.
    Equal { left: Operand, right: Operand },
    /// Informational: reports the first value, never fails.
    Report { operand: Operand, note: String },
    /// First value must appear in the union of the set operands' values.
    MemberOf { value: Operand, set: Vec<Operand> },
    /// `item <= limit` after unit-aware parsing.
    Fits {
        item: Operand,
        limit: Operand,
        unit: Unit,
    },
    /// `supply >= sum(loads) + headroom`. Loads whose category is not
    /// selected contribute nothing.
    PowerBudget {
        supply: Operand,
        loads: Vec<Operand>,
        headroom: u32,
        unit: Unit,
    },
}

impl Check {
    /// Operands to fetch, in the order [`Check::judge`] expects them.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Check::Equal { left, right } => vec![left, right],
            Check::Report { operand, .. } => vec![operand],
            Check::MemberOf { value, set } => std::iter::once(value).chain(set).collect(),
            Check::Fits { item, limit, .. } => vec![item, limit],
            Check::PowerBudget { supply, loads, .. } => {
                std::iter::once(supply).chain(loads).collect()
            }
        }
    }

    /// Whether the check can run without this operand's category selected.
    pub fn is_optional(&self, operand_index: usize) -> bool {
        matches!(self, Check::PowerBudget { .. }) && operand_index > 0
    }

    /// Whether only the first fetched value of this operand is read.
    /// Set operands of [`Check::MemberOf`] read every value.
    pub fn uses_first_value(&self, operand_index: usize) -> bool {
        !(matches!(self, Check::MemberOf { .. }) && operand_index > 0)
    }

    /// Categories that must be selected for the check to apply.
    pub fn required_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for (index, operand) in self.operands().into_iter().enumerate() {
            if !self.is_optional(index) && !categories.contains(&operand.category) {
                categories.push(operand.category.clone());
            }
        }
        categories
    }

    /// Decide the outcome from fetched values. `fetched` lines up with
    /// [`Check::operands`]; `None` marks an optional operand whose category
    /// is not selected.
    pub fn judge(&self, label: &str, fetched: &[Option<Vec<String>>]) -> RuleOutcome {
        let values = |index: usize| nth(fetched, index);

        match self {
            Check::Equal { .. } => {
                let (Some(left), Some(right)) = (values(0).first(), values(1).first()) else {
                    return missing_data(label);
                };
                if left == right {
                    RuleOutcome::Pass(format!("{} compatible: {}", label, left))
                } else {
                    RuleOutcome::Fail(format!("{} incompatible: {} vs {}", label, left, right))
                }
            }
            Check::Report { operand, note } => match values(0).first() {
                Some(value) => RuleOutcome::Pass(format!(
                    "{}: {} {} ({})",
                    label, operand.attribute, value, note
                )),
                None => missing_data(label),
            },
            Check::MemberOf { .. } => {
                let supported: Vec<&String> =
                    (1..fetched.len()).flat_map(|i| values(i).iter()).collect();
                let Some(value) = values(0).first() else {
                    return missing_data(label);
                };
                if supported.is_empty() {
                    return missing_data(label);
                }
                let listed = supported
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                if supported.contains(&value) {
                    RuleOutcome::Pass(format!("{} compatible: {} in [{}]", label, value, listed))
                } else {
                    RuleOutcome::Fail(format!(
                        "{} incompatible: {} not supported by [{}]",
                        label, value, listed
                    ))
                }
            }
            Check::Fits { item, limit, unit } => {
                let (Some(raw_item), Some(raw_limit)) = (values(0).first(), values(1).first())
                else {
                    return missing_data(label);
                };
                let size = match Quantity::parse_as(raw_item, *unit) {
                    Ok(v) => v,
                    Err(e) => return malformed(label, &item.attribute, raw_item, &e),
                };
                let max = match Quantity::parse_as(raw_limit, *unit) {
                    Ok(v) => v,
                    Err(e) => return malformed(label, &limit.attribute, raw_limit, &e),
                };
                if size > max {
                    RuleOutcome::Fail(format!(
                        "{} incompatible: {} > {}",
                        label, raw_item, raw_limit
                    ))
                } else {
                    RuleOutcome::Pass(format!("{} compatible: {} <= {}", label, raw_item, raw_limit))
                }
            }
            Check::PowerBudget {
                supply,
                loads,
                headroom,
                unit,
            } => {
                let Some(raw_supply) = values(0).first() else {
                    return missing_data(label);
                };
                let rated = match Quantity::parse_as(raw_supply, *unit) {
                    Ok(v) => v,
                    Err(e) => return malformed(label, &supply.attribute, raw_supply, &e),
                };

                let mut draw = u64::from(*headroom);
                for (offset, load) in loads.iter().enumerate() {
                    let Some(load_values) = fetched.get(offset + 1).and_then(|v| v.as_ref()) else {
                        continue;
                    };
                    let Some(raw_load) = load_values.first() else {
                        return missing_data(label);
                    };
                    match Quantity::parse_as(raw_load, *unit) {
                        Ok(v) => draw += u64::from(v),
                        Err(e) => return malformed(label, &load.attribute, raw_load, &e),
                    }
                }

                if u64::from(rated) < draw {
                    RuleOutcome::Fail(format!(
                        "{} insufficient: {} {} < {} {} estimated draw",
                        label, rated, unit, draw, unit
                    ))
                } else {
                    RuleOutcome::Pass(format!(
                        "{} adequate: {} {} >= {} {} estimated draw",
                        label, rated, unit, draw, unit
                    ))
                }
            }
        }
    }
}

fn nth(fetched: &[Option<Vec<String>>], index: usize) -> &[String] {
    fetched
        .get(index)
        .and_then(|v| v.as_deref())
        .unwrap_or_default()
}

fn missing_data(label: &str) -> RuleOutcome {
    RuleOutcome::Skip(format!("Could not validate {} (missing data).", label))
}

fn malformed(label: &str, attribute: &AttributeKind, raw: &str, error: &QuantityError) -> RuleOutcome {
    RuleOutcome::Skip(format!(
        "Could not validate {} (malformed {} value '{}': {}).",
        label, attribute, raw, error
    ))
}

/// A named entry of the rule battery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub id: String,
    /// Short pair name used in messages, e.g. `CPU-Motherboard`.
    pub label: String,
    pub description: String,
    pub requires: Vec<Category>,
    pub check: Check,
}

impl CompatibilityRule {
    /// Build a rule whose precondition is every non-optional operand category.
    pub fn new(id: impl Into<String>, label: impl Into<String>, check: Check) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            requires: check.required_categories(),
            check,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the precondition categories.
    pub fn requiring(mut self, categories: Vec<Category>) -> Self {
        self.requires = categories;
        self
    }
}

/// The standard battery, in evaluation order.
pub fn default_rules() -> Vec<CompatibilityRule> {
    use AttributeKind as A;
    use Category as C;

    vec![
        CompatibilityRule::new(
            "cpu_motherboard_socket",
            "CPU-Motherboard",
            Check::Equal {
                left: Operand::new(C::Cpu, A::Socket),
                right: Operand::new(C::Motherboard, A::Socket),
            },
        )
        .with_description("CPU socket must match the motherboard socket"),
        CompatibilityRule::new(
            "motherboard_memory",
            "Motherboard-RAM",
            Check::Report {
                operand: Operand::new(C::Motherboard, A::MaxMemory),
                note: "capacity not compared".to_string(),
            },
        )
        .with_description("Reports the motherboard's maximum RAM (informational only)")
        .requiring(vec![C::Motherboard, C::Memory]),
        CompatibilityRule::new(
            "motherboard_case_form_factor",
            "Motherboard-Case",
            Check::MemberOf {
                value: Operand::new(C::Motherboard, A::FormFactor),
                set: vec![Operand::new(C::Case, A::SupportedFormFactors)],
            },
        )
        .with_description("Motherboard form factor must be supported by the case"),
        CompatibilityRule::new(
            "gpu_case_clearance",
            "GPU-Case",
            Check::Fits {
                item: Operand::new(C::Gpu, A::Length),
                limit: Operand::new(C::Case, A::MaxGpuLength),
                unit: Unit::Millimetre,
            },
        )
        .with_description("GPU length must not exceed the case's maximum GPU length"),
        CompatibilityRule::new(
            "psu_power_budget",
            "PSU",
            Check::PowerBudget {
                supply: Operand::new(C::PowerSupply, A::Power),
                loads: vec![Operand::new(C::Cpu, A::Tdp), Operand::new(C::Gpu, A::Tdp)],
                headroom: DEFAULT_POWER_HEADROOM_W,
                unit: Unit::Watt,
            },
        )
        .with_description("PSU rating must cover CPU TDP + GPU TDP + 100 W"),
        CompatibilityRule::new(
            "storage_motherboard_interface",
            "Storage-Motherboard",
            Check::MemberOf {
                value: Operand::new(C::Storage, A::Interface),
                set: vec![
                    Operand::new(C::Motherboard, A::SataPorts),
                    Operand::new(C::Motherboard, A::M2Ports),
                ],
            },
        )
        .with_description("Storage interface must be offered by the motherboard's SATA or M.2 ports"),
    ]
}
