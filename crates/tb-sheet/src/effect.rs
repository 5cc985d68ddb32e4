use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formula::Formula;

/// Name of the variant every item and skill starts with.
pub const DEFAULT_VARIANT: &str = "default";

pub(crate) fn default_variant() -> String {
    DEFAULT_VARIANT.to_string()
}

/// Stat effects of one item or skill variant.
///
/// Modifiers are additive. Overrides replace the derived formula for a key
/// entirely (e.g. armor that sets `Defense` to `{Body} + 5`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveEffect {
    /// Stat name → formula whose result is added to that stat.
    #[serde(default)]
    pub modifiers: BTreeMap<String, Formula>,
    /// Derived-stat name → replacement formula.
    #[serde(default)]
    pub overrides: BTreeMap<String, Formula>,
    /// Passive check text shown on the sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive_check: Option<String>,
    /// Restriction text, e.g. "only while HP is below half".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<String>,
}

impl PassiveEffect {
    /// An effect with no modifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an additive modifier.
    pub fn with_modifier(mut self, stat: impl Into<String>, formula: impl Into<Formula>) -> Self {
        self.modifiers.insert(stat.into(), formula.into());
        self
    }

    /// Add a derived-formula override.
    pub fn with_override(mut self, stat: impl Into<String>, formula: impl Into<Formula>) -> Self {
        self.overrides.insert(stat.into(), formula.into());
        self
    }

    /// True if the effect changes no numbers.
    pub fn is_inert(&self) -> bool {
        self.modifiers.is_empty() && self.overrides.is_empty()
    }
}
