//! Rules of the game system: derived-stat formulas, implicit resources,
//! and experience costs.
//!
//! [`RuleSet::standard`] is the built-in system. A custom ruleset can be
//! built with the `with_*` methods or loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tb_core::{TbError, TbResult};

use crate::formula::Formula;
use crate::resource::Resource;
use crate::skill::AcquisitionMethod;

/// Derived-stat formulas and implicit resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Stat name → formula computing it from base stats.
    pub derived_formulas: BTreeMap<String, Formula>,
    /// Resources every character has unless it defines one with the same id.
    pub implicit_resources: Vec<Resource>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// A ruleset with no formulas and no implicit resources.
    pub fn empty() -> Self {
        Self {
            derived_formulas: BTreeMap::new(),
            implicit_resources: Vec::new(),
        }
    }

    /// The built-in system.
    pub fn standard() -> Self {
        Self::empty()
            .with_formula("HP", "({Grade} + {Body}) * 5")
            .with_formula("MP", "({Grade} + {Spirit}) * 5")
            .with_formula("Defense", "{Body} * 2")
            .with_formula("MagicDefense", "{Spirit} * 2")
            .with_formula("ActionSpeed", "{Grade} + {Science} + 10")
            .with_implicit_resource(
                Resource::new("HP", "HP")
                    .with_max("{HP}")
                    .with_min("0")
                    .with_initial("{HP}"),
            )
            .with_implicit_resource(
                Resource::new("MP", "MP")
                    .with_max("{MP}")
                    .with_min("0")
                    .with_initial("{MP}"),
            )
    }

    /// Add or replace a derived formula.
    pub fn with_formula(mut self, stat: impl Into<String>, formula: impl Into<Formula>) -> Self {
        self.derived_formulas.insert(stat.into(), formula.into());
        self
    }

    /// Add an implicit resource, replacing one with the same id.
    pub fn with_implicit_resource(mut self, resource: Resource) -> Self {
        self.implicit_resources.retain(|r| r.id != resource.id);
        self.implicit_resources.push(resource);
        self
    }

    /// Parse a ruleset from JSON. Missing fields fall back to the standard
    /// rules.
    pub fn from_json(json: &str) -> TbResult<Self> {
        serde_json::from_str(json).map_err(|e| TbError::Validation(format!("invalid ruleset: {e}")))
    }
}

/// Experience cost of raising a stat from `current` by one.
pub fn stat_growth_cost(current: i64, is_grade: bool) -> i64 {
    if is_grade { current * 10 } else { current * 5 }
}

/// Experience cost of one skill acquisition attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkillCost {
    /// Paid if the acquisition succeeds.
    pub success: i64,
    /// Paid if it fails.
    pub failure: i64,
}

/// Cost of acquiring a skill given the number of standard skills already
/// learned. A grade skill is free on the first attempt, 1 on a retry.
pub fn skill_cost(standard_skills: u32, method: AcquisitionMethod, retry: bool) -> SkillCost {
    match method {
        AcquisitionMethod::Standard => SkillCost {
            success: (i64::from(standard_skills) + 1) * 5,
            failure: 1,
        },
        AcquisitionMethod::Grade if retry => SkillCost {
            success: 0,
            failure: 1,
        },
        AcquisitionMethod::Grade | AcquisitionMethod::Free | AcquisitionMethod::Other => {
            SkillCost::default()
        }
    }
}
