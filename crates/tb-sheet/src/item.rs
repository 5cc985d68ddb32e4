use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effect::{DEFAULT_VARIANT, PassiveEffect, default_variant};
use crate::formula::Formula;
use crate::skill::Skill;

/// Broad kind of item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    /// Can be equipped into a slot.
    Equipment,
    /// Used up on use.
    Consumable,
    /// Anything else.
    #[default]
    Other,
}

/// An inventory item. Its active variant's effects apply only while equipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Kind of item.
    #[serde(default)]
    pub category: ItemCategory,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Preferred equipment slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Stack size.
    #[serde(default = "one")]
    pub quantity: u32,
    /// Named modes (e.g. sword form / gun form).
    #[serde(default)]
    pub variants: BTreeMap<String, PassiveEffect>,
    /// Selected mode.
    #[serde(default = "default_variant")]
    pub current_variant: String,
    /// Skills carried by the item, active while it is equipped.
    #[serde(default)]
    pub passive_skills: Vec<Skill>,
}

fn one() -> u32 {
    1
}

impl Item {
    /// An item with no effects.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            slot: None,
            quantity: 1,
            variants: BTreeMap::new(),
            current_variant: default_variant(),
            passive_skills: Vec::new(),
        }
    }

    /// Set the preferred slot.
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Add or replace a variant.
    pub fn with_variant(mut self, name: impl Into<String>, effect: PassiveEffect) -> Self {
        self.variants.insert(name.into(), effect);
        self
    }

    /// Add a modifier to the default variant.
    pub fn with_modifier(mut self, stat: impl Into<String>, formula: impl Into<Formula>) -> Self {
        self.variants
            .entry(DEFAULT_VARIANT.to_string())
            .or_default()
            .modifiers
            .insert(stat.into(), formula.into());
        self
    }

    /// Attach a passive skill.
    pub fn with_passive_skill(mut self, skill: Skill) -> Self {
        self.passive_skills.push(skill);
        self
    }

    /// The effect of the selected variant, if it exists.
    pub fn active_effect(&self) -> Option<&PassiveEffect> {
        self.variants.get(&self.current_variant)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if self.quantity != 1 {
            write!(f, " x{}", self.quantity)?;
        }
        if self.current_variant != DEFAULT_VARIANT {
            write!(f, " ({})", self.current_variant)?;
        }
        Ok(())
    }
}
