use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effect::{PassiveEffect, default_variant};
use crate::formula::Formula;
use crate::resource::Resource;

/// Broad kind of skill. Only passive skills apply their variant modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillCategory {
    /// Used as an action; has no standing effect on stats.
    Active,
    /// Always on while learned.
    Passive,
    /// Anything else.
    #[default]
    Other,
}

/// How a skill was acquired, which decides its experience cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquisitionMethod {
    /// Paid with experience; price grows with the number of standard skills.
    #[default]
    Standard,
    /// Granted without cost.
    Free,
    /// Granted by raising grade.
    Grade,
    /// Any other source.
    Other,
}

/// A stat that a skill adds to the sheet just by being learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantedStat {
    /// Stat name or key.
    pub key: String,
    /// Display label to register for the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Amount added to the stat.
    pub value: Formula,
    /// Promote the stat to the main display list.
    #[serde(default)]
    pub is_main: bool,
}

/// A learned (or wished-for) skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Kind of skill.
    #[serde(default)]
    pub category: SkillCategory,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// When the skill can be used, e.g. "major action".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    /// Listed experience cost.
    #[serde(default)]
    pub xp_cost: u32,
    /// User-defined tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// How it was acquired, if recorded on the skill itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition_method: Option<AcquisitionMethod>,
    /// Named modes; only `current_variant` applies.
    #[serde(default)]
    pub variants: BTreeMap<String, PassiveEffect>,
    /// Selected mode.
    #[serde(default = "default_variant")]
    pub current_variant: String,
    /// Stats added while learned, regardless of variant.
    #[serde(default)]
    pub granted_stats: Vec<GrantedStat>,
    /// Resources defined while learned, regardless of variant.
    #[serde(default)]
    pub granted_resources: Vec<Resource>,
}

impl Skill {
    /// A skill with no effects.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: SkillCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            timing: None,
            xp_cost: 0,
            tags: Vec::new(),
            acquisition_method: None,
            variants: BTreeMap::new(),
            current_variant: default_variant(),
            granted_stats: Vec::new(),
            granted_resources: Vec::new(),
        }
    }

    /// Add or replace a variant.
    pub fn with_variant(mut self, name: impl Into<String>, effect: PassiveEffect) -> Self {
        self.variants.insert(name.into(), effect);
        self
    }

    /// Add a granted stat.
    pub fn with_granted_stat(mut self, stat: GrantedStat) -> Self {
        self.granted_stats.push(stat);
        self
    }

    /// Add a granted resource.
    pub fn with_granted_resource(mut self, resource: Resource) -> Self {
        self.granted_resources.push(resource);
        self
    }

    /// The effect of the selected variant, if it exists.
    pub fn active_effect(&self) -> Option<&PassiveEffect> {
        self.variants.get(&self.current_variant)
    }

    /// True for skills whose variant modifiers apply while learned.
    pub fn is_passive(&self) -> bool {
        self.category == SkillCategory::Passive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_effect_follows_current_variant() {
        let mut skill = Skill::new("s1", "Stance", SkillCategory::Passive)
            .with_variant("default", PassiveEffect::new().with_modifier("Combat", "1"))
            .with_variant("guard", PassiveEffect::new().with_modifier("Defense", "2"));
        assert!(skill.active_effect().unwrap().modifiers.contains_key("Combat"));
        skill.current_variant = "guard".into();
        assert!(skill.active_effect().unwrap().modifiers.contains_key("Defense"));
        skill.current_variant = "missing".into();
        assert!(skill.active_effect().is_none());
    }

    #[test]
    fn deserialize_minimal() {
        let json = r#"{"id": "s1", "name": "Slash", "category": "ACTIVE"}"#;
        let skill: Skill = serde_json::from_str(json).unwrap();
        assert_eq!(skill.category, SkillCategory::Active);
        assert_eq!(skill.current_variant, "default");
        assert!(!skill.is_passive());
        assert!(skill.granted_stats.is_empty());
    }

    #[test]
    fn deserialize_granted_stat() {
        let json = r#"{
            "id": "s1", "name": "Granting", "category": "PASSIVE",
            "granted_stats": [{"key": "NewStat", "label": "新しい能力", "value": "10", "is_main": true}],
            "granted_resources": [{"id": "Energy", "name": "Energy", "max": "100", "initial": "100"}]
        }"#;
        let skill: Skill = serde_json::from_str(json).unwrap();
        assert_eq!(skill.granted_stats[0].label.as_deref(), Some("新しい能力"));
        assert!(skill.granted_stats[0].is_main);
        assert_eq!(skill.granted_resources[0].id, "Energy");
    }

    #[test]
    fn acquisition_method_names() {
        let m: AcquisitionMethod = serde_json::from_str("\"Grade\"").unwrap();
        assert_eq!(m, AcquisitionMethod::Grade);
    }
}
