use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use tb_core::{StatKey, StatMap, StatNameNormalizer};
use tb_formula::RollContext;

use crate::item::Item;
use crate::resource::Resource;
use crate::skill::Skill;

/// Experience totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Experience {
    /// Everything ever gained.
    pub total: i64,
    /// Everything spent.
    pub used: i64,
    /// `total - used`.
    pub free: i64,
}

/// Resource id → current value.
pub type ResourceValues = BTreeMap<String, f64>;

/// A character as computed from its event log. Never stored; always
/// recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterState {
    /// Base stats including growth and item/skill modifiers.
    pub stats: StatMap,
    /// Stats computed from formulas (HP, Defense, ...).
    pub derived_stats: StatMap,
    /// Tags.
    pub tags: BTreeSet<String>,
    /// Experience totals.
    pub exp: Experience,
    /// Items in acquisition order.
    pub inventory: Vec<Item>,
    /// Slot → id of the item in it.
    pub equipment_slots: BTreeMap<String, String>,
    /// Learned skills.
    pub skills: Vec<Skill>,
    /// Skills the player plans to learn.
    pub skill_wishlist: Vec<Skill>,
    /// Resource definitions, implicit ones first.
    pub resources: Vec<Resource>,
    /// Resource id → current value.
    pub resource_values: ResourceValues,
    /// Stat key → display label registered on this character.
    pub custom_labels: BTreeMap<StatKey, String>,
    /// Stats promoted to the main display list, in promotion order.
    pub main_stats: Vec<StatKey>,
}

impl CharacterState {
    /// Empty state with the given base stats.
    pub fn with_stats(stats: StatMap) -> Self {
        Self {
            stats,
            ..Self::default()
        }
    }

    /// Inventory item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.inventory.iter().find(|i| i.id == id)
    }

    /// True if the item sits in any slot.
    pub fn is_equipped(&self, item_id: &str) -> bool {
        self.equipment_slots.values().any(|id| id == item_id)
    }

    /// Equipped items, in inventory order.
    pub fn equipped_items(&self) -> impl Iterator<Item = &Item> {
        self.inventory.iter().filter(|i| self.is_equipped(&i.id))
    }

    /// Learned skill by id.
    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Resource by id (ignoring case) or exact name.
    pub fn resource(&self, key: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.matches(key))
    }

    /// Current value of a resource, looked up like [`Self::resource`].
    pub fn resource_value(&self, key: &str) -> Option<f64> {
        let resource = self.resource(key)?;
        self.resource_values.get(&resource.id).copied()
    }

    /// Derived value if present, otherwise the base stat, otherwise 0.
    pub fn value(&self, key: &StatKey) -> f64 {
        self.derived_stats
            .get(key)
            .or_else(|| self.stats.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    /// Stats and derived stats as a single map, derived taking precedence.
    pub fn merged_stats(&self) -> StatMap {
        self.roll_context().merged()
    }

    /// Context for rolling formulas against this character.
    pub fn roll_context(&self) -> RollContext {
        RollContext::new(self.stats.clone(), self.derived_stats.clone())
    }

    /// Label for display: registered on the character, then the
    /// normalizer's table, then the key itself.
    pub fn label<'a>(&'a self, key: &'a StatKey, normalizer: &'a StatNameNormalizer) -> &'a str {
        match self.custom_labels.get(key) {
            Some(label) => label,
            None => normalizer.display_name(key),
        }
    }

    /// The normalizer extended with this character's custom labels.
    pub fn normalizer(&self, base: &StatNameNormalizer) -> StatNameNormalizer {
        self.custom_labels
            .iter()
            .fold(base.clone(), |n, (key, label)| n.with_alias(label.clone(), key.as_str()))
    }
}
