//! Replays an event log into a [`CharacterState`].
//!
//! Reduction runs in fixed phases:
//!
//! 1. Revoked events are dropped.
//! 2. The remaining events are folded in log order. Resource changes are
//!    queued because their formulas may refer to derived stats.
//! 3. Skills (and the passive skills of equipped items) grant their stats
//!    and resources.
//! 4. Equipped items, their passive skills, and learned passive skills apply
//!    the modifiers and overrides of their active variant.
//! 5. Derived stats are computed.
//! 6. Resources get their initial values, then the queued changes.
//!
//! Reduction never fails. Events that refer to missing items or skills are
//! skipped, and formulas that fail to evaluate count as 0; both are logged.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use tb_core::{StatKey, StatMap, StatNameNormalizer};

use crate::effect::PassiveEffect;
use crate::event::{CharacterEvent, EventKind};
use crate::formula::Formula;
use crate::resource::{Bounds, ResetMode, ResourceChange, Track};
use crate::rules::RuleSet;
use crate::skill::Skill;
use crate::state::CharacterState;

/// Compute a character's state from its events with the standard rules.
pub fn calculate_state(events: &[CharacterEvent], base_stats: &StatMap) -> CharacterState {
    StateReducer::default().reduce(events, base_stats)
}

/// Folds events into state under a [`RuleSet`].
#[derive(Debug, Clone)]
pub struct StateReducer {
    rules: RuleSet,
    normalizer: StatNameNormalizer,
}

impl Default for StateReducer {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}

/// A resource change waiting for derived stats.
#[derive(Debug)]
enum QueuedChange {
    One {
        resource_id: String,
        change: ResourceChange,
    },
    ResetAll,
}

/// Fold accumulator.
struct Replay {
    state: CharacterState,
    queued: Vec<QueuedChange>,
    normalizer: StatNameNormalizer,
}

impl StateReducer {
    /// A reducer for `rules` with the standard normalizer.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            normalizer: StatNameNormalizer::standard().clone(),
        }
    }

    /// Resolve stat names through `normalizer` instead.
    pub fn with_normalizer(mut self, normalizer: StatNameNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// The rules in use.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Replay `events` on top of `base_stats`.
    pub fn reduce(&self, events: &[CharacterEvent], base_stats: &StatMap) -> CharacterState {
        let revoked: HashSet<Uuid> = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::EventRevoked {
                    target_event_id, ..
                } => Some(*target_event_id),
                _ => None,
            })
            .collect();
        debug!(events = events.len(), revoked = revoked.len(), "reducing event log");

        let initial = Replay {
            state: CharacterState::with_stats(base_stats.clone()),
            queued: Vec::new(),
            normalizer: self.normalizer.clone(),
        };
        let Replay {
            state,
            queued,
            mut normalizer,
        } = events
            .iter()
            .filter(|e| !revoked.contains(&e.id))
            .fold(initial, |replay, event| apply_event(replay, event));

        let state = grant(state, &mut normalizer);
        let (state, formulas) = self.apply_effects(state, &normalizer);
        let state = derive(state, &formulas, &normalizer);
        let mut state = self.settle_resources(state, queued, &normalizer);
        state.exp.free = state.exp.total - state.exp.used;
        state
    }

    fn apply_effects(
        &self,
        mut state: CharacterState,
        normalizer: &StatNameNormalizer,
    ) -> (CharacterState, BTreeMap<StatKey, Formula>) {
        let mut formulas: BTreeMap<StatKey, Formula> = self
            .rules
            .derived_formulas
            .iter()
            .map(|(key, formula)| (normalizer.normalize(key), formula.clone()))
            .collect();

        let effects: Vec<PassiveEffect> = state
            .equipped_items()
            .filter_map(|item| item.active_effect())
            .chain(
                state
                    .equipped_items()
                    .flat_map(|item| &item.passive_skills)
                    .filter_map(Skill::active_effect),
            )
            .chain(
                state
                    .skills
                    .iter()
                    .filter(|s| s.is_passive())
                    .filter_map(Skill::active_effect),
            )
            .cloned()
            .collect();

        for effect in effects {
            for (stat, formula) in &effect.modifiers {
                let value = evaluate_or_zero(formula, &state.stats, normalizer, stat);
                *state.stats.entry(normalizer.normalize(stat)).or_insert(0.0) += value;
            }
            for (stat, formula) in &effect.overrides {
                formulas.insert(normalizer.normalize(stat), formula.clone());
            }
        }

        (state, formulas)
    }

    fn settle_resources(
        &self,
        mut state: CharacterState,
        queued: Vec<QueuedChange>,
        normalizer: &StatNameNormalizer,
    ) -> CharacterState {
        let mut resources: Vec<_> = self
            .rules
            .implicit_resources
            .iter()
            .filter(|implicit| {
                !state
                    .resources
                    .iter()
                    .any(|r| r.id.eq_ignore_ascii_case(&implicit.id))
            })
            .cloned()
            .collect();
        resources.append(&mut state.resources);
        state.resources = resources;

        let context = state.merged_stats();
        let mut tracks: BTreeMap<String, Track> = state
            .resources
            .iter()
            .map(|resource| {
                let track = resource
                    .initial_track(&context, normalizer)
                    .unwrap_or_else(|e| {
                        warn!(resource = %resource.id, error = %e, "resource formula failed, starting at 0");
                        Track::new(0.0, Bounds::default())
                    });
                (resource.id.clone(), track)
            })
            .collect();

        for change in queued {
            match change {
                QueuedChange::ResetAll => {
                    for resource in &state.resources {
                        if resource.reset_mode == ResetMode::None {
                            continue;
                        }
                        if let Some(track) = tracks.get_mut(&resource.id) {
                            let reset = resource.apply_change(
                                track,
                                &ResourceChange::Reset,
                                &context,
                                normalizer,
                            );
                            if let Err(e) = reset {
                                warn!(resource = %resource.id, error = %e, "resource reset failed");
                            }
                        }
                    }
                }
                QueuedChange::One {
                    resource_id,
                    change,
                } => {
                    let Some(resource) = state.resource(&resource_id) else {
                        debug!(resource = %resource_id, "update for unknown resource, skipping");
                        continue;
                    };
                    if let Some(track) = tracks.get_mut(&resource.id) {
                        if let Err(e) = resource.apply_change(track, &change, &context, normalizer)
                        {
                            warn!(resource = %resource_id, error = %e, "resource update failed");
                        }
                    }
                }
            }
        }

        state.resource_values = tracks
            .into_iter()
            .map(|(id, track)| (id, track.current))
            .collect();
        state
    }
}

/// One step of the fold.
fn apply_event(mut replay: Replay, event: &CharacterEvent) -> Replay {
    let Replay {
        state,
        queued,
        normalizer,
    } = &mut replay;

    match &event.kind {
        EventKind::StatGrown { key, delta, cost } => {
            *state.stats.entry(normalizer.normalize(key)).or_insert(0.0) += delta;
            state.exp.used += cost;
        }
        EventKind::SkillLearned {
            skill,
            acquisition_method,
            cost,
        } => {
            let mut skill = skill.clone();
            skill.acquisition_method = Some(*acquisition_method);
            upsert_skill(&mut state.skills, skill);
            state.exp.used += cost;
        }
        EventKind::ItemAdded { item, .. } => {
            match state.inventory.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => state.inventory.push(item.clone()),
            }
        }
        EventKind::ItemEquipped { item_id, slot } => {
            let Some(item) = state.item(item_id) else {
                debug!(event = %event.id, item = %item_id, "equip of unknown item, skipping");
                return replay;
            };
            let Some(slot) = slot.clone().or_else(|| item.slot.clone()) else {
                debug!(event = %event.id, item = %item_id, "equip without a slot, skipping");
                return replay;
            };
            state.equipment_slots.retain(|_, id| id != item_id);
            state.equipment_slots.insert(slot, item_id.clone());
        }
        EventKind::ItemUnequipped { item_id, slot } => match slot {
            Some(slot) => {
                if state.equipment_slots.get(slot) == Some(item_id) {
                    state.equipment_slots.remove(slot);
                }
            }
            None => state.equipment_slots.retain(|_, id| id != item_id),
        },
        EventKind::ItemRemoved { item_id } => {
            state.inventory.retain(|i| &i.id != item_id);
            state.equipment_slots.retain(|_, id| id != item_id);
        }
        EventKind::ItemUpdated { item_id, item } => {
            match state.inventory.iter_mut().find(|i| &i.id == item_id) {
                Some(existing) => {
                    *existing = item.clone();
                    existing.id = item_id.clone();
                }
                None => debug!(event = %event.id, item = %item_id, "update of unknown item, skipping"),
            }
        }
        EventKind::ItemVariantSelected { item_id, variant } => {
            match state.inventory.iter_mut().find(|i| &i.id == item_id) {
                Some(item) if item.variants.contains_key(variant) => {
                    item.current_variant = variant.clone();
                }
                _ => debug!(event = %event.id, item = %item_id, variant = %variant, "unknown item variant, skipping"),
            }
        }
        EventKind::SkillRevised {
            skill_id, skill, ..
        } => match state.skills.iter_mut().find(|s| &s.id == skill_id) {
            Some(existing) => {
                let method = existing.acquisition_method;
                *existing = skill.clone();
                existing.acquisition_method = existing.acquisition_method.or(method);
            }
            None => debug!(event = %event.id, skill = %skill_id, "revision of unknown skill, skipping"),
        },
        EventKind::SkillForgotten { skill_id } => {
            state.skills.retain(|s| &s.id != skill_id);
        }
        EventKind::WishlistSkillAdded { skill } => {
            upsert_skill(&mut state.skill_wishlist, skill.clone());
        }
        EventKind::WishlistSkillRemoved { skill_id } => {
            state.skill_wishlist.retain(|s| &s.id != skill_id);
        }
        EventKind::ExperienceGained { amount, .. } => state.exp.total += amount,
        EventKind::ExperienceSpent { amount, .. } => state.exp.used += amount,
        EventKind::GradeRaised { after, .. } => {
            state.stats.insert(normalizer.normalize("Grade"), *after as f64);
        }
        EventKind::AbilityRaised { key, after, .. } => {
            state.stats.insert(normalizer.normalize(key), *after as f64);
        }
        EventKind::StatUpdated {
            key,
            value,
            is_main,
        } => {
            let key = normalizer.normalize(key);
            match value.evaluate(&state.stats, normalizer) {
                Ok(v) => {
                    state.stats.insert(key.clone(), v);
                }
                Err(e) => warn!(event = %event.id, stat = %key, error = %e, "stat formula failed, skipping"),
            }
            if *is_main {
                promote(state, key);
            }
        }
        EventKind::StatLabelRegistered {
            key,
            label,
            is_main,
        } => {
            let key = normalizer.normalize(key);
            register_label(state, normalizer, &key, label);
            if *is_main {
                promote(state, key);
            }
        }
        EventKind::TagAdded { tag } => {
            state.tags.insert(tag.clone());
        }
        EventKind::TagRemoved { tag } => {
            state.tags.remove(tag);
        }
        EventKind::ResourceDefined { resource } => {
            match state.resources.iter_mut().find(|r| r.id == resource.id) {
                Some(existing) => *existing = resource.clone(),
                None => state.resources.push(resource.clone()),
            }
        }
        EventKind::ResourceUpdated {
            resource_id,
            change,
        } => queued.push(QueuedChange::One {
            resource_id: resource_id.clone(),
            change: change.clone(),
        }),
        EventKind::ResourcesReset => queued.push(QueuedChange::ResetAll),
        EventKind::EventRevoked { .. } => {}
    }

    replay
}

/// Apply granted stats and resources of learned skills and of the passive
/// skills of equipped items.
fn grant(mut state: CharacterState, normalizer: &mut StatNameNormalizer) -> CharacterState {
    let granting: Vec<Skill> = state
        .skills
        .iter()
        .chain(state.equipped_items().flat_map(|item| &item.passive_skills))
        .cloned()
        .collect();

    for skill in granting {
        for granted in &skill.granted_stats {
            let key = normalizer.normalize(&granted.key);
            if let Some(label) = &granted.label {
                register_label(&mut state, normalizer, &key, label);
            }
            if granted.is_main {
                promote(&mut state, key.clone());
            }
            let value = evaluate_or_zero(&granted.value, &state.stats, normalizer, &granted.key);
            *state.stats.entry(key).or_insert(0.0) += value;
        }
        for resource in skill.granted_resources {
            if !state.resources.iter().any(|r| r.id == resource.id) {
                state.resources.push(resource);
            }
        }
    }

    state
}

/// Derived value = formula result + any flat bonus sitting on the same key.
fn derive(
    mut state: CharacterState,
    formulas: &BTreeMap<StatKey, Formula>,
    normalizer: &StatNameNormalizer,
) -> CharacterState {
    for (key, formula) in formulas {
        let bonus = state.stats.get(key).copied().unwrap_or(0.0);
        let value = match formula.evaluate(&state.stats, normalizer) {
            Ok(v) => v + bonus,
            Err(e) => {
                warn!(stat = %key, formula = %formula, error = %e, "derived formula failed, using bonus only");
                bonus
            }
        };
        state.derived_stats.insert(key.clone(), value);
    }
    state
}

fn evaluate_or_zero(
    formula: &Formula,
    stats: &StatMap,
    normalizer: &StatNameNormalizer,
    stat: &str,
) -> f64 {
    formula.evaluate(stats, normalizer).unwrap_or_else(|e| {
        warn!(stat, formula = %formula, error = %e, "modifier formula failed, using 0");
        0.0
    })
}

fn upsert_skill(skills: &mut Vec<Skill>, skill: Skill) {
    match skills.iter_mut().find(|s| s.id == skill.id) {
        Some(existing) => *existing = skill,
        None => skills.push(skill),
    }
}

fn promote(state: &mut CharacterState, key: StatKey) {
    if !state.main_stats.contains(&key) {
        state.main_stats.push(key);
    }
}

fn register_label(
    state: &mut CharacterState,
    normalizer: &mut StatNameNormalizer,
    key: &StatKey,
    label: &str,
) {
    state.custom_labels.insert(key.clone(), label.to_string());
    *normalizer = std::mem::take(normalizer).with_alias(label, key.as_str());
}
