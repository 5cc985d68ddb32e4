//! Display-time resource tracking during play.
//!
//! Resource commands typed into the chat change a [`ResourceValues`]
//! overlay, never the character's event log. The overlay starts from the
//! values the reducer computed and is thrown away when the session ends.

use rand::Rng;
use tracing::debug;

use tb_core::{StatMap, StatNameNormalizer, TbError, TbResult};
use tb_formula::{DiceRoller, RollOutcome};
use tb_sheet::{CharacterState, ResetMode, Resource, ResourceChange, ResourceValues, Track};

use crate::command::ResourceCommand;
use crate::{ChatInput, classify};

/// Apply `command` to `values` and return the updated overlay.
///
/// Resources are looked up in `state` (id ignoring case, or exact name).
/// A resource missing from `values` starts from its value in `state`.
pub fn apply_command(
    values: &ResourceValues,
    command: &ResourceCommand,
    state: &CharacterState,
) -> TbResult<ResourceValues> {
    let normalizer = state.normalizer(StatNameNormalizer::standard());
    let stats = state.merged_stats();
    let mut next = values.clone();

    match command {
        ResourceCommand::ResetAll => {
            for resource in &state.resources {
                if resource.reset_mode == ResetMode::None {
                    continue;
                }
                let track = resource.initial_track(&stats, &normalizer)?;
                next.insert(resource.id.clone(), track.current);
            }
        }
        ResourceCommand::Update {
            resource_id,
            change,
        } => {
            let resource = state
                .resource(resource_id)
                .ok_or_else(|| TbError::ResourceNotFound(format!("resource '{resource_id}'")))?;
            let mut track = current_track(resource, values, state, &stats, &normalizer)?;
            resource.apply_change(&mut track, change, &stats, &normalizer)?;
            next.insert(resource.id.clone(), track.current);
        }
    }

    Ok(next)
}

fn current_track(
    resource: &Resource,
    values: &ResourceValues,
    state: &CharacterState,
    stats: &StatMap,
    normalizer: &StatNameNormalizer,
) -> TbResult<Track> {
    let current = values
        .get(&resource.id)
        .or_else(|| state.resource_values.get(&resource.id))
        .copied();
    match current {
        Some(current) => Ok(Track::new(current, resource.bounds(stats, normalizer)?)),
        None => resource.initial_track(stats, normalizer),
    }
}

/// What a chat line did.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    /// A roll was made.
    Rolled {
        /// The formula that was rolled.
        formula: String,
        /// Text following the formula.
        description: String,
        /// The result.
        outcome: RollOutcome,
    },
    /// A resource command changed the overlay.
    Resources {
        /// Description of the command.
        summary: String,
        /// Resource id → new value, for the resources that changed.
        changed: ResourceValues,
    },
    /// Plain chat text.
    Text(String),
}

/// A play session for one character: rolls against its stats and tracks
/// resource values without touching its log.
#[derive(Debug, Clone)]
pub struct ChatSession {
    state: CharacterState,
    values: ResourceValues,
    normalizer: StatNameNormalizer,
    history: Vec<ResourceCommand>,
}

impl ChatSession {
    /// Start a session from a computed state.
    pub fn new(state: CharacterState) -> Self {
        let normalizer = state.normalizer(StatNameNormalizer::standard());
        Self {
            values: state.resource_values.clone(),
            state,
            normalizer,
            history: Vec::new(),
        }
    }

    /// The character.
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// Current resource values.
    pub fn values(&self) -> &ResourceValues {
        &self.values
    }

    /// Current value of a resource, looked up by id or name.
    pub fn value(&self, key: &str) -> Option<f64> {
        let resource = self.state.resource(key)?;
        self.values.get(&resource.id).copied()
    }

    /// Resource commands applied so far.
    pub fn history(&self) -> &[ResourceCommand] {
        &self.history
    }

    /// Apply a resource command.
    pub fn apply(&mut self, command: ResourceCommand) -> TbResult<ResourceValues> {
        let next = apply_command(&self.values, &command, &self.state)?;
        let changed: ResourceValues = next
            .iter()
            .filter(|(id, value)| self.values.get(*id) != Some(*value))
            .map(|(id, value)| (id.clone(), *value))
            .collect();
        debug!(command = %command.describe(), changed = changed.len(), "resource command");
        self.values = next;
        self.history.push(command);
        Ok(changed)
    }

    /// Handle one chat line, rolling with `rng`.
    pub fn process<R: Rng>(&mut self, input: &str, rng: &mut R) -> TbResult<ChatResponse> {
        match classify(input) {
            ChatInput::Resource(command) => {
                let summary = command.describe();
                let changed = self.apply(command)?;
                Ok(ChatResponse::Resources { summary, changed })
            }
            ChatInput::Roll(parsed) => {
                let outcome = DiceRoller::new().with_normalizer(&self.normalizer).roll(
                    &parsed.formula,
                    &self.state.roll_context(),
                    rng,
                )?;
                Ok(ChatResponse::Rolled {
                    formula: parsed.formula,
                    description: parsed.description,
                    outcome,
                })
            }
            ChatInput::Text(text) => Ok(ChatResponse::Text(text)),
        }
    }

    /// Restore every resource the way `:reset` does.
    pub fn rest(&mut self) -> TbResult<ResourceValues> {
        self.apply(ResourceCommand::ResetAll)
    }

    /// Undo every resource command.
    pub fn clear(&mut self) {
        self.values = self.state.resource_values.clone();
        self.history.clear();
    }

    /// Change `resource_id` by `change`.
    pub fn update(
        &mut self,
        resource_id: impl Into<String>,
        change: ResourceChange,
    ) -> TbResult<ResourceValues> {
        self.apply(ResourceCommand::Update {
            resource_id: resource_id.into(),
            change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tb_core::ErrorCode;
    use tb_sheet::{CharacterEvent, EventKind, calculate_state};

    fn state_with(resources: Vec<Resource>) -> CharacterState {
        let events: Vec<CharacterEvent> = resources
            .into_iter()
            .map(|resource| CharacterEvent::new(EventKind::ResourceDefined { resource }))
            .collect();
        let base = StatNameNormalizer::standard().stat_map([("Grade", 1.0), ("Body", 3.0)]);
        calculate_state(&events, &base)
    }

    fn hit_points() -> Resource {
        Resource::new("HP", "Hit Points").with_max("10").with_min("0").with_initial("10")
    }

    fn set(id: &str, value: f64) -> ResourceCommand {
        ResourceCommand::Update {
            resource_id: id.into(),
            change: ResourceChange::Set {
                value: value.into(),
            },
        }
    }

    #[test]
    fn update_resource_value() {
        let state = state_with(vec![hit_points()]);
        let values = apply_command(&ResourceValues::new(), &set("hp", 5.0), &state).unwrap();
        assert_eq!(values["HP"], 5.0);
    }

    #[test]
    fn update_by_name() {
        let state = state_with(vec![hit_points()]);
        let values = apply_command(&ResourceValues::new(), &set("Hit Points", 4.0), &state).unwrap();
        assert_eq!(values["HP"], 4.0);
    }

    #[test]
    fn reset_resource_value() {
        let state = state_with(vec![hit_points()]);
        let values = ResourceValues::from([("HP".to_string(), 5.0)]);
        let command = ResourceCommand::Update {
            resource_id: "hp".into(),
            change: ResourceChange::Reset,
        };
        let values = apply_command(&values, &command, &state).unwrap();
        assert_eq!(values["HP"], 10.0);
    }

    #[test]
    fn reset_all_resources() {
        let gold = Resource::new("Gold", "Gold")
            .with_max("999")
            .with_min("0")
            .with_reset_mode(ResetMode::None);
        let mana = Resource::new("MP", "Magic Points").with_max("5").with_min("0").with_initial("5");
        let state = state_with(vec![hit_points(), mana, gold]);
        let values = ResourceValues::from([
            ("HP".to_string(), 2.0),
            ("MP".to_string(), 1.0),
            ("Gold".to_string(), 100.0),
        ]);
        let values = apply_command(&values, &ResourceCommand::ResetAll, &state).unwrap();
        assert_eq!(values["HP"], 10.0);
        assert_eq!(values["MP"], 5.0);
        assert_eq!(values["Gold"], 100.0);
    }

    #[test]
    fn implicit_hp_resets_to_derived_max() {
        let state = state_with(Vec::new());
        let values = ResourceValues::from([("HP".to_string(), 3.0)]);
        let values = apply_command(&values, &ResourceCommand::ResetAll, &state).unwrap();
        assert_eq!(values["HP"], 20.0);
    }

    #[test]
    fn modify_clamps() {
        let state = state_with(vec![hit_points()]);
        let command = ResourceCommand::Update {
            resource_id: "hp".into(),
            change: ResourceChange::Modify {
                delta: "-25".into(),
            },
        };
        let values = apply_command(&ResourceValues::new(), &command, &state).unwrap();
        assert_eq!(values["HP"], 0.0);
    }

    #[test]
    fn lowercase_definition_replaces_implicit_hp() {
        let vitality = Resource::new("hp", "Vitality").with_max("7").with_min("0").with_initial("7");
        let state = state_with(vec![vitality]);
        let command = ResourceCommand::Update {
            resource_id: "HP".into(),
            change: ResourceChange::Modify { delta: "-1".into() },
        };
        let values = apply_command(&ResourceValues::new(), &command, &state).unwrap();
        assert_eq!(values.get("hp"), Some(&6.0));
        assert!(!values.contains_key("HP"));
    }

    #[test]
    fn unknown_resource_is_not_found() {
        let state = state_with(Vec::new());
        let err = apply_command(&ResourceValues::new(), &set("ki", 1.0), &state).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[test]
    fn session_tracks_changes_and_history() {
        let mut session = ChatSession::new(state_with(vec![hit_points()]));
        assert_eq!(session.value("hp"), Some(10.0));

        let rng = &mut StdRng::seed_from_u64(7);
        match session.process(":hp-4", rng).unwrap() {
            ChatResponse::Resources { summary, changed } => {
                assert_eq!(summary, "Modify resource: hp += -4");
                assert_eq!(changed, ResourceValues::from([("HP".to_string(), 6.0)]));
            }
            other => panic!("expected resource response, got {other:?}"),
        }
        assert_eq!(session.value("Hit Points"), Some(6.0));
        assert_eq!(session.history().len(), 1);

        session.rest().unwrap();
        assert_eq!(session.value("hp"), Some(10.0));

        session.update("hp", ResourceChange::Set { value: "1".into() }).unwrap();
        session.clear();
        assert_eq!(session.value("hp"), Some(10.0));
        assert!(session.history().is_empty());
        assert_eq!(session.values(), &session.state().resource_values);
    }

    #[test]
    fn session_rolls_against_character() {
        let mut session = ChatSession::new(state_with(Vec::new()));
        let rng = &mut StdRng::seed_from_u64(1);
        match session.process("1d1 + {肉体} Body check", rng).unwrap() {
            ChatResponse::Rolled {
                formula,
                description,
                outcome,
            } => {
                assert_eq!(formula, "1d1 + {肉体}");
                assert_eq!(description, "Body check");
                assert_eq!(outcome.total, 4.0);
                assert!(outcome.is_critical);
            }
            other => panic!("expected roll, got {other:?}"),
        }
    }

    #[test]
    fn session_passes_text_through() {
        let mut session = ChatSession::new(state_with(Vec::new()));
        let rng = &mut StdRng::seed_from_u64(1);
        assert_eq!(
            session.process("good game", rng).unwrap(),
            ChatResponse::Text("good game".to_string())
        );
    }

    #[test]
    fn failed_command_leaves_session_untouched() {
        let mut session = ChatSession::new(state_with(Vec::new()));
        let rng = &mut StdRng::seed_from_u64(1);
        assert!(session.process(":ki=3", rng).is_err());
        assert!(session.history().is_empty());
    }
}
