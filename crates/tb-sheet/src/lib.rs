//! Event-sourced character sheets.
//!
//! A character is an append-only [`EventLog`] plus a map of base stats. The
//! current sheet is never stored: [`calculate_state`] (or a configured
//! [`StateReducer`]) replays the log and returns a fresh [`CharacterState`]
//! every time.
//!
//! ```
//! use tb_core::StatNameNormalizer;
//! use tb_sheet::{CharacterEvent, EventKind, calculate_state};
//!
//! let base = StatNameNormalizer::standard().stat_map([("Grade", 1.0), ("肉体", 3.0)]);
//! let events = [CharacterEvent::new(EventKind::StatGrown {
//!     key: "Body".into(),
//!     delta: 1.0,
//!     cost: 15,
//! })];
//! let state = calculate_state(&events, &base);
//! assert_eq!(state.derived_stats.get("HP"), Some(&25.0));
//! ```

/// Item and skill variant effects.
pub mod effect;
/// Events and the event log.
pub mod event;
/// Formula text stored on sheets.
pub mod formula;
/// Inventory items.
pub mod item;
/// Event log replay.
pub mod reducer;
/// Resource definitions and tracks.
pub mod resource;
/// Game-system rules and experience costs.
pub mod rules;
/// Skills.
pub mod skill;
/// Computed character state.
pub mod state;

pub use effect::{DEFAULT_VARIANT, PassiveEffect};
pub use event::{CharacterEvent, EventKind, EventLog, ExpCategory, ItemSource};
pub use formula::Formula;
pub use item::{Item, ItemCategory};
pub use reducer::{StateReducer, calculate_state};
pub use resource::{Bounds, ResetMode, Resource, ResourceChange, Track};
pub use rules::{RuleSet, SkillCost, skill_cost, stat_growth_cost};
pub use skill::{AcquisitionMethod, GrantedStat, Skill, SkillCategory};
pub use state::{CharacterState, Experience, ResourceValues};
