//! Character events and the append-only log that holds them.
//!
//! Every change to a character is recorded as a [`CharacterEvent`]. Events
//! are never edited; a mistaken one is cancelled by appending an
//! [`EventKind::EventRevoked`] that names it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tb_core::{TbError, TbResult};

use crate::formula::Formula;
use crate::item::Item;
use crate::resource::{Resource, ResourceChange};
use crate::skill::{AcquisitionMethod, Skill};

/// Where an item came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSource {
    /// Bought.
    Shop,
    /// Crafted.
    Craft,
    /// Looted.
    Drop,
    /// Story reward.
    #[default]
    Event,
    /// Starting equipment.
    Initial,
}

/// What experience was spent on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpCategory {
    /// Raising grade.
    Grade,
    /// Raising an ability.
    Ability,
    /// Learning a skill.
    Skill,
    /// Anything else.
    #[default]
    Other,
}

/// One mutation of a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A stat grew by some amount.
    StatGrown {
        /// Stat name or key.
        key: String,
        /// Amount added.
        delta: f64,
        /// Experience paid.
        #[serde(default)]
        cost: i64,
    },
    /// A skill was learned.
    SkillLearned {
        /// The skill snapshot.
        skill: Skill,
        /// How it was acquired.
        #[serde(default)]
        acquisition_method: AcquisitionMethod,
        /// Experience paid.
        #[serde(default)]
        cost: i64,
    },
    /// An item entered the inventory.
    ItemAdded {
        /// The item snapshot.
        item: Item,
        /// Where it came from.
        #[serde(default)]
        source: ItemSource,
    },
    /// An item was put into a slot.
    ItemEquipped {
        /// Inventory item id.
        item_id: String,
        /// Target slot; falls back to the item's own slot.
        #[serde(default)]
        slot: Option<String>,
    },
    /// An item was taken out of a slot (or all slots).
    ItemUnequipped {
        /// Inventory item id.
        item_id: String,
        /// Slot to clear; every slot holding the item if absent.
        #[serde(default)]
        slot: Option<String>,
    },
    /// An item left the inventory.
    ItemRemoved {
        /// Inventory item id.
        item_id: String,
    },
    /// An item was replaced by a new snapshot.
    ItemUpdated {
        /// Inventory item id.
        item_id: String,
        /// The new snapshot.
        item: Item,
    },
    /// An item switched mode.
    ItemVariantSelected {
        /// Inventory item id.
        item_id: String,
        /// Variant name.
        variant: String,
    },
    /// A learned skill evolved or was rewritten.
    SkillRevised {
        /// Learned skill id.
        skill_id: String,
        /// The new snapshot.
        skill: Skill,
        /// Why.
        #[serde(default)]
        reason: Option<String>,
    },
    /// A learned skill was dropped.
    SkillForgotten {
        /// Learned skill id.
        skill_id: String,
    },
    /// A skill was added to the wishlist.
    WishlistSkillAdded {
        /// The skill snapshot.
        skill: Skill,
    },
    /// A skill was removed from the wishlist.
    WishlistSkillRemoved {
        /// Wishlist skill id.
        skill_id: String,
    },
    /// Experience was earned.
    ExperienceGained {
        /// Amount earned.
        amount: i64,
        /// Why.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Experience was spent outside a growth or skill event.
    ExperienceSpent {
        /// Amount spent.
        amount: i64,
        /// What it was spent on.
        #[serde(default)]
        category: ExpCategory,
    },
    /// Grade went from `before` to `after`.
    GradeRaised {
        /// Previous grade.
        before: i64,
        /// New grade.
        after: i64,
    },
    /// An ability went from `before` to `after`.
    AbilityRaised {
        /// Ability name or key.
        key: String,
        /// Previous value.
        before: i64,
        /// New value.
        after: i64,
    },
    /// A base stat was set outright.
    StatUpdated {
        /// Stat name or key.
        key: String,
        /// New value, evaluated against the stats at that point.
        value: Formula,
        /// Promote the stat to the main display list.
        #[serde(default)]
        is_main: bool,
    },
    /// A display label was registered for a stat key.
    StatLabelRegistered {
        /// Canonical key.
        key: String,
        /// Display label; becomes an alias in formulas.
        label: String,
        /// Promote the stat to the main display list.
        #[serde(default)]
        is_main: bool,
    },
    /// A tag was attached.
    TagAdded {
        /// Tag text.
        tag: String,
    },
    /// A tag was detached.
    TagRemoved {
        /// Tag text.
        tag: String,
    },
    /// A resource was defined (or redefined).
    ResourceDefined {
        /// The definition.
        resource: Resource,
    },
    /// A resource's current value changed.
    ResourceUpdated {
        /// Resource id.
        resource_id: String,
        /// The change.
        change: ResourceChange,
    },
    /// Every resource with reset mode `initial` went back to its initial value.
    ResourcesReset,
    /// An earlier event is void.
    EventRevoked {
        /// Id of the cancelled event.
        target_event_id: Uuid,
        /// Why.
        #[serde(default)]
        reason: Option<String>,
    },
}

impl EventKind {
    /// The wire name of this variant, e.g. `ITEM_EQUIPPED`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatGrown { .. } => "STAT_GROWN",
            Self::SkillLearned { .. } => "SKILL_LEARNED",
            Self::ItemAdded { .. } => "ITEM_ADDED",
            Self::ItemEquipped { .. } => "ITEM_EQUIPPED",
            Self::ItemUnequipped { .. } => "ITEM_UNEQUIPPED",
            Self::ItemRemoved { .. } => "ITEM_REMOVED",
            Self::ItemUpdated { .. } => "ITEM_UPDATED",
            Self::ItemVariantSelected { .. } => "ITEM_VARIANT_SELECTED",
            Self::SkillRevised { .. } => "SKILL_REVISED",
            Self::SkillForgotten { .. } => "SKILL_FORGOTTEN",
            Self::WishlistSkillAdded { .. } => "WISHLIST_SKILL_ADDED",
            Self::WishlistSkillRemoved { .. } => "WISHLIST_SKILL_REMOVED",
            Self::ExperienceGained { .. } => "EXPERIENCE_GAINED",
            Self::ExperienceSpent { .. } => "EXPERIENCE_SPENT",
            Self::GradeRaised { .. } => "GRADE_RAISED",
            Self::AbilityRaised { .. } => "ABILITY_RAISED",
            Self::StatUpdated { .. } => "STAT_UPDATED",
            Self::StatLabelRegistered { .. } => "STAT_LABEL_REGISTERED",
            Self::TagAdded { .. } => "TAG_ADDED",
            Self::TagRemoved { .. } => "TAG_REMOVED",
            Self::ResourceDefined { .. } => "RESOURCE_DEFINED",
            Self::ResourceUpdated { .. } => "RESOURCE_UPDATED",
            Self::ResourcesReset => "RESOURCES_RESET",
            Self::EventRevoked { .. } => "EVENT_REVOKED",
        }
    }
}

/// An event with its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEvent {
    /// Unique id, referenced by [`EventKind::EventRevoked`].
    pub id: Uuid,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CharacterEvent {
    /// A new event with a fresh id, stamped now.
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            description: None,
            kind,
        }
    }

    /// Attach a note.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// An event revoking this one.
    pub fn revoke(&self, reason: impl Into<String>) -> Self {
        Self::new(EventKind::EventRevoked {
            target_event_id: self.id,
            reason: Some(reason.into()),
        })
    }
}

/// An append-only, ordered list of character events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<CharacterEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn append(&mut self, event: CharacterEvent) {
        self.events.push(event);
    }

    /// Wrap `kind` in a fresh envelope and append it. Returns the new id.
    pub fn record(&mut self, kind: EventKind) -> Uuid {
        let event = CharacterEvent::new(kind);
        let id = event.id;
        self.events.push(event);
        id
    }

    /// Get all events.
    pub fn events(&self) -> &[CharacterEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Parse a JSON array of events.
    pub fn from_json(json: &str) -> TbResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TbError::Validation(format!("invalid event log: {e}")))
    }

    /// Serialize as a pretty JSON array.
    pub fn to_json(&self) -> TbResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TbError::Validation(format!("cannot serialize event log: {e}")))
    }
}

impl From<Vec<CharacterEvent>> for EventLog {
    fn from(events: Vec<CharacterEvent>) -> Self {
        Self { events }
    }
}
