//! Resources (HP, MP, ammunition, ki, ...) and their clamped tracks.
//!
//! A [`Resource`] is a definition whose bounds and initial value are
//! formulas. At read time those formulas are evaluated into a [`Track`],
//! which holds the current number and enforces the bounds.

use serde::{Deserialize, Serialize};

use tb_core::{StatMap, StatNameNormalizer, TbResult};

use crate::formula::Formula;

/// What a full reset restores a resource to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Reset to the evaluated initial value.
    #[default]
    Initial,
    /// Left untouched by a full reset.
    None,
}

/// A resource definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identifier, used by chat commands.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Upper bound. Unbounded if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Formula>,
    /// Lower bound. Unbounded if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Formula>,
    /// Starting value.
    #[serde(default)]
    pub initial: Formula,
    /// Behaviour on a full reset.
    #[serde(default)]
    pub reset_mode: ResetMode,
}

/// Numeric bounds of a resource after evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

impl Bounds {
    /// Clamp `value` into the bounds. The minimum wins if they cross.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.max.map_or(value, |max| value.min(max));
        self.min.map_or(value, |min| value.max(min))
    }
}

impl Resource {
    /// An unbounded resource starting at 0.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max: None,
            min: None,
            initial: Formula::default(),
            reset_mode: ResetMode::default(),
        }
    }

    /// Set the upper bound formula.
    pub fn with_max(mut self, max: impl Into<Formula>) -> Self {
        self.max = Some(max.into());
        self
    }

    /// Set the lower bound formula.
    pub fn with_min(mut self, min: impl Into<Formula>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Set the initial value formula.
    pub fn with_initial(mut self, initial: impl Into<Formula>) -> Self {
        self.initial = initial.into();
        self
    }

    /// Set the reset behaviour.
    pub fn with_reset_mode(mut self, reset_mode: ResetMode) -> Self {
        self.reset_mode = reset_mode;
        self
    }

    /// True if `key` names this resource: id ignoring case, or exact name.
    pub fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key) || self.name == key
    }

    /// Evaluate the bounds against `stats`.
    pub fn bounds(&self, stats: &StatMap, normalizer: &StatNameNormalizer) -> TbResult<Bounds> {
        let eval = |f: &Option<Formula>| {
            f.as_ref()
                .map(|f| f.evaluate(stats, normalizer))
                .transpose()
        };
        Ok(Bounds {
            min: eval(&self.min)?,
            max: eval(&self.max)?,
        })
    }

    /// A track at the evaluated initial value, clamped to the bounds.
    pub fn initial_track(&self, stats: &StatMap, normalizer: &StatNameNormalizer) -> TbResult<Track> {
        let bounds = self.bounds(stats, normalizer)?;
        let initial = self.initial.evaluate(stats, normalizer)?;
        Ok(Track::new(initial, bounds))
    }

    /// Apply `change` to `track`, evaluating formulas against `stats`.
    /// Returns the new value.
    pub fn apply_change(
        &self,
        track: &mut Track,
        change: &ResourceChange,
        stats: &StatMap,
        normalizer: &StatNameNormalizer,
    ) -> TbResult<f64> {
        match change {
            ResourceChange::Set { value } => Ok(track.set(value.evaluate(stats, normalizer)?)),
            ResourceChange::Modify { delta } => Ok(track.adjust(delta.evaluate(stats, normalizer)?)),
            ResourceChange::Reset => Ok(track.set(self.initial.evaluate(stats, normalizer)?)),
        }
    }
}

/// A change to a resource's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResourceChange {
    /// Set to an absolute value.
    Set {
        /// New value.
        value: Formula,
    },
    /// Add a (possibly negative) amount.
    Modify {
        /// Amount to add.
        delta: Formula,
    },
    /// Restore the initial value.
    Reset,
}

/// A current value held between optional bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Current value.
    pub current: f64,
    /// Bounds the value is kept inside.
    pub bounds: Bounds,
}

impl Track {
    /// A track at `current`, clamped.
    pub fn new(current: f64, bounds: Bounds) -> Self {
        Self {
            current: bounds.clamp(current),
            bounds,
        }
    }

    /// Adjust by a delta, clamping. Returns the new value.
    pub fn adjust(&mut self, delta: f64) -> f64 {
        self.set(self.current + delta)
    }

    /// Set to a value, clamping. Returns the new value.
    pub fn set(&mut self, value: f64) -> f64 {
        self.current = self.bounds.clamp(value);
        self.current
    }

    /// True if the track sits at its lower bound.
    pub fn is_empty(&self) -> bool {
        self.bounds.min.is_some_and(|min| self.current <= min)
    }

    /// True if the track sits at its upper bound.
    pub fn is_full(&self) -> bool {
        self.bounds.max.is_some_and(|max| self.current >= max)
    }

    /// Fraction of the range that is filled, when both bounds exist.
    pub fn fraction(&self) -> Option<f64> {
        let (min, max) = (self.bounds.min?, self.bounds.max?);
        let range = max - min;
        if range <= 0.0 {
            return Some(1.0);
        }
        Some((self.current - min) / range)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bounds.max {
            Some(max) => write!(f, "{}/{}", self.current, max),
            None => write!(f, "{}", self.current),
        }
    }
}
