use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

/// A canonical stat identifier such as `Body` or a user-defined `カルマ`.
///
/// The only way to build one is [`StatNameNormalizer::normalize`], which
/// keeps localized display names out of stat maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StatKey(String);

impl StatKey {
    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StatKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical stat key → numeric value.
pub type StatMap = BTreeMap<StatKey, f64>;

/// Canonical key and Japanese display label of every standard stat.
pub const STANDARD_STAT_LABELS: &[(&str, &str)] = &[
    ("Grade", "グレード"),
    ("Science", "科学技術力"),
    ("MagicKnowledge", "魔術熟知"),
    ("Combat", "戦闘能力"),
    ("Magic", "魔力"),
    ("Spirit", "精神"),
    ("Body", "肉体"),
    ("HP", "最大HP"),
    ("MP", "最大MP"),
    ("Defense", "防護"),
    ("MagicDefense", "魔術防御"),
    ("ActionSpeed", "行動速度"),
    ("InsightCheck", "看破判定"),
    ("RecoveryAmount", "回復量"),
    ("KnowledgeCheck", "知識判定"),
    ("GatheringCount", "採集回数"),
    ("SpellCheck", "魔術行使"),
];

static STANDARD: LazyLock<StatNameNormalizer> = LazyLock::new(|| {
    STANDARD_STAT_LABELS
        .iter()
        .fold(StatNameNormalizer::new(), |n, (key, label)| {
            n.with_alias(*label, *key)
        })
});

/// Bidirectional mapping between localized stat names and canonical keys.
///
/// Unknown names pass through unchanged, so the mapping is total: a custom
/// stat such as `カルマ` simply becomes the key `カルマ`.
#[derive(Debug, Clone, Default)]
pub struct StatNameNormalizer {
    to_key: HashMap<String, String>,
    to_label: HashMap<String, String>,
}

impl StatNameNormalizer {
    /// An empty normalizer: every name maps to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared normalizer with the standard Japanese label table.
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Register `label` as an alias of the canonical `key`.
    pub fn with_alias(mut self, label: impl Into<String>, key: impl Into<String>) -> Self {
        let label = label.into();
        let key = key.into();
        self.to_label.insert(key.clone(), label.clone());
        self.to_key.insert(label, key);
        self
    }

    /// Map a display name or key to its canonical [`StatKey`].
    pub fn normalize(&self, name: &str) -> StatKey {
        let name = name.trim();
        match self.to_key.get(name) {
            Some(key) => StatKey(key.clone()),
            None => StatKey(name.to_string()),
        }
    }

    /// The localized label registered for `key`, if any.
    pub fn label(&self, key: &StatKey) -> Option<&str> {
        self.to_label.get(key.as_str()).map(String::as_str)
    }

    /// Label if one exists, otherwise the key itself.
    pub fn display_name<'a>(&'a self, key: &'a StatKey) -> &'a str {
        self.label(key).unwrap_or(key.as_str())
    }

    /// Build a [`StatMap`] from raw (possibly localized) names.
    ///
    /// Entries whose names normalize to the same key are summed.
    pub fn stat_map<K, I>(&self, entries: I) -> StatMap
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut map = StatMap::new();
        for (name, value) in entries {
            *map.entry(self.normalize(name.as_ref())).or_insert(0.0) += value;
        }
        map
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.to_key.len()
    }

    /// True if no aliases are registered.
    pub fn is_empty(&self) -> bool {
        self.to_key.is_empty()
    }
}
