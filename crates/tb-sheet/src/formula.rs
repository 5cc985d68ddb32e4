use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use tb_core::{StatMap, StatNameNormalizer, TbResult};

/// Formula text stored on a sheet, such as `"{Body} * 2"` or `"10"`.
///
/// Formulas are kept as text and evaluated when the state is computed, so a
/// resource max of `"{HP}"` follows the character as HP changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Formula(String);

impl Formula {
    /// Wrap formula text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The formula text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Evaluate against `stats`.
    pub fn evaluate(&self, stats: &StatMap, normalizer: &StatNameNormalizer) -> TbResult<f64> {
        tb_formula::evaluate_with(&self.0, stats, normalizer)
    }
}

impl Default for Formula {
    fn default() -> Self {
        Self::new("0")
    }
}

impl From<&str> for Formula {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Formula {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<f64> for Formula {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts either a JSON string or a JSON number.
impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(n) => Self::from(n),
        })
    }
}
