//! Dice roll results and aggregation.

use serde::Serialize;

use crate::ast::Span;

/// The draws of one `NdM` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceGroup {
    /// Number of dice rolled.
    pub count: u32,
    /// Faces per die.
    pub sides: u32,
    /// Individual die values, each in `1..=sides`.
    pub values: Vec<u32>,
    /// Byte range of the term in the formula.
    pub span: Span,
}

impl DiceGroup {
    /// Sum of all die values. Widened so raised limits cannot overflow.
    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }

    /// The highest single die value, or 0 if empty.
    pub fn highest(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// The lowest single die value, or 0 if empty.
    pub fn lowest(&self) -> u32 {
        self.values.iter().copied().min().unwrap_or(0)
    }

    /// True if every die shows its top face.
    pub fn all_max(&self) -> bool {
        self.values.iter().all(|&v| v == self.sides)
    }

    /// True if every die shows 1.
    pub fn all_ones(&self) -> bool {
        self.values.iter().all(|&v| v == 1)
    }
}

impl std::fmt::Display for DiceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", values.join(", "))
    }
}

/// The result of rolling a formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollOutcome {
    /// Final value of the expression.
    pub total: f64,
    /// The formula with dice replaced by their draws and variables by
    /// their values, e.g. `[3, 4] + 5`.
    pub details: String,
    /// Every die across every group showed its maximum.
    pub is_critical: bool,
    /// Every die across every group showed 1.
    pub is_fumble: bool,
    /// Draws per dice term, in formula order.
    pub groups: Vec<DiceGroup>,
}

impl RollOutcome {
    /// Build an outcome, deriving the critical and fumble flags from `groups`.
    ///
    /// A formula without dice is neither.
    pub fn new(total: f64, details: String, groups: Vec<DiceGroup>) -> Self {
        let rolled = !groups.is_empty();
        let is_critical = rolled && groups.iter().all(DiceGroup::all_max);
        let is_fumble = rolled && groups.iter().all(DiceGroup::all_ones);
        Self {
            total,
            details,
            is_critical,
            is_fumble,
            groups,
        }
    }

    /// Number of dice rolled across all groups.
    pub fn dice_count(&self) -> usize {
        self.groups.iter().map(|g| g.values.len()).sum()
    }
}

impl std::fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.details, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(sides: u32, values: &[u32]) -> DiceGroup {
        DiceGroup {
            count: values.len() as u32,
            sides,
            values: values.to_vec(),
            span: 0..0,
        }
    }

    #[test]
    fn group_total_and_extremes() {
        let g = group(6, &[3, 6, 1]);
        assert_eq!(g.total(), 10);
        assert_eq!(g.highest(), 6);
        assert_eq!(g.lowest(), 1);
    }

    #[test]
    fn group_display() {
        assert_eq!(group(6, &[3, 5]).to_string(), "[3, 5]");
        assert_eq!(group(100, &[42]).to_string(), "[42]");
    }

    #[test]
    fn critical_needs_every_group_at_its_own_max() {
        let outcome = RollOutcome::new(26.0, String::new(), vec![group(20, &[20]), group(6, &[6])]);
        assert!(outcome.is_critical);
        assert!(!outcome.is_fumble);

        let outcome = RollOutcome::new(26.0, String::new(), vec![group(20, &[20]), group(6, &[5])]);
        assert!(!outcome.is_critical);
    }

    #[test]
    fn fumble_needs_every_die_at_one() {
        let outcome = RollOutcome::new(2.0, String::new(), vec![group(6, &[1, 1])]);
        assert!(outcome.is_fumble);
        assert!(!outcome.is_critical);

        let outcome = RollOutcome::new(3.0, String::new(), vec![group(6, &[1, 2])]);
        assert!(!outcome.is_fumble);
    }

    #[test]
    fn no_dice_is_neither() {
        let outcome = RollOutcome::new(5.0, "5".into(), vec![]);
        assert!(!outcome.is_critical);
        assert!(!outcome.is_fumble);
        assert_eq!(outcome.dice_count(), 0);
    }

    #[test]
    fn single_sided_die_is_both() {
        let outcome = RollOutcome::new(1.0, "[1]".into(), vec![group(1, &[1])]);
        assert!(outcome.is_critical);
        assert!(outcome.is_fumble);
    }

    #[test]
    fn wire_format() {
        let outcome = RollOutcome::new(7.0, "[3, 4]".into(), vec![group(6, &[3, 4])]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["total"], 7.0);
        assert_eq!(value["details"], "[3, 4]");
        assert_eq!(value["is_critical"], false);
        assert_eq!(value["groups"][0]["values"], serde_json::json!([3, 4]));
        assert_eq!(value["groups"][0]["sides"], 6);
    }

    #[test]
    fn display() {
        let outcome = RollOutcome::new(12.0, "[3, 4] + 5".into(), vec![group(6, &[3, 4])]);
        insta::assert_snapshot!(outcome, @"[3, 4] + 5 = 12");
    }
}
