//! Dice rolling over formulas.
//!
//! A roll formula is an ordinary formula that may also contain `NdM` terms.
//! Each term draws N values uniformly from `1..=M`; the draws are kept per
//! term so callers can display them and detect criticals and fumbles.

pub mod roll;

pub use roll::{DiceGroup, RollOutcome};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tb_core::{StatMap, StatNameNormalizer, TbError, TbResult};

use crate::ast::{Expr, Span, Spanned};
use crate::eval::{CompiledFormula, DiceSource, Scope, check_call, compile, eval_expr};
use crate::lexer::Token;

/// Upper bounds on a single dice term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceLimits {
    /// Maximum dice in one `NdM` term.
    pub max_count: u32,
    /// Maximum faces per die.
    pub max_sides: u32,
}

impl Default for DiceLimits {
    fn default() -> Self {
        Self {
            max_count: 1000,
            max_sides: 10_000,
        }
    }
}

impl DiceLimits {
    /// Set the maximum dice per term.
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Set the maximum faces per die.
    pub fn with_max_sides(mut self, max_sides: u32) -> Self {
        self.max_sides = max_sides;
        self
    }

    /// Check one `NdM` term.
    pub fn check(&self, count: u32, sides: u32, span: &Span) -> TbResult<()> {
        if count < 1 {
            return Err(TbError::calculation_at(
                format!("dice count must be at least 1 in {count}d{sides}"),
                span.clone(),
            ));
        }
        if sides < 1 {
            return Err(TbError::calculation_at(
                format!("dice sides must be at least 1 in {count}d{sides}"),
                span.clone(),
            ));
        }
        if count > self.max_count {
            return Err(TbError::Validation(format!(
                "too many dice in {count}d{sides} (limit {})",
                self.max_count
            )));
        }
        if sides > self.max_sides {
            return Err(TbError::Validation(format!(
                "too many sides in {count}d{sides} (limit {})",
                self.max_sides
            )));
        }
        Ok(())
    }
}

/// Stats visible to a roll. Derived stats shadow base stats of the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollContext {
    /// Base stats.
    pub stats: StatMap,
    /// Derived stats, taking precedence over `stats`.
    pub derived_stats: StatMap,
}

impl RollContext {
    /// Context from both maps.
    pub fn new(stats: StatMap, derived_stats: StatMap) -> Self {
        Self {
            stats,
            derived_stats,
        }
    }

    /// Context with base stats only.
    pub fn from_stats(stats: StatMap) -> Self {
        Self {
            stats,
            derived_stats: StatMap::new(),
        }
    }

    /// A single map with derived values overriding base ones.
    pub fn merged(&self) -> StatMap {
        let mut merged = self.stats.clone();
        merged.extend(self.derived_stats.clone());
        merged
    }
}

/// Rolls formulas under a set of [`DiceLimits`].
#[derive(Debug, Clone)]
pub struct DiceRoller<'n> {
    limits: DiceLimits,
    normalizer: &'n StatNameNormalizer,
}

impl Default for DiceRoller<'static> {
    fn default() -> Self {
        Self {
            limits: DiceLimits::default(),
            normalizer: StatNameNormalizer::standard(),
        }
    }
}

impl DiceRoller<'static> {
    /// A roller with default limits and the standard normalizer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'n> DiceRoller<'n> {
    /// Replace the dice limits.
    pub fn with_limits(mut self, limits: DiceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Resolve variables through a different normalizer.
    pub fn with_normalizer<'m>(self, normalizer: &'m StatNameNormalizer) -> DiceRoller<'m> {
        DiceRoller {
            limits: self.limits,
            normalizer,
        }
    }

    /// The configured limits.
    pub fn limits(&self) -> DiceLimits {
        self.limits
    }

    /// Check syntax, dice terms, and function calls without rolling.
    pub fn validate(&self, formula: &str) -> TbResult<CompiledFormula> {
        let compiled = compile(formula)?;
        self.check(&compiled.expr)?;
        Ok(compiled)
    }

    /// Roll `formula` against `context` using `rng`.
    pub fn roll<R: Rng>(
        &self,
        formula: &str,
        context: &RollContext,
        rng: &mut R,
    ) -> TbResult<RollOutcome> {
        let compiled = self.validate(formula)?;
        let stats = context.merged();
        let scope = Scope {
            stats: &stats,
            normalizer: self.normalizer,
        };

        let mut source = RngDice {
            rng,
            groups: Vec::new(),
        };
        let total = eval_expr(&compiled.expr, &scope, &mut source)?;
        let groups = source.groups;

        let details = render_details(&compiled, &groups, &scope);
        let outcome = RollOutcome::new(total, details, groups);
        debug!(
            formula,
            total = outcome.total,
            critical = outcome.is_critical,
            fumble = outcome.is_fumble,
            "rolled"
        );
        Ok(outcome)
    }

    fn check(&self, expr: &Spanned<Expr>) -> TbResult<()> {
        let mut result = Ok(());
        expr.walk(&mut |node| {
            if result.is_err() {
                return;
            }
            result = match &node.node {
                Expr::Dice { count, sides } => self.limits.check(*count, *sides, &node.span),
                Expr::Call(name, args) => check_call(name, args.len(), &node.span),
                _ => Ok(()),
            };
        });
        result
    }
}

/// Draws dice from an RNG and records every group.
struct RngDice<'r, R: Rng> {
    rng: &'r mut R,
    groups: Vec<DiceGroup>,
}

impl<R: Rng> DiceSource for RngDice<'_, R> {
    fn roll(&mut self, count: u32, sides: u32, span: &Span) -> TbResult<f64> {
        let values: Vec<u32> = (0..count)
            .map(|_| self.rng.random_range(1..=sides))
            .collect();
        let group = DiceGroup {
            count,
            sides,
            values,
            span: span.clone(),
        };
        let total = group.total();
        self.groups.push(group);
        Ok(total as f64)
    }
}

/// Rewrite the source with dice terms replaced by their draws and
/// variables by their values. Groups are consumed in source order.
fn render_details(compiled: &CompiledFormula, groups: &[DiceGroup], scope: &Scope<'_>) -> String {
    let source = compiled.source.as_str();
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut groups = groups.iter();

    for (token, span) in &compiled.tokens {
        let replacement = match token {
            Token::Dice(..) => groups.next().map(ToString::to_string),
            Token::Var(name) => Some(scope.lookup(name).to_string()),
            _ => None,
        };
        if let Some(text) = replacement {
            out.push_str(&source[cursor..span.start]);
            out.push_str(&text);
            cursor = span.end;
        }
    }
    out.push_str(&source[cursor..]);
    out.trim().to_string()
}

/// Roll `formula` with the thread-local RNG and default limits.
pub fn roll(formula: &str, context: &RollContext) -> TbResult<RollOutcome> {
    DiceRoller::default().roll(formula, context, &mut rand::rng())
}

/// Roll `formula` with an injected RNG and default limits.
pub fn roll_with<R: Rng>(
    formula: &str,
    context: &RollContext,
    rng: &mut R,
) -> TbResult<RollOutcome> {
    DiceRoller::default().roll(formula, context, rng)
}

/// Check that `formula` would roll, without rolling it.
pub fn validate(formula: &str) -> TbResult<()> {
    DiceRoller::default().validate(formula).map(|_| ())
}
