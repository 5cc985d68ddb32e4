//! Formula language for Tabula.
//!
//! Formulas are small arithmetic expressions over stats:
//!
//! ```text
//! ({Grade} + {肉体}) * 5
//! 2d6 + {Combat}
//! 1d100 <= {SpellCheck}
//! floor({Spirit} / 2)
//! ```
//!
//! [`evaluate`] computes dice-free formulas deterministically. [`roll`]
//! draws dice as well and reports the individual draws. [`validate`] checks
//! that a formula would roll without drawing anything.
//!
//! `{name}` variables go through a [`tb_core::StatNameNormalizer`], so a
//! localized label and its canonical key resolve to the same stat.

/// Formula expression tree.
pub mod ast;
/// Dice rolling and roll outcomes.
pub mod dice;
/// ariadne rendering of formula errors.
pub mod diagnostics;
/// Dice-free evaluation.
pub mod eval;
/// Tokenizer.
pub mod lexer;
/// Token stream to expression tree.
pub mod parser;

pub use diagnostics::render_error;
pub use dice::{
    DiceGroup, DiceLimits, DiceRoller, RollContext, RollOutcome, roll, roll_with, validate,
};
pub use eval::{CompiledFormula, compile, evaluate, evaluate_with};
