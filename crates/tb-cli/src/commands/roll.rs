use std::path::Path;

use colored::Colorize;

use tb_core::StatNameNormalizer;
use tb_formula::{DiceRoller, RollOutcome};

pub fn run(
    formula: &str,
    seed: Option<u64>,
    events: Option<&Path>,
    base: Option<&Path>,
) -> Result<(), String> {
    let state = super::load_state(events, base, None)?;
    let normalizer = state.normalizer(StatNameNormalizer::standard());

    let outcome = DiceRoller::new()
        .with_normalizer(&normalizer)
        .roll(formula, &state.roll_context(), &mut super::rng(seed))
        .map_err(|e| super::formula_error(formula, &e))?;

    print_outcome(formula, "", &outcome);
    Ok(())
}

/// Print a roll the way the chat log shows it.
pub fn print_outcome(formula: &str, description: &str, outcome: &RollOutcome) {
    let header = if description.is_empty() {
        formula.bold().to_string()
    } else {
        format!("{} {}", formula.bold(), description.dimmed())
    };
    println!("  {header}");
    println!("  {} = {}", outcome.details, outcome.total.to_string().bold());
    if outcome.is_critical {
        println!("  {}", "CRITICAL".green().bold());
    }
    if outcome.is_fumble {
        println!("  {}", "FUMBLE".red().bold());
    }
}
