use std::path::Path;

use tb_core::StatNameNormalizer;

pub fn run(formula: &str, events: Option<&Path>, base: Option<&Path>) -> Result<(), String> {
    let state = super::load_state(events, base, None)?;
    let normalizer = state.normalizer(StatNameNormalizer::standard());

    let value = tb_formula::evaluate_with(formula, &state.merged_stats(), &normalizer)
        .map_err(|e| super::formula_error(formula, &e))?;

    println!("{value}");
    Ok(())
}
