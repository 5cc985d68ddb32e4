pub mod chat;
pub mod eval;
pub mod roll;
pub mod state;

use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use tb_core::{StatMap, StatNameNormalizer, TbError};
use tb_sheet::{CharacterState, EventLog, RuleSet, StateReducer};

/// Read a file, naming it in the error.
fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load base stats from a JSON object of name → number. Localized names
/// are normalized.
fn load_base(path: Option<&Path>) -> Result<StatMap, String> {
    let Some(path) = path else {
        return Ok(StatMap::new());
    };
    let raw: BTreeMap<String, f64> = serde_json::from_str(&read(path)?)
        .map_err(|e| format!("invalid base stats in {}: {e}", path.display()))?;
    Ok(StatNameNormalizer::standard().stat_map(raw))
}

fn load_events(path: Option<&Path>) -> Result<EventLog, String> {
    match path {
        Some(path) => EventLog::from_json(&read(path)?).map_err(|e| e.to_string()),
        None => Ok(EventLog::new()),
    }
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet, String> {
    match path {
        Some(path) => RuleSet::from_json(&read(path)?).map_err(|e| e.to_string()),
        None => Ok(RuleSet::standard()),
    }
}

/// Replay the given files into a character state.
fn load_state(
    events: Option<&Path>,
    base: Option<&Path>,
    rules: Option<&Path>,
) -> Result<CharacterState, String> {
    let log = load_events(events)?;
    let base = load_base(base)?;
    debug!(events = log.len(), base_stats = base.len(), "loaded character");
    let reducer = StateReducer::new(load_rules(rules)?);
    Ok(reducer.reduce(log.events(), &base))
}

/// Seeded RNG if a seed is given, otherwise seeded from the thread RNG.
fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Print an ariadne diagnostic for a formula error to stderr and return the
/// message for the exit path.
fn formula_error(source: &str, error: &TbError) -> String {
    eprint!("{}", tb_formula::render_error(source, "formula", error));
    error.to_string()
}
