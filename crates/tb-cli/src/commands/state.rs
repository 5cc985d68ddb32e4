use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use tb_core::{StatMap, StatNameNormalizer};
use tb_sheet::CharacterState;

pub fn run(
    events: &Path,
    base: Option<&Path>,
    rules: Option<&Path>,
    json: bool,
) -> Result<(), String> {
    let state = super::load_state(Some(events), base, rules)?;

    if json {
        let out = serde_json::to_string_pretty(&state).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    let normalizer = state.normalizer(StatNameNormalizer::standard());

    section("Stats");
    print_stats(&state, &state.stats, &normalizer);

    if !state.derived_stats.is_empty() {
        section("Derived");
        print_stats(&state, &state.derived_stats, &normalizer);
    }

    if !state.resources.is_empty() {
        section("Resources");
        let stats = state.merged_stats();
        let mut table = new_table(vec!["Id", "Name", "Value"]);
        for resource in &state.resources {
            let current = state.resource_values.get(&resource.id).copied().unwrap_or(0.0);
            let value = match resource.bounds(&stats, &normalizer) {
                Ok(bounds) => tb_sheet::Track::new(current, bounds).to_string(),
                Err(_) => current.to_string(),
            };
            table.add_row(vec![resource.id.as_str(), resource.name.as_str(), value.as_str()]);
        }
        println!("{table}");
    }

    if !state.inventory.is_empty() {
        section("Inventory");
        let mut table = new_table(vec!["Item", "Slot"]);
        for item in &state.inventory {
            let slot = state
                .equipment_slots
                .iter()
                .find(|(_, id)| **id == item.id)
                .map_or("—", |(slot, _)| slot.as_str());
            table.add_row(vec![item.to_string(), slot.to_string()]);
        }
        println!("{table}");
    }

    if !state.skills.is_empty() {
        section("Skills");
        for skill in &state.skills {
            println!("  {} [{:?}]", skill.name, skill.category);
        }
    }

    if !state.skill_wishlist.is_empty() {
        section("Wishlist");
        for skill in &state.skill_wishlist {
            println!("  {}", skill.name);
        }
    }

    if !state.tags.is_empty() {
        section("Tags");
        let tags: Vec<&str> = state.tags.iter().map(String::as_str).collect();
        println!("  {}", tags.join(", "));
    }

    section("Experience");
    println!(
        "  total {}, used {}, free {}",
        state.exp.total,
        state.exp.used,
        state.exp.free.to_string().bold()
    );

    Ok(())
}

fn section(title: &str) {
    println!();
    println!("  {}", title.bold().underline());
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Main stats first, in promotion order, then the rest by key.
fn print_stats(state: &CharacterState, stats: &StatMap, normalizer: &StatNameNormalizer) {
    if stats.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    let main = state.main_stats.iter().filter(|key| stats.contains_key(*key));
    let rest = stats.keys().filter(|key| !state.main_stats.contains(key));

    let mut table = new_table(vec!["Stat", "Key", "Value"]);
    for key in main.chain(rest) {
        let label = state.label(key, normalizer);
        let marker = if state.main_stats.contains(key) { "*" } else { "" };
        table.add_row(vec![
            format!("{label}{marker}"),
            key.to_string(),
            stats[key].to_string(),
        ]);
    }
    println!("{table}");
}
