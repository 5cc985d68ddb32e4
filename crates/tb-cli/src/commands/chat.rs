use std::path::Path;

use colored::Colorize;

use tb_chat::{ChatResponse, ChatSession};

pub fn run(
    input: &str,
    seed: Option<u64>,
    events: Option<&Path>,
    base: Option<&Path>,
) -> Result<(), String> {
    let state = super::load_state(events, base, None)?;
    let mut session = ChatSession::new(state);

    let response = session
        .process(input, &mut super::rng(seed))
        .map_err(|e| match tb_chat::classify(input) {
            tb_chat::ChatInput::Roll(parsed) => super::formula_error(&parsed.formula, &e),
            _ => e.to_string(),
        })?;

    match response {
        ChatResponse::Rolled {
            formula,
            description,
            outcome,
        } => super::roll::print_outcome(&formula, &description, &outcome),
        ChatResponse::Resources { summary, changed } => {
            println!("  {}", summary.bold());
            if changed.is_empty() {
                println!("  {}", "(no change)".dimmed());
            }
            for (id, value) in &changed {
                let name = session
                    .state()
                    .resource(id)
                    .map_or(id.as_str(), |r| r.name.as_str());
                println!("  {name}: {value}");
            }
        }
        ChatResponse::Text(text) => println!("  {text}"),
    }

    Ok(())
}
