//! Chat-line handling for play sessions.
//!
//! A line typed into the session chat is one of three things:
//!
//! - a resource command such as `:hp-3` or `:rest`
//! - a roll such as `2d6 + {肉体} Attack`, split into formula and description
//! - plain text
//!
//! [`classify`] decides which; [`ChatSession`] acts on it.

/// `:`-prefixed resource commands.
pub mod command;
/// Formula/description splitting of roll lines.
pub mod roll_input;
/// The session resource overlay.
pub mod session;

pub use command::{ResourceCommand, parse_resource_command};
pub use roll_input::{ParsedRollInput, parse_roll_input};
pub use session::{ChatResponse, ChatSession, apply_command};

use serde::Serialize;

/// A classified chat line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChatInput {
    /// A resource command.
    Resource(ResourceCommand),
    /// A roll.
    Roll(ParsedRollInput),
    /// Anything else, trimmed.
    Text(String),
}

/// Classify a chat line: resource command first, then roll, then text.
pub fn classify(input: &str) -> ChatInput {
    if let Some(command) = parse_resource_command(input) {
        return ChatInput::Resource(command);
    }
    match parse_roll_input(input) {
        Some(parsed) => ChatInput::Roll(parsed),
        None => ChatInput::Text(input.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_commands_win() {
        assert_eq!(classify(":rest"), ChatInput::Resource(ResourceCommand::ResetAll));
    }

    #[test]
    fn rolls() {
        match classify("2d6 Attack") {
            ChatInput::Roll(parsed) => {
                assert_eq!(parsed.formula, "2d6");
                assert_eq!(parsed.description, "Attack");
            }
            other => panic!("expected roll, got {other:?}"),
        }
    }

    #[test]
    fn malformed_command_is_text() {
        assert_eq!(classify(" :hp=lots "), ChatInput::Text(":hp=lots".to_string()));
        assert_eq!(classify("Hello world"), ChatInput::Text("Hello world".to_string()));
    }
}
