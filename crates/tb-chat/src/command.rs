use serde::Serialize;

use tb_sheet::{Formula, ResourceChange};

/// A resource command typed into the chat, such as `:hp-3`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ResourceCommand {
    /// Reset every resource whose reset mode is `initial`.
    ResetAll,
    /// Change one resource.
    Update {
        /// Resource id, lowercased.
        resource_id: String,
        /// What to do with it.
        change: ResourceChange,
    },
}

impl ResourceCommand {
    /// A short description for the session log.
    pub fn describe(&self) -> String {
        match self {
            Self::ResetAll => "Reset all resources".to_string(),
            Self::Update {
                resource_id,
                change,
            } => match change {
                ResourceChange::Set { value } => format!("Set resource: {resource_id} = {value}"),
                ResourceChange::Modify { delta } => {
                    format!("Modify resource: {resource_id} += {delta}")
                }
                ResourceChange::Reset => format!("Reset resource: {resource_id}"),
            },
        }
    }
}

/// Parse a `:`-prefixed resource command.
///
/// - `:reset`, `:rest` reset everything
/// - `:hp=reset`, `:hp=init` reset one resource
/// - `:hp=10` sets, `:hp+3` and `:hp-3` adjust
pub fn parse_resource_command(input: &str) -> Option<ResourceCommand> {
    let body = input.trim().strip_prefix(':')?;

    if body.eq_ignore_ascii_case("reset") || body.eq_ignore_ascii_case("rest") {
        return Some(ResourceCommand::ResetAll);
    }

    let op_at = body.find(['=', '+', '-'])?;
    let resource_id = body[..op_at].trim().to_lowercase();
    let op = &body[op_at..op_at + 1];
    let value = body[op_at + 1..].trim().to_lowercase();
    if resource_id.is_empty() || value.is_empty() {
        return None;
    }

    if op == "=" && matches!(value.as_str(), "reset" | "init") {
        return Some(ResourceCommand::Update {
            resource_id,
            change: ResourceChange::Reset,
        });
    }

    let amount = value.parse::<f64>().ok().filter(|n| n.is_finite())?;
    let change = match op {
        "=" => ResourceChange::Set {
            value: Formula::from(amount),
        },
        "+" => ResourceChange::Modify {
            delta: Formula::from(amount),
        },
        _ => ResourceChange::Modify {
            delta: Formula::from(-amount),
        },
    };
    Some(ResourceCommand::Update {
        resource_id,
        change,
    })
}
