// Terminal result of a run, handed back to main which picks the exit code

use serde_json::Value;

use super::command::Command;

/// How a successful run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `initialize-key` finished pairing; the fresh key has been persisted
    KeyInitialized,
    /// A query command answered; the payload belongs on stdout
    Query { command: Command, payload: Value },
    /// An action command was acknowledged by the TV
    Acknowledged { command: Command },
}

impl Outcome {
    /// Indented JSON for query results, `None` for everything else.
    pub fn stdout_text(&self) -> Option<String> {
        match self {
            Outcome::Query { payload, .. } => Some(
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
            ),
            _ => None,
        }
    }
}
