use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change of a running countdown produces an Event.
/// The CLI prints them as JSON lines in `--json` mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CountdownStarted {
        initial_secs: u64,
        target_id: String,
        target_present: bool,
        at: DateTime<Utc>,
    },
    CountdownTicked {
        /// Pre-decrement value that was rendered.
        remaining_secs: u64,
        display: String,
        at: DateTime<Utc>,
    },
    CountdownFinished {
        ticks: u64,
        at: DateTime<Utc>,
    },
}
