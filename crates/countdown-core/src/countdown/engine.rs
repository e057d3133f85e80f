//! Countdown state machine.
//!
//! The countdown does not own a clock. The caller is responsible for calling
//! `tick()` once per period; the controller does that from a tokio interval.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> Stopped
//! ```
//!
//! Each tick renders the pre-decrement value, so a 900-second countdown
//! shows `15:00, 14:59, ..., 00:01, 00:00`. The tick that observes zero
//! still renders `00:00` once and then stops for good.
//!
//! ## Usage
//!
//! ```
//! use countdown_core::Countdown;
//!
//! let mut countdown = Countdown::default();
//! let tick = countdown.tick().unwrap();
//! assert_eq!(tick.display, "15:00");
//! assert_eq!(countdown.remaining_secs(), 899);
//! ```

use serde::{Deserialize, Serialize};

use super::format::format_mm_ss;

/// Fifteen minutes.
pub const DEFAULT_INITIAL_SECS: u64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Running,
    /// Terminal. No transitions out.
    Stopped,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Remaining seconds observed by this tick, before any decrement.
    pub remaining_secs: u64,
    /// `MM:SS` rendering of `remaining_secs`.
    pub display: String,
    /// True on the tick that moved the countdown to `Stopped`.
    pub terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    initial_secs: u64,
    remaining_secs: u64,
    state: CountdownState,
    ticks: u64,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_SECS)
    }
}

impl Countdown {
    /// Create a countdown in the `Running` state.
    pub fn new(initial_secs: u64) -> Self {
        Self {
            initial_secs,
            remaining_secs: initial_secs,
            state: CountdownState::Running,
            ticks: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == CountdownState::Stopped
    }

    pub fn initial_secs(&self) -> u64 {
        self.initial_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Number of ticks that changed state (renders), including the terminal one.
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks
    }

    /// What the next tick would render.
    pub fn display(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance by one period.
    ///
    /// Returns `None` once stopped: no render, no decrement.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.state == CountdownState::Stopped {
            return None;
        }

        self.ticks += 1;
        let observed = self.remaining_secs;
        let display = format_mm_ss(observed);

        let terminal = observed == 0;
        if terminal {
            self.state = CountdownState::Stopped;
        } else {
            self.remaining_secs = observed - 1;
        }

        Some(Tick {
            remaining_secs: observed,
            display,
            terminal,
        })
    }
}
