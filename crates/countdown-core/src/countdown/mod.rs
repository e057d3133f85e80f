mod engine;
mod format;

pub use engine::{Countdown, CountdownState, Tick, DEFAULT_INITIAL_SECS};
pub use format::{format_mm_ss, parse_mm_ss};
