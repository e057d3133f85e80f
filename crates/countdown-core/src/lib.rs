//! # Countdown Core Library
//!
//! This library provides the core logic for a single fixed-length countdown
//! rendered as `MM:SS`. The CLI binary is a thin host over the same core.
//!
//! ## Architecture
//!
//! - **Countdown**: A tick-driven state machine. It has no clock of its own;
//!   the caller invokes `tick()` once per period.
//! - **Controller**: Spawns one tokio task per `start()` that drives a
//!   `Countdown` from a periodic interval and renders into a named surface.
//! - **Surfaces**: Named output targets the host registers (the terminal,
//!   in-memory buffers for tests).
//! - **Storage**: TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`Countdown`]: Core countdown state machine
//! - [`CountdownController`]: Starts tickers against a [`SurfaceRegistry`]
//! - [`Config`]: Application configuration management

pub mod countdown;
pub mod controller;
pub mod surface;
pub mod storage;
pub mod events;
pub mod error;

pub use countdown::{format_mm_ss, parse_mm_ss, Countdown, CountdownState, Tick, DEFAULT_INITIAL_SECS};
pub use controller::{CountdownController, CountdownSettings, Summary, Ticker};
pub use surface::{MemoryTarget, OutputTarget, SurfaceRegistry, TerminalTarget, DEFAULT_TARGET_ID};
pub use storage::Config;
pub use events::Event;
pub use error::{ConfigError, CoreError, ValidationError};
