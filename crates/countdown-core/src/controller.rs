//! Countdown controller.
//!
//! `start()` is the single entry point a host calls once its display is
//! ready. Each call spawns one tokio task that owns a fresh [`Countdown`]
//! together with its periodic interval. The interval is dropped when the
//! terminal tick has rendered, which is the only place the periodic handle
//! is released.
//!
//! Calling `start()` twice yields two independent tickers with their own
//! counters, both rendering into the same surface.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::countdown::{Countdown, CountdownState, DEFAULT_INITIAL_SECS};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::storage::Config;
use crate::surface::{OutputTarget, SurfaceRegistry, DEFAULT_TARGET_ID};

/// Parameters for each ticker started by a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownSettings {
    pub initial_secs: u64,
    pub tick_interval: Duration,
    pub target_id: String,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            initial_secs: DEFAULT_INITIAL_SECS,
            tick_interval: Duration::from_secs(1),
            target_id: DEFAULT_TARGET_ID.to_string(),
        }
    }
}

impl From<&Config> for CountdownSettings {
    fn from(config: &Config) -> Self {
        Self {
            initial_secs: config.countdown.initial_secs,
            tick_interval: Duration::from_millis(config.countdown.tick_interval_ms),
            target_id: config.countdown.target_id.clone(),
        }
    }
}

/// Counters reported when a ticker reaches its terminal tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub ticks: u64,
    pub renders: u64,
    /// Ticks with no target to render into.
    pub skipped_renders: u64,
    /// Ticks whose target rejected the write.
    pub failed_renders: u64,
}

#[derive(Debug, Clone)]
pub struct CountdownController {
    settings: CountdownSettings,
    surfaces: SurfaceRegistry,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl CountdownController {
    /// # Errors
    ///
    /// Returns a validation error for a zero tick interval.
    pub fn new(settings: CountdownSettings, surfaces: SurfaceRegistry) -> Result<Self> {
        if settings.tick_interval.is_zero() {
            return Err(ValidationError::InvalidValue {
                field: "tick_interval".into(),
                message: "must be greater than zero".into(),
            }
            .into());
        }
        Ok(Self {
            settings,
            surfaces,
            events: None,
        })
    }

    /// Forward every countdown event to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn settings(&self) -> &CountdownSettings {
        &self.settings
    }

    /// Begin a countdown from the configured initial value.
    ///
    /// The output target is resolved here, once. A surface registered
    /// after this call is not seen by the returned ticker.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) -> Ticker {
        let countdown = Countdown::new(self.settings.initial_secs);
        let target = self.surfaces.get(&self.settings.target_id);

        info!(
            initial_secs = countdown.initial_secs(),
            target_id = %self.settings.target_id,
            target_present = target.is_some(),
            "countdown started"
        );
        emit(
            &self.events,
            Event::CountdownStarted {
                initial_secs: countdown.initial_secs(),
                target_id: self.settings.target_id.clone(),
                target_present: target.is_some(),
                at: Utc::now(),
            },
        );

        let (status_tx, status_rx) =
            watch::channel((countdown.remaining_secs(), countdown.state()));
        let handle = tokio::spawn(drive(
            countdown,
            self.settings.tick_interval,
            target,
            self.events.clone(),
            status_tx,
        ));

        Ticker {
            handle,
            status: status_rx,
        }
    }
}

/// A running countdown started by [`CountdownController::start`].
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<Summary>,
    status: watch::Receiver<(u64, CountdownState)>,
}

impl Ticker {
    pub fn remaining_secs(&self) -> u64 {
        self.status.borrow().0
    }

    pub fn state(&self) -> CountdownState {
        self.status.borrow().1
    }

    /// True once the terminal tick has rendered and the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the terminal tick.
    pub async fn wait(self) -> Result<Summary> {
        Ok(self.handle.await?)
    }
}

async fn drive(
    mut countdown: Countdown,
    period: Duration,
    target: Option<Arc<dyn OutputTarget>>,
    events: Option<mpsc::UnboundedSender<Event>>,
    status: watch::Sender<(u64, CountdownState)>,
) -> Summary {
    // First tick one period after start, not immediately.
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = Summary::default();

    loop {
        interval.tick().await;
        let Some(tick) = countdown.tick() else {
            break;
        };
        summary.ticks += 1;

        match &target {
            Some(target) => match target.set_text(&tick.display) {
                Ok(()) => summary.renders += 1,
                Err(e) => {
                    warn!(error = %e, display = %tick.display, "render failed");
                    summary.failed_renders += 1;
                }
            },
            None => summary.skipped_renders += 1,
        }

        debug!(remaining_secs = tick.remaining_secs, display = %tick.display, "tick");
        emit(
            &events,
            Event::CountdownTicked {
                remaining_secs: tick.remaining_secs,
                display: tick.display,
                at: Utc::now(),
            },
        );
        status.send_replace((countdown.remaining_secs(), countdown.state()));

        if tick.terminal {
            break;
        }
    }

    drop(interval);

    info!(
        ticks = summary.ticks,
        renders = summary.renders,
        skipped = summary.skipped_renders,
        "countdown finished"
    );
    emit(
        &events,
        Event::CountdownFinished {
            ticks: summary.ticks,
            at: Utc::now(),
        },
    );
    summary
}

fn emit(events: &Option<mpsc::UnboundedSender<Event>>, event: Event) {
    if let Some(tx) = events {
        // Receiver gone means nobody is listening; the countdown goes on.
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::surface::MemoryTarget;

    struct BrokenTarget;

    impl OutputTarget for BrokenTarget {
        fn set_text(&self, _text: &str) -> Result<()> {
            Err(CoreError::Custom("surface detached".into()))
        }
    }

    fn with_memory_target() -> (SurfaceRegistry, Arc<MemoryTarget>) {
        let target = Arc::new(MemoryTarget::new());
        let mut surfaces = SurfaceRegistry::new();
        surfaces.register(DEFAULT_TARGET_ID, target.clone());
        (surfaces, target)
    }

    #[test]
    fn rejects_zero_interval() {
        let settings = CountdownSettings {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        let err = CountdownController::new(settings, SurfaceRegistry::new()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn settings_follow_config() {
        let mut config = Config::default();
        config.countdown.initial_secs = 30;
        config.countdown.tick_interval_ms = 250;
        config.countdown.target_id = "clock".into();
        let settings = CountdownSettings::from(&config);
        assert_eq!(settings.initial_secs, 30);
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
        assert_eq!(settings.target_id, "clock");
    }

    #[tokio::test(start_paused = true)]
    async fn renders_full_sequence_then_stops() {
        let (surfaces, target) = with_memory_target();
        let controller = CountdownController::new(CountdownSettings::default(), surfaces).unwrap();

        let ticker = controller.start();
        let summary = ticker.wait().await.unwrap();

        let renders = target.renders();
        assert_eq!(renders.len(), 901);
        assert_eq!(renders[0], "15:00");
        assert_eq!(renders[1], "14:59");
        assert_eq!(renders[60], "14:00");
        assert_eq!(renders[899], "00:01");
        assert_eq!(renders[900], "00:00");
        assert_eq!(
            summary,
            Summary {
                ticks: 901,
                renders: 901,
                skipped_renders: 0,
                failed_renders: 0,
            }
        );

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(target.renders().len(), 901);
    }

    #[tokio::test(start_paused = true)]
    async fn first_render_waits_one_period() {
        let (surfaces, target) = with_memory_target();
        let controller = CountdownController::new(CountdownSettings::default(), surfaces).unwrap();
        let ticker = controller.start();

        time::sleep(Duration::from_millis(500)).await;
        assert!(target.renders().is_empty());
        assert_eq!(ticker.remaining_secs(), 900);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(target.renders(), vec!["15:00"]);
        assert_eq!(ticker.remaining_secs(), 899);

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(target.renders().len(), 60);
        assert_eq!(target.text().as_deref(), Some("14:01"));
        assert_eq!(ticker.remaining_secs(), 840);
        assert_eq!(ticker.state(), CountdownState::Running);
        assert!(!ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn absent_target_still_reaches_terminal_state() {
        let controller =
            CountdownController::new(CountdownSettings::default(), SurfaceRegistry::new()).unwrap();
        let ticker = controller.start();

        time::sleep(Duration::from_millis(900_500)).await;
        assert_eq!(ticker.remaining_secs(), 0);
        assert_eq!(ticker.state(), CountdownState::Running);

        let summary = ticker.wait().await.unwrap();
        assert_eq!(summary.ticks, 901);
        assert_eq!(summary.renders, 0);
        assert_eq!(summary.skipped_renders, 901);
    }

    #[tokio::test(start_paused = true)]
    async fn broken_target_does_not_halt_countdown() {
        let mut surfaces = SurfaceRegistry::new();
        surfaces.register(DEFAULT_TARGET_ID, Arc::new(BrokenTarget));
        let settings = CountdownSettings {
            initial_secs: 5,
            ..Default::default()
        };
        let controller = CountdownController::new(settings, surfaces).unwrap();

        let summary = controller.start().wait().await.unwrap();
        assert_eq!(summary.ticks, 6);
        assert_eq!(summary.failed_renders, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_runs_an_independent_ticker() {
        let (surfaces, target) = with_memory_target();
        let settings = CountdownSettings {
            initial_secs: 3,
            ..Default::default()
        };
        let controller = CountdownController::new(settings, surfaces).unwrap();

        let first = controller.start();
        time::sleep(Duration::from_millis(1500)).await;
        let second = controller.start();

        assert_eq!(first.remaining_secs(), 2);
        assert_eq!(second.remaining_secs(), 3);

        let a = first.wait().await.unwrap();
        let b = second.wait().await.unwrap();
        assert_eq!(a.ticks, 4);
        assert_eq!(b.ticks, 4);
        assert_eq!(target.renders().len(), 8);
        assert_eq!(
            target.renders().iter().filter(|r| *r == "00:03").count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_registration_is_not_observed() {
        let settings = CountdownSettings {
            initial_secs: 2,
            ..Default::default()
        };
        let mut surfaces = SurfaceRegistry::new();
        let controller = CountdownController::new(settings, surfaces.clone()).unwrap();
        let ticker = controller.start();

        let target = Arc::new(MemoryTarget::new());
        surfaces.register(DEFAULT_TARGET_ID, target.clone());

        let summary = ticker.wait().await.unwrap();
        assert_eq!(summary.skipped_renders, 3);
        assert!(target.renders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn emits_lifecycle_events() {
        let (surfaces, _target) = with_memory_target();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let settings = CountdownSettings {
            initial_secs: 2,
            tick_interval: Duration::from_millis(100),
            ..Default::default()
        };
        let controller = CountdownController::new(settings, surfaces)
            .unwrap()
            .with_events(tx);

        controller.start().wait().await.unwrap();
        drop(controller);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            Event::CountdownStarted { initial_secs: 2, target_present: true, .. }
        ));
        let displays: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::CountdownTicked { display, .. } => Some(display.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(displays, vec!["00:02", "00:01", "00:00"]);
        assert!(matches!(events[4], Event::CountdownFinished { ticks: 3, .. }));
    }
}
