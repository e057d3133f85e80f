use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use countdown_core::{
    parse_mm_ss, Config, CountdownController, CountdownSettings, Event, SurfaceRegistry,
    TerminalTarget, DEFAULT_TARGET_ID,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Countdown length as seconds or MM:SS (default from config)
    #[arg(long, value_parser = parse_duration)]
    duration: Option<u64>,
    /// Tick period in milliseconds (default from config)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Surface id the countdown renders into (default from config)
    #[arg(long)]
    target: Option<String>,
    /// Register no display surface; the countdown runs without rendering
    #[arg(long)]
    headless: bool,
    /// Print each countdown event as a JSON line instead of the display
    #[arg(long)]
    json: bool,
}

fn parse_duration(s: &str) -> Result<u64, String> {
    parse_mm_ss(s).map_err(|e| e.to_string())
}

fn settings_for(args: &RunArgs, config: &Config) -> CountdownSettings {
    let mut settings = CountdownSettings::from(config);
    if let Some(secs) = args.duration {
        settings.initial_secs = secs;
    }
    if let Some(ms) = args.interval_ms {
        settings.tick_interval = Duration::from_millis(ms);
    }
    if let Some(target) = &args.target {
        settings.target_id = target.clone();
    }
    settings
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<Event>) -> Result<(), serde_json::Error> {
    while let Some(event) = rx.recv().await {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = settings_for(&args, &config);

    // The terminal is the host document's "timer" element.
    let mut surfaces = SurfaceRegistry::new();
    let renders_to_terminal = !args.headless && !args.json;
    if renders_to_terminal {
        surfaces.register(
            DEFAULT_TARGET_ID,
            Arc::new(TerminalTarget::new(config.output.overwrite_line)),
        );
    }
    let end_with_newline = renders_to_terminal
        && config.output.overwrite_line
        && surfaces.contains(&settings.target_id);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut controller = CountdownController::new(settings, surfaces)?;
    if args.json {
        controller = controller.with_events(tx);
    } else {
        drop(tx);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let ticker = controller.start();
        drop(controller);

        let finished = async {
            let (summary, printed) = tokio::join!(ticker.wait(), print_events(rx));
            printed?;
            Ok::<_, Box<dyn std::error::Error>>(summary?)
        };

        tokio::select! {
            result = finished => {
                let summary = result?;
                if end_with_newline {
                    println!();
                }
                info!(
                    ticks = summary.ticks,
                    renders = summary.renders,
                    skipped = summary.skipped_renders,
                    failed = summary.failed_renders,
                    "done"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                if end_with_newline {
                    println!();
                }
                warn!("interrupted");
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
