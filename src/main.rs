mod fonts;
mod logging;
mod participant;
mod signals;
mod window;

use anyhow::{Context, Result};
use flanker_experiment::{
    Display, FinalizeGuard, Input, ResultsLog, ScreenProbe, Session, SessionConfig, Visual,
    check_frame_rate, measure_frame_rate,
};
use signals::Interrupt;
use tracing::{error, info, warn};
use window::WindowFrontend;

const CONFIG_PATH: &str = "config.json";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let participant_id = participant::participant_id(args.by_ref(), std::io::stdin().lock())?;
    let config_path = args.next().unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = SessionConfig::load(&config_path)
        .with_context(|| format!("loading {config_path}"))?;

    logging::init(&config.results_dir, &participant_id)?;
    info!(participant = %participant_id, config = %config_path, "flanker task starting");

    run(&config, &participant_id).inspect_err(|e| error!("fatal: {e:#}"))
}

fn run(config: &SessionConfig, participant_id: &str) -> Result<()> {
    let interrupt = Interrupt::new();
    signals::install(interrupt.clone()).context("installing signal handler")?;

    let (font_path, font) = fonts::load_first(&fonts::candidates(&config.font_path))?;
    if font_path != config.font_path {
        warn!(
            configured = %config.font_path.display(),
            using = %font_path.display(),
            "configured font unavailable"
        );
    }

    let mut frontend = WindowFrontend::new(config, font, interrupt)?;
    let resolution = frontend.resolution()?;
    info!(%resolution, reported_hz = frontend.refresh_rate(), "screen ready");

    let measured = measure_frame_rate(&mut frontend)?;
    if let Err(e) = check_frame_rate(measured, config.frame_rate) {
        show_fatal(
            &mut frontend,
            config,
            &format!("Wrong number of frames detected: {measured}.\nThe experiment cannot run on this display."),
        );
        return Err(e.into());
    }
    info!(fps = measured, "frame rate confirmed");

    let mut results = FinalizeGuard::new(ResultsLog::new(participant_id, &config.results_dir));
    let outcome = Session::new(config, participant_id, &mut frontend, rand::rng()).run(&mut results);
    drop(results);

    let stats = frontend.frame_stats();
    info!(
        fps = stats.effective_fps,
        jitter_ms = stats.jitter_ns / 1e6,
        max_frame_ms = stats.max_frame_time_ns / 1e6,
        "frame timing"
    );

    match outcome {
        Ok(()) => {
            info!("session complete");
            Ok(())
        }
        Err(e) if e.is_user_abort() => {
            warn!("session aborted by operator");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn show_fatal(frontend: &mut WindowFrontend, config: &SessionConfig, text: &str) {
    let mut keys: Vec<&str> = config.continue_keys.iter().map(String::as_str).collect();
    keys.push(&config.abort_key);
    frontend.draw(&Visual::Message(text.to_string()));
    let shown = frontend.flip().and_then(|_| frontend.wait_keys(&keys));
    if let Err(e) = shown {
        warn!("could not show error screen: {e}");
    }
}
