// Host for the playback sample: stands in for the UI surface and its controls

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use playsample_backend_sim::SimBackend;
use playsample_controller::{ControllerConfig, PlaybackSampleController, ProbeOutcome, SurfaceReady};
use playsample_core::{MediaBackend, RecordingSink};
use serde::Serialize;
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

static INIT_LOGGER: Once = Once::new();

fn init_logging(verbose: bool) {
    INIT_LOGGER.call_once(|| {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        // RUST_LOG wins over the flag
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
    });
}

#[derive(Debug, Serialize)]
struct ProbeSummary {
    outcome: &'static str,
    elapsed_ms: u64,
    volume: Option<i32>,
}

impl From<&ProbeOutcome> for ProbeSummary {
    fn from(outcome: &ProbeOutcome) -> Self {
        let (name, volume) = match outcome {
            ProbeOutcome::Registered { volume, .. } => ("registered", Some(*volume)),
            ProbeOutcome::TimedOut { .. } => ("timed-out", None),
            ProbeOutcome::Cancelled { .. } => ("cancelled", None),
        };
        Self {
            outcome: name,
            elapsed_ms: outcome.elapsed().as_millis() as u64,
            volume,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary {
    backend: String,
    backend_calls: usize,
    media_url: String,
    render_options: Vec<String>,
    mute_toggled: bool,
    final_volume: Option<i32>,
    muted: Option<bool>,
    probe: Option<ProbeSummary>,
    state: String,
    diagnostics: Vec<String>,
}

impl RunSummary {
    fn print_text(&self) {
        println!("backend:        {} ({} calls)", self.backend, self.backend_calls);
        println!("media:          {}", self.media_url);
        println!("render options: {}", self.render_options.join(" "));
        println!("mute toggled:   {}", self.mute_toggled);
        if let Some(volume) = self.final_volume {
            println!("final volume:   {}", volume);
        }
        if let Some(muted) = self.muted {
            println!("muted:          {}", muted);
        }
        if let Some(probe) = &self.probe {
            println!(
                "volume probe:   {} after {} ms",
                probe.outcome, probe.elapsed_ms
            );
        }
        println!("state:          {}", self.state);
        println!("diagnostics:");
        for line in &self.diagnostics {
            println!("  {}", line);
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let backend = Arc::new(SimBackend::new(cli.sim_settings()));
    let controller = PlaybackSampleController::new(backend.clone(), config);
    let sink = Arc::new(RecordingSink::new());
    controller.add_diagnostic_sink(sink.clone());
    controller.subscribe_property_changed(Arc::new(|name: &'static str| {
        log::debug!("Property changed: {}", name);
    }));

    let surface = SurfaceReady::new(cli.render_options.iter().cloned());
    controller
        .initialized_command()
        .execute(surface)
        .context("initializing playback")?;
    let started = Instant::now();

    let mut mute_toggled = false;
    if let Some(delay) = cli.mute_after_ms {
        thread::sleep(Duration::from_millis(delay));
        match controller.mute_command() {
            Some(command) => {
                mute_toggled = command.execute(()).context("toggling mute")?;
            }
            None => log::warn!("Mute command disabled, not toggling"),
        }
    }

    thread::sleep(Duration::from_millis(cli.run_for_ms).saturating_sub(started.elapsed()));

    let (final_volume, muted) = match controller.media_player() {
        Some(player) => (Some(player.volume()), Some(player.is_muted())),
        None => (None, None),
    };
    controller.dispose();

    let summary = RunSummary {
        backend: backend.name().to_string(),
        backend_calls: backend.journal().calls().len(),
        media_url: controller.config().media_url.clone(),
        render_options: cli.render_options.clone(),
        mute_toggled,
        final_volume,
        muted,
        probe: controller.probe_outcome().as_ref().map(ProbeSummary::from),
        state: controller.state().to_string(),
        diagnostics: sink.entries().iter().map(ToString::to_string).collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print_text();
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
