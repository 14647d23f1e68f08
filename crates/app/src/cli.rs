use clap::Parser;
use playsample_backend_sim::SimSettings;
use playsample_controller::ControllerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Play the sample video through the simulated backend and report what the
/// player did
#[derive(Debug, Parser)]
#[command(name = "playsample", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "PLAYSAMPLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Media location to open instead of the configured one
    #[arg(long)]
    pub url: Option<String>,

    /// Render option passed with the surface-ready signal (repeatable)
    #[arg(long = "render-option", value_name = "OPTION", allow_hyphen_values = true)]
    pub render_options: Vec<String>,

    /// Run the volume latency probe
    #[arg(long)]
    pub probe: bool,

    /// Volume the probe keeps writing until it registers
    #[arg(long, value_name = "PERCENT")]
    pub write_volume: Option<i32>,

    /// Do not expose the mute command
    #[arg(long)]
    pub no_mute_command: bool,

    /// Toggle mute this long after initialization
    #[arg(long, value_name = "MS")]
    pub mute_after_ms: Option<u64>,

    /// How long to keep playing before disposing
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    pub run_for_ms: u64,

    /// Simulated audio output startup delay
    #[arg(long, value_name = "MS", default_value_t = 650)]
    pub output_ready_ms: u64,

    /// Let the simulated output report its volume without being poked
    #[arg(long)]
    pub auto_register_volume: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay command line flags on a loaded configuration
    pub fn apply(&self, config: &mut ControllerConfig) {
        if let Some(url) = &self.url {
            config.media_url = url.clone();
        }
        if self.probe {
            config.features.volume_latency_probe = true;
        }
        if self.write_volume.is_some() {
            config.probe.write_volume = self.write_volume;
        }
        if self.no_mute_command {
            config.features.mute_command = false;
        }
    }

    pub fn sim_settings(&self) -> SimSettings {
        SimSettings {
            output_ready_after: Duration::from_millis(self.output_ready_ms),
            auto_register_volume: self.auto_register_volume,
            ..SimSettings::default()
        }
    }
}
