// Controller configuration, loaded from TOML

use playsample_core::{Media, Result, SampleError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Remote sample video opened on initialization
pub const DEFAULT_MEDIA_URL: &str =
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

/// What a second surface-ready signal does while already initialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReinitializePolicy {
    /// Refuse with `InvalidState`
    #[default]
    Reject,
    /// Release player and engine, then build new ones
    Rebuild,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Expose the mute toggle command
    pub mute_command: bool,
    /// Measure how long the player's volume takes to become non-zero
    pub volume_latency_probe: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            mute_command: true,
            volume_latency_probe: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enable_debug_logs: bool,
    /// Appended after the host's render options
    pub extra_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub poll_interval_ms: u64,
    /// Backoff ceiling between polls
    pub max_poll_interval_ms: u64,
    pub timeout_ms: u64,
    /// Volume to keep writing until it is observed
    pub write_volume: Option<i32>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            max_poll_interval_ms: 100,
            timeout_ms: 5_000,
            write_volume: None,
        }
    }
}

impl ProbeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub media_url: String,
    pub reinitialize: ReinitializePolicy,
    pub features: FeatureConfig,
    pub engine: EngineConfig,
    pub probe: ProbeConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            media_url: DEFAULT_MEDIA_URL.to_string(),
            reinitialize: ReinitializePolicy::default(),
            features: FeatureConfig::default(),
            engine: EngineConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            SampleError::Config(msg) => {
                SampleError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ControllerConfig =
            toml::from_str(content).map_err(|e| SampleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SampleError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        Media::parse(&self.media_url)
            .map_err(|e| SampleError::Config(format!("media_url: {}", e)))?;

        let probe = &self.probe;
        if probe.poll_interval_ms == 0 {
            return Err(SampleError::Config(
                "probe.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if probe.max_poll_interval_ms < probe.poll_interval_ms {
            return Err(SampleError::Config(format!(
                "probe.max_poll_interval_ms ({}) is below probe.poll_interval_ms ({})",
                probe.max_poll_interval_ms, probe.poll_interval_ms
            )));
        }
        if probe.timeout_ms == 0 {
            return Err(SampleError::Config(
                "probe.timeout_ms must be greater than zero".to_string(),
            ));
        }
        // Zero would never be observed as registered
        if let Some(volume) = probe.write_volume {
            if !(1..=200).contains(&volume) {
                return Err(SampleError::Config(format!(
                    "probe.write_volume must be within 1..=200, got {}",
                    volume
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.media_url, DEFAULT_MEDIA_URL);
        assert_eq!(config.reinitialize, ReinitializePolicy::Reject);
        assert!(config.features.mute_command);
        assert!(!config.features.volume_latency_probe);
        assert!(!config.engine.enable_debug_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            reinitialize = "rebuild"

            [features]
            volume_latency_probe = true

            [probe]
            write_volume = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.reinitialize, ReinitializePolicy::Rebuild);
        assert!(config.features.mute_command);
        assert!(config.features.volume_latency_probe);
        assert_eq!(config.probe.write_volume, Some(100));
        assert_eq!(config.probe.timeout(), Duration::from_secs(5));
        assert_eq!(config.media_url, DEFAULT_MEDIA_URL);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            ControllerConfig::from_toml_str(r#"media_url = "gopher://nowhere""#),
            Err(SampleError::Config(_))
        ));
        assert!(ControllerConfig::from_toml_str("[probe]\npoll_interval_ms = 0").is_err());
        assert!(ControllerConfig::from_toml_str(
            "[probe]\npoll_interval_ms = 50\nmax_poll_interval_ms = 10"
        )
        .is_err());
        assert!(ControllerConfig::from_toml_str("[probe]\nwrite_volume = 0").is_err());
        assert!(ControllerConfig::from_toml_str("reinitialize = \"maybe\"").is_err());
    }

    #[test]
    fn test_toml_output_parses_back() {
        let mut config = ControllerConfig::default();
        config.engine.extra_options = vec!["--no-volume-save".to_string()];

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[engine]"));
        assert_eq!(ControllerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_example_config_parses() {
        let example = include_str!("../../../config/playsample.example.toml");
        let config = ControllerConfig::from_toml_str(example).unwrap();

        assert!(config.features.volume_latency_probe);
        assert_eq!(config.probe.write_volume, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "media_url = \"https://example.com/clip.mp4\"").unwrap();

        let config = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(config.media_url, "https://example.com/clip.mp4");

        let missing = ControllerConfig::load(Path::new("/nonexistent/playsample.toml"));
        assert!(matches!(missing, Err(SampleError::Io(_))));
    }
}
