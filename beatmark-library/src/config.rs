//! Service configuration for beatmark
//!
//! Read from a simple key=value file; unknown keys are ignored and bad
//! values fall back to their defaults.

use beatmark_analysis::{AnalysisConfig, DEFAULT_HOP_LENGTH};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Sensitivity used when a request does not send one
    pub default_sensitivity: f32,
    /// Onset envelope hop length in samples
    pub hop_length: usize,
    /// Beats per bar assumed by the classifier
    pub beats_per_bar: usize,
    /// Resample uploads to this rate; `None` keeps the native rate
    pub sample_rate: Option<u32>,
    /// Largest accepted request body, in megabytes
    pub max_upload_mb: usize,
    /// Directory for staged uploads; `None` uses the system temp dir
    pub upload_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            default_sensitivity: 1.0,
            hop_length: DEFAULT_HOP_LENGTH,
            beats_per_bar: 4,
            sample_rate: None,
            max_upload_mb: 64,
            upload_dir: None,
        }
    }
}

impl Config {
    /// Load config from the default location, then apply `PORT` from the
    /// environment
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        let mut config = Self::load_from(&path).unwrap_or_default();
        config.apply_port_override(std::env::var("PORT").ok().as_deref());
        config
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beatmark")
            .join("config.txt")
    }

    /// Analysis parameters for one request
    pub fn analysis_config(&self, sensitivity: f32, detect_extra: bool) -> AnalysisConfig {
        AnalysisConfig::default()
            .with_sensitivity(sensitivity)
            .with_hop_length(self.hop_length)
            .with_beats_per_bar(self.beats_per_bar)
            .with_detect_extra(detect_extra)
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    fn apply_port_override(&mut self, port: Option<&str>) {
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {:?}", port),
            }
        }
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "host" if !value.is_empty() => config.host = value.to_string(),
                "port" => set_parsed(&mut config.port, key, value),
                "default_sensitivity" => {
                    let mut sensitivity = config.default_sensitivity;
                    set_parsed(&mut sensitivity, key, value);
                    if sensitivity.is_finite() && sensitivity > 0.0 {
                        config.default_sensitivity = sensitivity;
                    }
                }
                "hop_length" => set_nonzero(&mut config.hop_length, key, value),
                "beats_per_bar" => set_nonzero(&mut config.beats_per_bar, key, value),
                "sample_rate" => {
                    config.sample_rate = value.parse().ok().filter(|&rate: &u32| rate > 0);
                }
                "max_upload_mb" => set_nonzero(&mut config.max_upload_mb, key, value),
                "upload_dir" => {
                    if !value.is_empty() {
                        config.upload_dir = Some(PathBuf::from(value));
                    }
                }
                _ => {} // Ignore unknown keys
            }
        }

        config
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!("Ignoring invalid config value {}={}", key, value),
    }
}

fn set_nonzero(slot: &mut usize, key: &str, value: &str) {
    let mut parsed = *slot;
    set_parsed(&mut parsed, key, value);
    if parsed > 0 {
        *slot = parsed;
    }
}
