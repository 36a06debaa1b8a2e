//! Receiver configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use framecast_core::{FileFormat, FrameError};

/// Top-level configuration for the receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Where completed frames go.
    pub output: OutputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to listen on.
    pub bind_address: String,
    /// UDP port to listen on.
    pub port: u16,
    /// Largest part count accepted for one frame.
    pub max_parts: usize,
}

/// What the sink does with each completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Log sequence number and size only.
    Log,
    /// Write frame bytes to `path` as received.
    Raw,
    /// Decode the test-pattern encoding and write a PPM to `path`.
    Ppm,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    /// Output file, overwritten with every new frame.
    pub path: PathBuf,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
    /// Seconds between stats lines; 0 disables them.
    pub stats_interval_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 43600,
            max_parts: framecast_core::DEFAULT_MAX_PARTS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Log,
            path: PathBuf::from("frame.ppm"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            stats_interval_secs: 5,
        }
    }
}

// ── Load / Save ──────────────────────────────────────────────────

impl ReceiverConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Listening socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, FrameError> {
        let ip: IpAddr = self.network.bind_address.parse().map_err(|_| {
            FrameError::Other(format!("invalid bind address: {}", self.network.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.network.port))
    }

    /// File format for the file-writing modes, `None` for `log`.
    pub fn file_format(&self) -> Option<FileFormat> {
        match self.output.mode {
            OutputMode::Log => None,
            OutputMode::Raw => Some(FileFormat::Raw),
            OutputMode::Ppm => Some(FileFormat::Ppm),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
