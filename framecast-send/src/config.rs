//! Configuration for the sender.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use framecast_core::{FrameError, MAX_PAYLOAD_PER_PACKET, SenderOptions};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Frame capture settings.
    pub capture: CaptureConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver host name or IP.
    pub destination: String,
    /// Receiver UDP port.
    pub port: u16,
    /// Per-packet payload limit; lower it to stay under a link MTU.
    pub max_payload: usize,
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in moving test pattern.
    Pattern,
    /// Re-read an encoded image file every tick.
    File,
}

/// Frame capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: SourceKind,
    /// Image file for the `file` source.
    pub path: PathBuf,
    /// Output width of the `pattern` source.
    pub width: u32,
    /// Output height of the `pattern` source.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// zstd level for the `pattern` source.
    pub compression_level: i32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            destination: "127.0.0.1".into(),
            port: 43600,
            max_payload: MAX_PAYLOAD_PER_PACKET,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Pattern,
            path: PathBuf::from("frame.jpg"),
            width: 320,
            height: 180,
            fps: 20,
            compression_level: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Resolve `destination:port` to a socket address.
    pub fn destination_addr(&self) -> Result<SocketAddr, FrameError> {
        let target = (self.network.destination.as_str(), self.network.port);
        target.to_socket_addrs()?.next().ok_or_else(|| {
            FrameError::Other(format!(
                "destination {}:{} did not resolve",
                self.network.destination, self.network.port
            ))
        })
    }

    /// Convert loop settings into `SenderOptions`.
    pub fn to_sender_options(&self) -> SenderOptions {
        SenderOptions {
            target_fps: self.capture.fps.clamp(1, 120),
            max_payload: self.network.max_payload.clamp(1, MAX_PAYLOAD_PER_PACKET),
            ..SenderOptions::default()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
