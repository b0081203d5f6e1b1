/*!
Configuration management for the CAN telemetry gateway.

Only the bus interface, the telemetry destination and the cadence are
configurable; the channel table is compiled in.
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use telemetry::protocol::{DEFAULT_CADENCE_MS, DEFAULT_TELEMETRY_PORT};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            gateway: GatewayConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Load configuration from a TOML file, or use defaults if the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// SocketCAN interface to listen on
    pub can_interface: String,

    /// Address telemetry datagrams are sent to
    pub udp_dest_addr: String,

    /// Port telemetry datagrams are sent to
    pub udp_port: u16,

    /// Pause between two passes over the channel table, in milliseconds
    pub cadence_ms: u64,
}

impl GatewayConfig {
    /// Resolve the telemetry destination
    pub fn destination(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .udp_dest_addr
            .parse()
            .with_context(|| {
                format!("Invalid telemetry destination address: {}", self.udp_dest_addr)
            })?;
        Ok(SocketAddr::new(ip, self.udp_port))
    }

    /// Cadence delay between passes
    pub fn cadence(&self) -> Result<Duration> {
        if self.cadence_ms == 0 {
            bail!("cadence_ms must be greater than zero");
        }
        Ok(Duration::from_millis(self.cadence_ms))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            can_interface: "can0".to_string(),
            udp_dest_addr: "127.0.0.1".to_string(),
            udp_port: DEFAULT_TELEMETRY_PORT,
            cadence_ms: DEFAULT_CADENCE_MS,
        }
    }
}
