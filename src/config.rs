//! Device configuration
//!
//! Each controller is described by one device file. YAML and JSON are both
//! accepted, JSON being a subset of YAML:
//!
//! ```yaml
//! id: LEFT
//! ip: 10.10.0.2
//! status_target: 10.10.0.1:5567
//! runs: [300, 240]
//! ```
//!
//! Omitted fields take their defaults: `port_base` 5568, `strip_count` 8,
//! `bind_ip` unspecified and `pixels_per_strip` the longest run.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::hal::udp::UdpTransportConfig;
use crate::types::{MAX_RUNS, Topology};
use crate::{ControllerError, Result};

/// Port of run 0 unless configured otherwise.
pub const DEFAULT_PORT_BASE: u16 = 5568;

/// Physical output channels unless configured otherwise.
pub const DEFAULT_STRIP_COUNT: usize = 8;

fn default_port_base() -> u16 {
    DEFAULT_PORT_BASE
}

fn default_strip_count() -> usize {
    DEFAULT_STRIP_COUNT
}

fn default_bind_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Static description of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Identity reported in heartbeats, e.g. `LEFT`
    pub id: String,
    /// Address reported in heartbeats
    pub ip: String,
    /// Local address the run sockets bind to
    #[serde(default = "default_bind_ip")]
    pub bind_ip: IpAddr,
    #[serde(default = "default_port_base")]
    pub port_base: u16,
    /// Heartbeat destination
    pub status_target: SocketAddr,
    /// Pixel count of each run, in run order
    pub runs: Vec<u16>,
    #[serde(default = "default_strip_count")]
    pub strip_count: usize,
    #[serde(default)]
    pub pixels_per_strip: Option<usize>,
}

impl DeviceConfig {
    /// Parse and validate a device description.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Parse`] for malformed input and
    /// [`ControllerError::Config`] or [`ControllerError::Topology`] for values
    /// that cannot describe a device.
    pub fn parse(source: &str) -> Result<Self> {
        let config: DeviceConfig = serde_yaml_ng::from_str(source)
            .map_err(|err| ControllerError::parse("device file", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a device file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        debug!("Loaded device file {} ({} bytes)", path.display(), source.len());
        Self::parse(&source)
    }

    /// Run layout described by this device.
    pub fn topology(&self) -> Result<Topology> {
        Topology::new(&self.runs)
    }

    /// Pixel capacity of each output strip.
    pub fn pixels_per_strip(&self) -> usize {
        self.pixels_per_strip
            .unwrap_or_else(|| self.runs.iter().copied().map(usize::from).max().unwrap_or(0))
    }

    /// Socket settings for [`UdpTransport`](crate::hal::udp::UdpTransport).
    pub fn transport_config(&self) -> UdpTransportConfig {
        UdpTransportConfig {
            bind_ip: self.bind_ip,
            port_base: self.port_base,
            run_count: self.runs.len(),
            status_target: self.status_target,
            ip: self.ip.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ControllerError::config("id must not be empty"));
        }
        if self.runs.len() > MAX_RUNS {
            return Err(ControllerError::config(format!(
                "{} runs configured, at most {} are supported",
                self.runs.len(),
                MAX_RUNS
            )));
        }
        let topology = self.topology()?;

        if self.strip_count < topology.run_count() {
            return Err(ControllerError::config(format!(
                "strip_count {} is less than the {} configured runs",
                self.strip_count,
                topology.run_count()
            )));
        }
        if self.pixels_per_strip() < topology.max_pixels() {
            return Err(ControllerError::config(format!(
                "pixels_per_strip {} is shorter than the longest run ({})",
                self.pixels_per_strip(),
                topology.max_pixels()
            )));
        }
        let last_run = (topology.run_count() - 1) as u16;
        if self.port_base.checked_add(last_run).is_none() {
            return Err(ControllerError::config(format!(
                "port_base {} overflows for {} runs",
                self.port_base,
                topology.run_count()
            )));
        }
        Ok(())
    }
}
