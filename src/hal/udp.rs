//! UDP transport over tokio sockets
//!
//! One socket per run is bound at `port_base + run`, so the receiving socket
//! identifies the run. Sockets are drained with `try_recv_from`, which never
//! waits; heartbeats leave through a separate socket with `try_send_to`.
//!
//! The host offers no link probe, so the reported link state follows the
//! outcome of the most recent socket operation.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::Transport;
use crate::types::MAX_RUNS;
use crate::{ControllerError, Result};

/// Largest UDP payload over IPv4.
const MAX_DATAGRAM: usize = 65_507;

/// Where to bind and where to report.
#[derive(Debug, Clone)]
pub struct UdpTransportConfig {
    /// Local address the run sockets listen on
    pub bind_ip: IpAddr,
    /// Port of run 0; run `n` listens on `port_base + n`
    pub port_base: u16,
    pub run_count: usize,
    /// Heartbeat destination
    pub status_target: SocketAddr,
    /// Address string reported in heartbeats
    pub ip: String,
}

/// Transport bound to one UDP port per run.
#[derive(Debug)]
pub struct UdpTransport {
    runs: Vec<UdpSocket>,
    status: UdpSocket,
    status_target: SocketAddr,
    ip: String,
    buffer: Box<[u8]>,
    /// False after a socket error, true again after the next success
    link_up: bool,
}

impl UdpTransport {
    /// Bind every run socket and the status socket.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Config`] when the port range does not fit in
    /// u16 or exceeds the run limit, and [`ControllerError::Bind`] when any socket
    /// cannot be bound.
    pub async fn bind(config: UdpTransportConfig) -> Result<Self> {
        if config.run_count == 0 || config.run_count > MAX_RUNS {
            return Err(ControllerError::config(format!(
                "cannot bind {} run sockets",
                config.run_count
            )));
        }

        let mut runs = Vec::with_capacity(config.run_count);
        for run in 0..config.run_count {
            let port = u16::try_from(run)
                .ok()
                .and_then(|run| config.port_base.checked_add(run))
                .ok_or_else(|| {
                    ControllerError::config(format!(
                        "port base {} leaves no room for run {}",
                        config.port_base, run
                    ))
                })?;
            let socket = UdpSocket::bind(SocketAddr::new(config.bind_ip, port))
                .await
                .map_err(|source| ControllerError::bind_failed(port, source))?;
            debug!("Run {} listening on {}", run, SocketAddr::new(config.bind_ip, port));
            runs.push(socket);
        }

        let status = UdpSocket::bind(SocketAddr::new(config.bind_ip, 0))
            .await
            .map_err(|source| ControllerError::bind_failed(0, source))?;

        info!(
            "Bound {} run sockets from {}:{}, heartbeats to {}",
            runs.len(),
            config.bind_ip,
            config.port_base,
            config.status_target
        );

        Ok(Self {
            runs,
            status,
            status_target: config.status_target,
            ip: config.ip,
            buffer: vec![0u8; MAX_DATAGRAM].into(),
            link_up: true,
        })
    }

    /// Local addresses of the run sockets, in run order.
    pub fn run_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.runs.iter().map(|socket| socket.local_addr().map_err(ControllerError::from)).collect()
    }

    /// Local address heartbeats are sent from.
    pub fn status_addr(&self) -> Result<SocketAddr> {
        Ok(self.status.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn poll(&mut self, sink: &mut dyn FnMut(u8, &[u8])) {
        for (run, socket) in self.runs.iter().enumerate() {
            // Bounded by MAX_RUNS at bind time
            let run_index = run as u8;
            loop {
                match socket.try_recv_from(&mut self.buffer) {
                    Ok((len, _peer)) => {
                        self.link_up = true;
                        sink(run_index, &self.buffer[..len]);
                    }
                    Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                    Err(err) => {
                        debug!("Receive on run {} failed: {}", run, err);
                        self.link_up = false;
                        break;
                    }
                }
            }
        }
    }

    fn send_status(&mut self, payload: &[u8]) -> Result<()> {
        match self.status.try_send_to(payload, self.status_target) {
            Ok(_) => {
                self.link_up = true;
                Ok(())
            }
            Err(source) => {
                // A full send buffer says nothing about the link
                if source.kind() != io::ErrorKind::WouldBlock {
                    self.link_up = false;
                }
                Err(ControllerError::send_failed(self.status_target, source))
            }
        }
    }

    fn link_up(&self) -> bool {
        self.link_up
    }

    fn ip(&self) -> &str {
        &self.ip
    }
}
