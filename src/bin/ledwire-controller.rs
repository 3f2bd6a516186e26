//! ledwire-controller - run one LED controller on this host
//!
//! Usage: `ledwire-controller <device-file>`
//!
//! Binds one UDP port per run, assembles incoming frames onto an in-memory output
//! surface and sends a heartbeat to the configured status target every second.
//! Stops on Ctrl-C. Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use ledwire::hal::MonotonicClock;
use ledwire::hal::memory::{MemoryStatusLed, MemorySurface};
use ledwire::hal::udp::UdpTransport;
use ledwire::hal::Clock;
use ledwire::{Controller, DeviceConfig, Driver};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn config_path() -> Result<String> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(path), None) if !path.starts_with('-') => Ok(path),
        _ => bail!("usage: ledwire-controller <device-file>"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config_path()?;
    let config = DeviceConfig::load(&path).with_context(|| format!("loading {path}"))?;
    info!("Using device file {} for {}", path, config.id);

    let topology = config.topology()?;
    let transport = UdpTransport::bind(config.transport_config())
        .await
        .context("binding run sockets")?;
    let surface = MemorySurface::new(config.strip_count, config.pixels_per_strip());

    let clock = MonotonicClock::new();
    let controller =
        Controller::new(&config.id, topology, transport, surface, MemoryStatusLed::new(), clock.now_ms())?;

    let channels = Driver::spawn(controller, clock);
    let mut heartbeats = Box::pin(channels.heartbeat_stream());

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
            record = heartbeats.next() => match record {
                Some(record) => debug!(
                    "uptime={}ms rx={} applied={} dropped={}",
                    record.uptime_ms, record.rx_frames, record.applied, record.dropped_frames
                ),
                None => break,
            }
        }
    }

    channels.shutdown().await;
    Ok(())
}
