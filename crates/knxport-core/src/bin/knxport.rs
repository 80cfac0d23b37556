use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use knxport_core::config::AdapterConfig;
use knxport_core::driver::Driver;
use knxport_core::link::LinkLayer;
use knxport_core::protocol::{build_connect_request, hex_dump, SerialTransport};
use knxport_core::timer::{StackType, SystemTick, TimerConfig, TimerTable};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static CONNECTION_TIMEOUTS: AtomicU64 = AtomicU64::new(0);

/// Placeholder for the transport-layer connection timer of a full stack
fn on_connection_timeout() {
    CONNECTION_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Parser, Debug)]
#[command(name = "knxport", about = "Poll a KNX TP-UART serial line")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Serial port number, overrides the configuration
    #[arg(long)]
    port: Option<u32>,
    /// Polling steps, overrides the configuration
    #[arg(long)]
    iterations: Option<u32>,
    /// Run without transport-layer connections
    #[arg(long)]
    reduced_stack: bool,
    /// Send a connect request to this address (`0x1105` or `1.1.5`) first
    #[arg(long)]
    connect: Option<String>,
}

/// Link layer stand-in that logs what arrives
#[derive(Default)]
struct TraceLinkLayer {
    received: Vec<u8>,
}

impl LinkLayer for TraceLinkLayer {
    fn init(&mut self) {
        self.received.clear();
    }

    fn feed_receiver(&mut self, byte: u8) {
        self.received.push(byte);
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Parse `0xBEAF`, `48815` or area.line.device notation
fn parse_address(text: &str) -> Result<u16> {
    let parts: Vec<&str> = text.split('.').collect();
    if parts.len() == 3 {
        let area: u16 = parts[0].parse().context("invalid area")?;
        let line: u16 = parts[1].parse().context("invalid line")?;
        let device: u16 = parts[2].parse().context("invalid device")?;
        if area > 0x0F || line > 0x0F || device > 0xFF {
            bail!("address {} out of range", text);
        }
        return Ok((area << 12) | (line << 8) | device);
    }
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).with_context(|| format!("invalid address {}", text)),
        None => text.parse().with_context(|| format!("invalid address {}", text)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AdapterConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AdapterConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if args.reduced_stack {
        config.stack = StackType::Reduced;
    }

    let table = Arc::new(TimerTable::new(TimerConfig::for_stack(
        config.stack,
        on_connection_timeout,
    )));
    let tick = SystemTick::start(Arc::clone(&table), config.tick_period())
        .context("failed to start system tick")?;

    let transport = SerialTransport::with_naming(config.transport_config(), config.naming());
    let mut driver = Driver::new(transport, TraceLinkLayer::default(), config.driver_config());

    driver
        .start(config.port)
        .with_context(|| format!("Could not open serial port {}", config.port))?;

    if let Some(text) = &args.connect {
        let address = parse_address(text)?;
        let frame = build_connect_request(address);
        info!(frame = %hex_dump(frame.as_bytes()), "sending connect request");
        if let Err(e) = driver.transport_mut().write(frame.as_bytes()) {
            warn!("connect request not sent: {}", e);
        }
    }

    let report = driver.run();
    driver.finish();
    tick.stop();

    info!(
        polls = report.polls,
        ready = report.ready,
        timeouts = report.timeouts,
        poll_errors = report.poll_errors,
        read_errors = report.read_errors,
        bytes = report.bytes_received,
        ticks = table.ticks(),
        connection_timeouts = CONNECTION_TIMEOUTS.load(Ordering::Relaxed),
        "session complete in {:.6}s",
        report.elapsed.as_secs_f64()
    );
    if !driver.link().received.is_empty() {
        info!(data = %hex_dump(&driver.link().received), "received from bus");
    }
    Ok(())
}
