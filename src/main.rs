//! CtrlBridge Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  I2cSlave ─▶ bus pump ─▶ Link ◀─ RequestPort                   │
//! │  WifiAdapter (NetworkPort)   Indicator   Rebooter   HttpServer │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BridgeService (pure logic)                  │    │
//! │  │  credentials · Wi-Fi lifecycle · image cache · routes  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use ctrlbridge::adapters::http::HttpServer;
use ctrlbridge::adapters::i2c_slave::I2cSlave;
use ctrlbridge::adapters::wifi::WifiAdapter;
use ctrlbridge::app::ports::RebootPort;
use ctrlbridge::app::service::{BridgeService, PollOutcome};
use ctrlbridge::config::{BridgeConfig, LinkConfig};
use ctrlbridge::drivers::bus_pump;
use ctrlbridge::drivers::indicator::Indicator;
use ctrlbridge::drivers::reboot::Rebooter;
use ctrlbridge::drivers::watchdog::{WATCHDOG_MARGIN_MS, Watchdog};
use ctrlbridge::link::Link;

/// Main loop period when there is nothing to do.
const LOOP_IDLE: Duration = Duration::from_millis(1);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("CtrlBridge v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let link_config = LinkConfig::default();
    link_config
        .validate()
        .map_err(ctrlbridge::error::Error::Config)
        .context("link configuration")?;
    let bridge_config = BridgeConfig::default();

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 4. Framing link + bus pump ────────────────────────────
    // Shared for the life of the firmware by the pump thread and the main loop.
    let link: &'static Link = Box::leak(Box::new(Link::new(&link_config)));
    let slave = I2cSlave::new(
        peripherals.i2c0,
        peripherals.pins.gpio1,
        peripherals.pins.gpio0,
        &link_config,
    )?;
    bus_pump::spawn(link, slave, &link_config)?;

    // ── 5. Network, indicator, restart ────────────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    let mut indicator = Indicator::new(PinDriver::output(peripherals.pins.gpio2)?);
    let mut rebooter = Rebooter::new();
    let watchdog = Watchdog::new(bridge_config.wifi_connect_timeout_ms + WATCHDOG_MARGIN_MS);

    // ── 6. Bridge service ─────────────────────────────────────
    let service = Arc::new(Mutex::new(BridgeService::new(link, bridge_config.clone())));
    service
        .lock()
        .map_err(|_| anyhow::anyhow!("service lock poisoned"))?
        .start()?;
    let mut http: Option<HttpServer> = None;

    info!("System ready. Entering main loop.");

    // ── 7. Main loop ──────────────────────────────────────────
    loop {
        let step = match service.lock() {
            Ok(mut svc) => svc.poll(link, &mut wifi, &mut indicator, &mut rebooter),
            Err(_) => {
                error!("main: service lock poisoned, restarting");
                rebooter.reboot_after(bridge_config.reset_delay_ms);
                return Err(anyhow::anyhow!("service lock poisoned"));
            }
        };

        match step {
            Ok(PollOutcome::StartHttp) if http.is_none() => {
                match HttpServer::start(service.clone()) {
                    Ok(server) => http = Some(server),
                    Err(e) => warn!("main: HTTP server failed to start: {}", e),
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!("main: {}, halting", e);
                return Err(e.into());
            }
        }

        watchdog.feed();
        std::thread::sleep(LOOP_IDLE);
    }
}
