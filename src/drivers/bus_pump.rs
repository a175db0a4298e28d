//! Bus pump: turns a buffered peripheral driver into [`BusEvent`]s.
//!
//! Targets whose bus driver buffers traffic instead of raising per-event
//! interrupts run the engine from this task:
//!
//! ```text
//!  BusHardware::read ──bytes──▶ BufferedBus ──Receive──▶ Link
//!        (idle gap)        ──────────────────Finish───▶ Link
//!                                 ◀──stage_whole_frame──
//!  BusHardware::stage ◀──bytes──
//! ```
//!
//! A buffered driver cannot report the controller's reads or the end of its
//! writes, so the pump infers them:
//!
//! - a write has ended once no byte has arrived for longer than two byte
//!   times at the configured baud rate *and* no frame is half assembled
//!   (the interrupt moves FIFO bytes into the driver's ring in bursts, so a
//!   single empty read proves nothing);
//! - a write that stops mid-frame for [`STALE_WRITE`] is abandoned;
//! - at the end of every write one complete outbound frame (or a single
//!   NOOP) is staged for the controller's next read.
//!
//! The loop runs on an `edge-executor` with `async-io-mini` timers so idle
//! polling sleeps on the reactor instead of spinning.

use core::time::Duration;
use std::io;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::config::LinkConfig;
use crate::link::{BufferedBus, BusEvent, Link};

use super::task_pin::{Core, spawn_on_core};

/// Bytes moved from the hardware per read.
pub const PUMP_CHUNK: usize = 128;

/// Idle delay between hardware polls.
pub const IDLE_POLL: Duration = Duration::from_millis(1);

/// Silence after which a write stuck mid-frame is given up.
pub const STALE_WRITE: Duration = Duration::from_millis(100);

/// Bits on the wire per byte: eight data bits plus the acknowledge.
const BITS_PER_BYTE: u64 = 9;

/// Buffered peripheral hardware.
pub trait BusHardware {
    /// Read received bytes into `buf`, waiting at most `timeout_ms`.
    /// Returns 0 when nothing arrived.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> usize;

    /// Queue `bytes` for the controller's next reads.
    fn stage(&mut self, bytes: &[u8]);
}

/// Empty polls, each [`IDLE_POLL`] apart, that prove the bus idle at `baud_rate`.
///
/// The first empty poll follows a read immediately, so one more is needed
/// before any time has passed.
pub fn settle_polls(baud_rate: u32) -> u32 {
    let byte_us = (BITS_PER_BYTE * 1_000_000).div_ceil(u64::from(baud_rate.max(1)));
    let gap_us = 2 * byte_us;
    let poll_us = IDLE_POLL.as_micros() as u64;
    1 + gap_us.div_ceil(poll_us) as u32
}

/// Per-task pump state.
pub struct BusPump {
    bus: BufferedBus<PUMP_CHUNK>,
    scratch: [u8; PUMP_CHUNK],
    in_transaction: bool,
    idle_polls: u32,
    settle_polls: u32,
    stale_polls: u32,
}

impl BusPump {
    pub fn new(config: &LinkConfig) -> Self {
        let settle = settle_polls(config.baud_rate);
        let stale = (STALE_WRITE.as_micros() / IDLE_POLL.as_micros()) as u32;
        Self {
            bus: BufferedBus::new(),
            scratch: [0; PUMP_CHUNK],
            in_transaction: false,
            idle_polls: 0,
            settle_polls: settle,
            stale_polls: stale.max(settle),
        }
    }

    /// Move one batch of traffic. Returns `false` when nothing happened and
    /// the caller should wait [`IDLE_POLL`] before the next step.
    pub fn step<H: BusHardware + ?Sized>(&mut self, link: &Link, hw: &mut H) -> bool {
        let n = hw.read(&mut self.scratch, 0);
        if n > 0 {
            self.bus.push_rx(&self.scratch[..n]);
            link.on_bus_event(&mut self.bus, BusEvent::Receive);
            self.bus.clear_rx();
            self.in_transaction = true;
            self.idle_polls = 0;
            return true;
        }

        if !self.in_transaction {
            return false;
        }

        self.idle_polls += 1;
        let in_flight = link.has_in_flight();
        let limit = if in_flight { self.stale_polls } else { self.settle_polls };
        if self.idle_polls < limit {
            return false;
        }
        if in_flight {
            warn!("pump: write stalled mid-frame for {:?}, abandoning it", STALE_WRITE);
        }

        self.in_transaction = false;
        self.idle_polls = 0;
        link.on_bus_event(&mut self.bus, BusEvent::Finish);
        link.stage_whole_frame(&mut self.bus);
        hw.stage(&self.bus.take_tx());
        true
    }
}

async fn pump_loop<H: BusHardware>(link: &'static Link, mut hw: H, mut pump: BusPump) {
    loop {
        if !pump.step(link, &mut hw) {
            async_io_mini::Timer::after(IDLE_POLL).await;
        }
    }
}

/// Spawn the pump on its own core-pinned thread.
pub fn spawn<H: BusHardware + Send + 'static>(
    link: &'static Link,
    hw: H,
    config: &LinkConfig,
) -> io::Result<JoinHandle<()>> {
    let pump = BusPump::new(config);
    let settle = pump.settle_polls;
    spawn_on_core(Core::Pro, 5, 8, "bus-pump\0", move || {
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
        executor.spawn(pump_loop(link, hw, pump)).detach();
        info!("pump: started ({}B reads, write ends after {} idle polls)", PUMP_CHUNK, settle);
        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    })
}
