//! Framed command/length/payload link over the peripheral side of the bus.
//!
//! ```text
//!  interrupt context                         polling context (main loop)
//! ┌───────────────────────┐                ┌──────────────────────────┐
//! │ BusEvent::Receive     │  Box<RxPacket> │                          │
//! │   rx assembler ───────┼──▶ inbound ───▶│ process_messages()       │
//! │        ▲              │                │   → MessageHandler       │
//! │        │ available ◀──┼────────────────┼── release (zeroed)       │
//! │        │              │                │                          │
//! │ BusEvent::Request     │ Box<Outbound>  │                          │
//! │   tx drainer ◀────────┼── outbound ◀───┼── enqueue_request*()     │
//! └───────────────────────┘                └──────────────────────────┘
//! ```
//!
//! A [`Link`] owns the buffer pool, the three hand-off queues, and the single
//! in-flight receive buffer. It is built once at start-up and shared by
//! reference between the bus-event handler and the main loop. Every hand-off
//! moves a boxed buffer, so exactly one context holds a buffer at any time.

pub mod bus;
pub mod dispatch;
pub mod packet;
pub mod pool;
pub mod queue;
pub mod stats;

mod rx;
mod tx;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{error, info, warn};

pub use bus::{BufferedBus, BusEvent, SlaveBus};
pub use dispatch::{MessageHandler, dispatch};
pub use packet::{MAX_MSG_SIZE, OutboundFrame, RxPacket, RxPhase, TxPhase};
pub use pool::{BufferPool, POOL_SIZE};
pub use queue::HandoffQueue;
pub use stats::{LinkStats, LinkStatsSnapshot};
pub use tx::{DEFAULT_TX_CHUNK, NOOP};

use crate::config::LinkConfig;
use crate::error::{LinkError, QueueKind};
use rx::RxState;

/// Depth of the inbound and outbound queues.
pub const QUEUE_DEPTH: usize = 20;

pub struct Link {
    pool: BufferPool,
    inbound: HandoffQueue<Box<RxPacket>, QUEUE_DEPTH>,
    outbound: HandoffQueue<Box<OutboundFrame>, QUEUE_DEPTH>,
    rx: Mutex<CriticalSectionRawMutex, RefCell<RxState>>,
    tx_chunk: usize,
    stats: LinkStats,
}

impl Link {
    /// Allocate the receive pool and empty queues.
    pub fn new(config: &LinkConfig) -> Self {
        let tx_chunk = (config.tx_chunk_size as usize).clamp(1, MAX_MSG_SIZE);
        info!(
            "link: {} rx buffers x {}B, queue depth {}, tx chunk {}B",
            POOL_SIZE, MAX_MSG_SIZE, QUEUE_DEPTH, tx_chunk
        );
        Self {
            pool: BufferPool::new(),
            inbound: HandoffQueue::new(),
            outbound: HandoffQueue::new(),
            rx: Mutex::new(RefCell::new(RxState::new())),
            tx_chunk,
            stats: LinkStats::default(),
        }
    }

    // ── Interrupt context ─────────────────────────────────────

    /// Handle one bus event. Never blocks and never panics; failures are
    /// logged and end the handling of that event only.
    pub fn on_bus_event<B: SlaveBus>(&self, bus: &mut B, event: BusEvent) {
        match event {
            BusEvent::Receive => self.handle_receive(bus),
            BusEvent::Request => self.handle_request(bus),
            // Frames are delimited by their length, not by transactions.
            BusEvent::Finish => {}
        }
    }

    // ── Polling context ───────────────────────────────────────

    /// Queue a request with an empty payload.
    pub fn enqueue_request(&self, command: u8) -> Result<(), LinkError> {
        self.enqueue(Box::new(OutboundFrame::empty(command)))
    }

    /// Queue a request carrying `text`.
    ///
    /// The payload is truncated to [`MAX_MSG_SIZE`] bytes; keeping requests
    /// within that size is the caller's job.
    pub fn enqueue_request_with(&self, command: u8, text: &str) -> Result<(), LinkError> {
        self.enqueue(Box::new(OutboundFrame::with_text(command, text)))
    }

    fn enqueue(&self, frame: Box<OutboundFrame>) -> Result<(), LinkError> {
        self.outbound.try_push(frame).map_err(|frame| {
            LinkStats::bump(&self.stats.outbound_rejected);
            warn!("link: outbound queue full, cmd 0x{:02X} not queued", frame.command());
            LinkError::QueueFull(QueueKind::Outbound)
        })
    }

    // ── Shared ────────────────────────────────────────────────

    /// Zero a receive buffer and return it to the pool.
    fn release(&self, packet: Box<RxPacket>) {
        if let Err(e) = self.pool.recycle(packet) {
            error!("link: buffer lost on release: {}", e);
        }
    }

    pub fn stats(&self) -> LinkStatsSnapshot {
        self.stats.snapshot()
    }

    /// Free receive buffers.
    pub fn available_buffers(&self) -> usize {
        self.pool.available()
    }

    /// Completed messages waiting for [`process_messages`](Self::process_messages).
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Requests waiting to be sent, including one partly sent.
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Whether a receive buffer is currently being assembled.
    pub fn has_in_flight(&self) -> bool {
        self.rx.lock(|cell| cell.borrow().current.is_some())
    }

    /// Payload bytes written per request event.
    pub fn tx_chunk(&self) -> usize {
        self.tx_chunk
    }
}
