//! Transmit drainer.
//!
//! Runs inside the bus-event handler on [`BusEvent::Request`](super::BusEvent).
//! Each event writes one step of the head outbound frame:
//!
//! ```text
//! event 1: [cmd]
//! event 2: [len_hi, len_lo]            (frame done here if len == 0)
//! event 3: [payload[0..chunk]]
//! event n: [payload[..]]               (frame done when cursor == len)
//! ```
//!
//! The frame stays at the head of the outbound queue until its last byte is
//! written, so a partially sent frame survives across events. An empty queue
//! answers every request with a single [`NOOP`] byte.

use log::error;

use super::bus::SlaveBus;
use super::packet::{OutboundFrame, TxPhase};
use super::stats::LinkStats;
use super::Link;
use crate::error::{LinkError, QueueKind};

/// Byte written when there is nothing to send.
pub const NOOP: u8 = 0x00;

/// Payload bytes written per request event unless configured otherwise.
pub const DEFAULT_TX_CHUNK: usize = 8;

/// Write the next step of `frame`. Returns `true` once the frame is fully sent.
pub(super) fn emit<B: SlaveBus>(frame: &mut OutboundFrame, bus: &mut B, chunk: usize) -> bool {
    match frame.phase {
        TxPhase::NotStarted => {
            bus.write(&[frame.command]);
            frame.phase = TxPhase::CommandSent;
            false
        }
        TxPhase::CommandSent => {
            bus.write(&frame.length_bytes());
            if frame.payload.is_empty() {
                return true;
            }
            frame.phase = TxPhase::LengthSent;
            false
        }
        TxPhase::LengthSent => {
            let start = frame.cursor as usize;
            let end = frame.payload.len().min(start + chunk);
            bus.write(&frame.payload[start..end]);
            frame.cursor = end as u16;
            end == frame.payload.len()
        }
    }
}

impl Link {
    pub(super) fn handle_request<B: SlaveBus>(&self, bus: &mut B) {
        // A read means the controller gave up on any write in progress.
        self.abandon_in_flight();

        match self.outbound.with_front(|frame| emit(frame, bus, self.tx_chunk)) {
            None => bus.write(&[NOOP]),
            Some(false) => {}
            Some(true) => match self.outbound.try_pop() {
                Some(_sent) => LinkStats::bump(&self.stats.sent),
                None => error!("link: {}", LinkError::RemoveFailed(QueueKind::Outbound)),
            },
        }
    }

    /// Answer one controller read with the whole head frame, or a [`NOOP`].
    ///
    /// For bus drivers that cannot report individual reads: the frame is
    /// written in full while the outbound queue is locked, so a request
    /// queued concurrently is never split or sent in the same reply.
    /// Returns `true` if a frame was sent.
    pub fn stage_whole_frame<B: SlaveBus>(&self, bus: &mut B) -> bool {
        self.abandon_in_flight();

        let chunk = self.tx_chunk;
        let drained = self.outbound.with_front(|frame| while !emit(frame, bus, chunk) {});
        match drained {
            None => {
                bus.write(&[NOOP]);
                false
            }
            Some(()) => {
                match self.outbound.try_pop() {
                    Some(_sent) => LinkStats::bump(&self.stats.sent),
                    None => error!("link: {}", LinkError::RemoveFailed(QueueKind::Outbound)),
                }
                true
            }
        }
    }

    /// Reset and return a half-assembled receive buffer to the pool.
    fn abandon_in_flight(&self) {
        let stale = self.rx.lock(|cell| {
            cell.borrow_mut().current.take()
        });
        if let Some(packet) = stale {
            LinkStats::bump(&self.stats.abandoned);
            self.release(packet);
        }
    }
}
