//! Receive assembler.
//!
//! Runs inside the bus-event handler on [`BusEvent::Receive`](super::BusEvent)
//! and rebuilds frames from however many bytes the hardware has buffered:
//! zero, one, or several frames' worth.
//!
//! ```text
//!  AwaitingCommand ──1B──▶ CommandReceived ──2B (or 1B + 1B)──▶ LengthReceived
//!                                 │                                  │
//!                                 │ length == 0                      │ cursor == length
//!                                 ▼                                  ▼
//!                             hand-off                           hand-off
//! ```
//!
//! Each phase resumes from the state stored in the buffer, so a frame may be
//! split across any number of events, including between the two length bytes.

use log::{error, warn};

use super::bus::SlaveBus;
use super::packet::{MAX_MSG_SIZE, RxPacket, RxPhase};
use super::stats::LinkStats;
use super::Link;
use crate::error::{LinkError, QueueKind};

/// Outcome of feeding available bytes into one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Progress {
    /// Bytes ran out before the frame completed.
    Pending,
    /// The frame is complete and ready for hand-off.
    Complete,
    /// An oversize frame has been fully skipped.
    Skipped,
}

/// State owned by the interrupt context.
pub(super) struct RxState {
    /// The single buffer currently being assembled.
    pub(super) current: Option<Box<RxPacket>>,
}

impl RxState {
    pub(super) const fn new() -> Self {
        Self { current: None }
    }
}

/// Advance `packet` with the bytes `bus` has available.
///
/// Stops as soon as the frame completes, leaving any further bytes unread.
pub(super) fn absorb<B: SlaveBus>(packet: &mut RxPacket, bus: &mut B) -> Progress {
    loop {
        let available = bus.read_available();
        match packet.phase {
            RxPhase::AwaitingCommand => {
                if available == 0 {
                    return Progress::Pending;
                }
                packet.command = bus.read_byte();
                packet.phase = RxPhase::CommandReceived { high: None };
            }

            RxPhase::CommandReceived { high: None } => {
                if available >= 2 {
                    let high = bus.read_byte();
                    let low = bus.read_byte();
                    if let Some(done) = set_length(packet, high, low) {
                        return done;
                    }
                } else if available == 1 {
                    let high = bus.read_byte();
                    packet.phase = RxPhase::CommandReceived { high: Some(high) };
                    return Progress::Pending;
                } else {
                    return Progress::Pending;
                }
            }

            RxPhase::CommandReceived { high: Some(high) } => {
                if available == 0 {
                    return Progress::Pending;
                }
                let low = bus.read_byte();
                if let Some(done) = set_length(packet, high, low) {
                    return done;
                }
            }

            RxPhase::LengthReceived => {
                let start = packet.cursor as usize;
                let end = packet.length as usize;
                let n = bus.read_into(&mut packet.payload[start..end]);
                packet.cursor += n as u16;
                return if packet.cursor == packet.length {
                    Progress::Complete
                } else {
                    Progress::Pending
                };
            }

            RxPhase::Oversize => {
                let remaining = (packet.length - packet.cursor) as usize;
                let n = remaining.min(available);
                for _ in 0..n {
                    bus.read_byte();
                }
                packet.cursor += n as u16;
                return if packet.cursor == packet.length {
                    Progress::Skipped
                } else {
                    Progress::Pending
                };
            }
        }
    }
}

/// Record the length field. Returns an outcome when the frame ends here.
fn set_length(packet: &mut RxPacket, high: u8, low: u8) -> Option<Progress> {
    packet.length = u16::from_be_bytes([high, low]);
    packet.cursor = 0;
    if packet.length as usize > MAX_MSG_SIZE {
        warn!(
            "link: cmd 0x{:02X} declares {} bytes (max {}), skipping payload",
            packet.command, packet.length, MAX_MSG_SIZE
        );
        packet.phase = RxPhase::Oversize;
        return None;
    }
    packet.phase = RxPhase::LengthReceived;
    if packet.length == 0 {
        // Zero-length frames are complete once the length is known.
        return Some(Progress::Complete);
    }
    None
}

/// Read and drop everything the bus has buffered.
fn discard_available<B: SlaveBus>(bus: &mut B) {
    while bus.read_available() > 0 {
        bus.read_byte();
    }
}

impl Link {
    pub(super) fn handle_receive<B: SlaveBus>(&self, bus: &mut B) {
        self.rx.lock(|cell| {
            let mut rx = cell.borrow_mut();

            while bus.read_available() > 0 {
                let in_flight = rx.current.take();
                let mut packet = match in_flight {
                    Some(p) if p.is_consistent() => p,
                    stale => {
                        if let Some(p) = stale {
                            error!("link: in-flight buffer failed validation ({:?}), resetting", p);
                            self.release(p);
                        }
                        match self.pool.take() {
                            Ok(p) => p,
                            Err(e) => {
                                LinkStats::bump(&self.stats.starved);
                                warn!("link: {}, dropping received bytes", e);
                                discard_available(bus);
                                return;
                            }
                        }
                    }
                };

                match absorb(&mut packet, bus) {
                    Progress::Pending => rx.current = Some(packet),
                    Progress::Complete => self.hand_off(packet),
                    Progress::Skipped => {
                        LinkStats::bump(&self.stats.oversize_dropped);
                        self.release(packet);
                    }
                }
            }
        });
    }

    /// Move a completed buffer onto the inbound queue.
    fn hand_off(&self, packet: Box<RxPacket>) {
        match self.inbound.try_push(packet) {
            Ok(()) => LinkStats::bump(&self.stats.received),
            Err(packet) => {
                LinkStats::bump(&self.stats.inbound_dropped);
                warn!(
                    "link: {}, dropping cmd 0x{:02X}",
                    LinkError::QueueFull(QueueKind::Inbound),
                    packet.command()
                );
                self.release(packet);
            }
        }
    }
}
