//! Link counters, written from both contexts and read from the main loop.

use core::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct LinkStats {
    pub(super) received: AtomicU32,
    pub(super) dispatched: AtomicU32,
    pub(super) unrecognized: AtomicU32,
    pub(super) sent: AtomicU32,
    pub(super) abandoned: AtomicU32,
    pub(super) starved: AtomicU32,
    pub(super) inbound_dropped: AtomicU32,
    pub(super) oversize_dropped: AtomicU32,
    pub(super) outbound_rejected: AtomicU32,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatsSnapshot {
    /// Messages fully assembled and handed to the inbound queue.
    pub received: u32,
    /// Inbound messages routed to a handler callback.
    pub dispatched: u32,
    /// Inbound messages with a command no handler recognises.
    pub unrecognized: u32,
    /// Outbound messages fully written to the bus.
    pub sent: u32,
    /// Partial receives discarded because the controller started a read.
    pub abandoned: u32,
    /// Receive transactions dropped for lack of a free buffer.
    pub starved: u32,
    /// Completed messages dropped because the inbound queue was full.
    pub inbound_dropped: u32,
    /// Messages dropped because their declared length exceeded capacity.
    pub oversize_dropped: u32,
    /// Requests refused because the outbound queue was full.
    pub outbound_rejected: u32,
}

impl LinkStats {
    pub(super) fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LinkStatsSnapshot {
        let get = |c: &AtomicU32| c.load(Ordering::Relaxed);
        LinkStatsSnapshot {
            received: get(&self.received),
            dispatched: get(&self.dispatched),
            unrecognized: get(&self.unrecognized),
            sent: get(&self.sent),
            abandoned: get(&self.abandoned),
            starved: get(&self.starved),
            inbound_dropped: get(&self.inbound_dropped),
            oversize_dropped: get(&self.oversize_dropped),
            outbound_rejected: get(&self.outbound_rejected),
        }
    }
}
