//! Fixed pool of receive buffers.
//!
//! All buffers are allocated once at construction; afterwards they only
//! circulate between the availability queue, the in-flight slot, the inbound
//! queue and the dispatcher. Every buffer is zeroed on its way back in.

use log::error;

use super::packet::RxPacket;
use super::queue::HandoffQueue;
use crate::error::{LinkError, QueueKind};

/// Number of receive buffers in circulation.
pub const POOL_SIZE: usize = 5;

pub struct BufferPool {
    available: HandoffQueue<Box<RxPacket>, POOL_SIZE>,
}

impl BufferPool {
    /// Allocate [`POOL_SIZE`] buffers and mark them all available.
    pub fn new() -> Self {
        let pool = Self {
            available: HandoffQueue::new(),
        };
        for _ in 0..POOL_SIZE {
            if pool.available.try_push(Box::new(RxPacket::new())).is_err() {
                error!("link: pool seeding overflowed the availability queue");
            }
        }
        pool
    }

    /// Draw a free buffer.
    pub fn take(&self) -> Result<Box<RxPacket>, LinkError> {
        self.available.try_pop().ok_or(LinkError::BufferStarvation)
    }

    /// Zero `packet` and put it back into service.
    pub fn recycle(&self, mut packet: Box<RxPacket>) -> Result<(), LinkError> {
        packet.reset();
        self.available
            .try_push(packet)
            .map_err(|_| LinkError::QueueFull(QueueKind::Available))
    }

    /// Number of buffers currently free.
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Whether every free buffer is in its zeroed state.
    pub fn all_available_reset(&self) -> bool {
        let mut clean = true;
        self.available.for_each(|p| clean &= p.is_reset());
        clean
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
