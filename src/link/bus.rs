//! Peripheral-side bus abstraction.
//!
//! The engine never talks to registers directly. The interrupt handler (or
//! the pump task on targets with a buffered driver) wraps the hardware in a
//! [`SlaveBus`] and forwards each [`BusEvent`] to
//! [`Link::on_bus_event`](super::Link::on_bus_event).

use heapless::Deque;

/// Events reported by the peripheral bus hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// The controller wrote bytes; one or more may be readable.
    Receive,
    /// The controller is reading; bytes must be written.
    Request,
    /// The controller ended the transaction.
    Finish,
}

/// Byte-level access to the peripheral's receive and transmit FIFOs.
///
/// Implementations must never block: the engine calls these from
/// interrupt context.
pub trait SlaveBus {
    /// Number of received bytes ready to be read.
    fn read_available(&self) -> usize;

    /// Read one byte. Only called when [`read_available`](Self::read_available)
    /// is non-zero.
    fn read_byte(&mut self) -> u8;

    /// Queue `data` for the controller to read.
    fn write(&mut self, data: &[u8]);

    /// Read up to `buf.len()` bytes, bounded by what is available.
    fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.read_available());
        for slot in &mut buf[..n] {
            *slot = self.read_byte();
        }
        n
    }
}

/// Software FIFO implementation of [`SlaveBus`].
///
/// Used by the pump task to present a buffered hardware driver to the engine
/// one event at a time, and by host-side tests.
pub struct BufferedBus<const RX: usize> {
    rx: Deque<u8, RX>,
    tx: Vec<u8>,
}

impl<const RX: usize> BufferedBus<RX> {
    pub fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Vec::new(),
        }
    }

    /// Make `data` readable by the engine. Returns how many bytes fit.
    pub fn push_rx(&mut self, data: &[u8]) -> usize {
        let mut pushed = 0;
        for &b in data {
            if self.rx.push_back(b).is_err() {
                break;
            }
            pushed += 1;
        }
        pushed
    }

    /// Bytes written by the engine since the last call.
    pub fn take_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// Drop any bytes the engine has not consumed.
    pub fn clear_rx(&mut self) {
        self.rx.clear();
    }
}

impl<const RX: usize> Default for BufferedBus<RX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const RX: usize> SlaveBus for BufferedBus<RX> {
    fn read_available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn write(&mut self, data: &[u8]) {
        self.tx.extend_from_slice(data);
    }
}
