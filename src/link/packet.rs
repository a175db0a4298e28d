//! Message buffers for both directions of the link.
//!
//! Wire format (identical in both directions):
//! ```text
//! ┌─────────┬──────────────┬──────────────────────────┐
//! │ Cmd (1B)│ Length (2B)  │ Payload (Length bytes)   │
//! │         │ BE u16       │                          │
//! └─────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! There is no checksum and no terminator; framing relies entirely on the
//! declared length. A zero length is valid and carries no payload.

use heapless::Vec;

/// Capacity of a message payload in bytes.
pub const MAX_MSG_SIZE: usize = 2048;

// ── Receive side ─────────────────────────────────────────────

/// Progress of a receive buffer through one message.
///
/// Phases only ever advance; a buffer returns to `AwaitingCommand` solely
/// through [`RxPacket::reset`] when it goes back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxPhase {
    /// Nothing received yet.
    AwaitingCommand,
    /// Command byte received. `high` holds the first length byte when it
    /// arrived in an event of its own and the low byte is still pending.
    CommandReceived { high: Option<u8> },
    /// Length known, payload bytes are being collected.
    LengthReceived,
    /// Declared length exceeds [`MAX_MSG_SIZE`]; payload bytes are consumed
    /// and thrown away so the stream stays aligned on frame boundaries.
    Oversize,
}

/// A pooled receive buffer.
///
/// `cursor <= length` always holds, and `length <= MAX_MSG_SIZE` holds in
/// every phase except [`RxPhase::Oversize`].
pub struct RxPacket {
    pub(super) command: u8,
    pub(super) length: u16,
    pub(super) cursor: u16,
    pub(super) phase: RxPhase,
    pub(super) payload: [u8; MAX_MSG_SIZE],
}

impl RxPacket {
    pub fn new() -> Self {
        Self {
            command: 0,
            length: 0,
            cursor: 0,
            phase: RxPhase::AwaitingCommand,
            payload: [0; MAX_MSG_SIZE],
        }
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    /// Declared payload length.
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Payload bytes received so far (the whole payload once complete).
    pub fn payload(&self) -> &[u8] {
        let end = (self.cursor as usize).min(MAX_MSG_SIZE);
        &self.payload[..end]
    }

    pub fn phase(&self) -> RxPhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor as usize
    }

    /// Check the buffer invariants before it is touched by a handler.
    pub fn is_consistent(&self) -> bool {
        if self.cursor > self.length {
            return false;
        }
        match self.phase {
            RxPhase::Oversize => self.length as usize > MAX_MSG_SIZE,
            _ => self.length as usize <= MAX_MSG_SIZE,
        }
    }

    /// Zero every field so no state or payload byte survives into the next use.
    pub fn reset(&mut self) {
        self.command = 0;
        self.length = 0;
        self.cursor = 0;
        self.phase = RxPhase::AwaitingCommand;
        self.payload.fill(0);
    }

    /// Whether the buffer is in the state [`reset`](Self::reset) leaves it in.
    pub fn is_reset(&self) -> bool {
        self.command == 0
            && self.length == 0
            && self.cursor == 0
            && self.phase == RxPhase::AwaitingCommand
            && self.payload.iter().all(|&b| b == 0)
    }
}

impl Default for RxPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RxPacket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RxPacket")
            .field("command", &self.command)
            .field("length", &self.length)
            .field("cursor", &self.cursor)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

// ── Transmit side ────────────────────────────────────────────

/// Progress of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    NotStarted,
    CommandSent,
    LengthSent,
}

/// A request waiting in, or being drained from, the outbound queue.
///
/// Outbound frames are allocated per request and dropped once fully sent;
/// they never join the receive pool.
#[derive(Debug)]
pub struct OutboundFrame {
    pub(super) command: u8,
    pub(super) cursor: u16,
    pub(super) phase: TxPhase,
    pub(super) payload: Vec<u8, MAX_MSG_SIZE>,
}

impl OutboundFrame {
    /// A request with an empty payload.
    pub fn empty(command: u8) -> Self {
        Self {
            command,
            cursor: 0,
            phase: TxPhase::NotStarted,
            payload: Vec::new(),
        }
    }

    /// A request carrying `text`, truncated to [`MAX_MSG_SIZE`] bytes.
    pub fn with_text(command: u8, text: &str) -> Self {
        let mut frame = Self::empty(command);
        let n = text.len().min(MAX_MSG_SIZE);
        // Cannot fail: `n` is bounded by the vector's capacity.
        let _ = frame.payload.extend_from_slice(&text.as_bytes()[..n]);
        frame
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Big-endian length field.
    pub fn length_bytes(&self) -> [u8; 2] {
        (self.payload.len() as u16).to_be_bytes()
    }
}
