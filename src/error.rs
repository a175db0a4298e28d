//! Unified error types for the CtrlBridge firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! main loop's error handling uniform. All variants are `Copy` so they can
//! be passed out of the bus-event handler's logging paths without allocation.

use core::fmt;

use crate::app::ports::NetworkError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The framing engine rejected an operation.
    Link(LinkError),
    /// The network stack failed.
    Network(NetworkError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Framing engine errors
// ---------------------------------------------------------------------------

/// Identifies one of the three hand-off queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Free receive buffers.
    Available,
    /// Completed receive buffers awaiting dispatch.
    Inbound,
    /// Requests awaiting transmission.
    Outbound,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

/// Failures reported by the framing engine.
///
/// None of these are fatal: inside the bus-event handler they are logged
/// and the event is dropped, in the polling context they are returned to
/// the caller, who may re-issue the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No free receive buffer was available when one was needed.
    BufferStarvation,
    /// A queue was at capacity.
    QueueFull(QueueKind),
    /// An item that should have been at the head of a queue was missing.
    RemoveFailed(QueueKind),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferStarvation => write!(f, "no free receive buffer"),
            Self::QueueFull(q) => write!(f, "{q} queue full"),
            Self::RemoveFailed(q) => write!(f, "unable to remove head of {q} queue"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
