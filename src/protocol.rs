//! Command identifiers of the control protocol.
//!
//! The identifiers are partitioned by direction and overlap numerically,
//! so a byte only has meaning together with the direction it travelled in.
//! The framing engine in [`crate::link`] treats them as opaque tags.

use crate::link::NOOP;

/// Messages sent by the bus controller to this peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerCommand {
    /// JSON document describing the controller's current state.
    SystemStatusJson = 0x0A,
    /// One JSON image entry; a zero-length payload ends the listing.
    ImageJson = 0x0B,
    Ssid = 0x0D,
    SsidPassword = 0x0E,
    /// Restart the peripheral; it may be holding stale state.
    Reset = 0x0F,
}

impl ControllerCommand {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0x0A => Some(Self::SystemStatusJson),
            0x0B => Some(Self::ImageJson),
            0x0D => Some(Self::Ssid),
            0x0E => Some(Self::SsidPassword),
            0x0F => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Requests sent by this peripheral to the bus controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientRequest {
    /// Filler answer when nothing is queued.
    Noop = NOOP,
    /// Ask for status documents to be pushed from now on.
    SubscribeStatusJson = 0x0A,
    /// Mount the image named in the payload.
    LoadImage = 0x0B,
    EjectImage = 0x0C,
    /// Stream every image entry, then an empty terminator.
    FetchImagesJson = 0x0D,
    FetchSsid = 0x0E,
    FetchSsidPassword = 0x0F,
    /// Send the next image entry of an iteration.
    FetchNextImage = 0x10,
    /// Report the peripheral's IP address (dotted quad payload).
    IpAddress = 0x11,
    NetworkDown = 0x12,
}

impl ClientRequest {
    pub const fn id(self) -> u8 {
        self as u8
    }
}
