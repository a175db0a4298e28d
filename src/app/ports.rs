//! Port traits: the hexagonal boundary between the bridge logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! The [`BridgeService`](super::service::BridgeService) consumes these via
//! generics, so the application core never touches the radio, the bus or
//! the reset controller directly.

use core::fmt;
use core::net::Ipv4Addr;

use crate::error::LinkError;
use crate::protocol::ClientRequest;

// ───────────────────────────────────────────────────────────────
// Request port (domain → bus controller)
// ───────────────────────────────────────────────────────────────

/// Queues requests for the bus controller.
pub trait RequestPort {
    /// Request with an empty payload.
    fn request(&self, request: ClientRequest) -> Result<(), LinkError>;

    /// Request carrying a text payload.
    fn request_with(&self, request: ClientRequest, text: &str) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Network port (domain ↔ Wi-Fi station)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The radio could not be brought up.
    InitFailed,
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// Association or DHCP did not finish within the timeout.
    ConnectFailed,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "radio init failed"),
            Self::NoCredentials => write!(f, "no WiFi credentials"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
        }
    }
}

/// Wi-Fi station lifecycle.
pub trait NetworkPort {
    /// Power up the radio in station mode.
    fn init(&mut self) -> Result<(), NetworkError>;

    /// Join `ssid` and wait for an address, giving up after `timeout_ms`.
    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<Ipv4Addr, NetworkError>;

    /// Whether the station link is still up.
    fn is_link_up(&self) -> bool;

    /// Power the radio down.
    fn deinit(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Indicator port
// ───────────────────────────────────────────────────────────────

/// The "network up" light.
pub trait IndicatorPort {
    fn set(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Reboot port
// ───────────────────────────────────────────────────────────────

/// Restarts the device.
pub trait RebootPort {
    /// Schedule a restart `delay_ms` from now.
    fn reboot_after(&mut self, delay_ms: u32);
}
