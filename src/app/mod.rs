//! Application core: pure bridge logic, zero I/O.
//!
//! This module holds the rules of the network bridge: the start-up
//! credential exchange, the Wi-Fi lifecycle, the image cache and the HTTP
//! route table. All interaction with the radio, the bus and the reset
//! controller happens through **port traits** defined in [`ports`], so this
//! layer is testable without real peripherals.

pub mod images;
pub mod ports;
pub mod routes;
pub mod service;

/// Payload as text, up to the first NUL.
///
/// The controller sends strings with or without a trailing terminator.
/// Returns `None` when the bytes are not UTF-8.
pub(crate) fn payload_text(payload: &[u8]) -> Option<&str> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    core::str::from_utf8(&payload[..end]).ok()
}
