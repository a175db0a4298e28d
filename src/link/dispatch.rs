//! Polled dispatcher: routes completed inbound frames to handler callbacks.

use log::debug;

use super::packet::RxPacket;
use super::stats::LinkStats;
use super::Link;
use crate::protocol::ControllerCommand;

/// Receiver of inbound controller messages.
///
/// Callbacks run in the polling context, never in the bus-event handler, and
/// borrow the payload only for the duration of the call.
pub trait MessageHandler {
    /// A system status document.
    fn on_system_status(&mut self, payload: &[u8]);

    /// One image entry; an empty payload ends the sequence.
    fn on_image(&mut self, payload: &[u8]);

    /// The Wi-Fi SSID; empty when the controller has none.
    fn on_ssid(&mut self, payload: &[u8]);

    /// The Wi-Fi password; empty when the controller has none.
    fn on_password(&mut self, payload: &[u8]);

    /// The controller asks the peripheral to restart.
    fn on_reset(&mut self);
}

/// Route `packet` to the matching callback. Returns `false` for an
/// unrecognised command.
pub fn dispatch<H: MessageHandler + ?Sized>(packet: &RxPacket, handler: &mut H) -> bool {
    let payload = packet.payload();
    match ControllerCommand::from_u8(packet.command()) {
        Some(ControllerCommand::SystemStatusJson) => handler.on_system_status(payload),
        Some(ControllerCommand::ImageJson) => handler.on_image(payload),
        Some(ControllerCommand::Ssid) => handler.on_ssid(payload),
        Some(ControllerCommand::SsidPassword) => handler.on_password(payload),
        Some(ControllerCommand::Reset) => handler.on_reset(),
        None => return false,
    }
    true
}

impl Link {
    /// Dispatch at most one inbound message. Never blocks.
    ///
    /// Returns `true` if a message was taken off the inbound queue. The buffer
    /// goes back to the pool whether or not its command was recognised.
    pub fn process_messages<H: MessageHandler + ?Sized>(&self, handler: &mut H) -> bool {
        let Some(packet) = self.inbound.try_pop() else {
            return false;
        };

        if dispatch(&packet, handler) {
            LinkStats::bump(&self.stats.dispatched);
        } else {
            LinkStats::bump(&self.stats.unrecognized);
            debug!("link: ignoring unknown cmd 0x{:02X}", packet.command());
        }

        self.release(packet);
        true
    }
}
