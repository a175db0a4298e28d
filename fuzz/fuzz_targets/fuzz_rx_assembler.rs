//! Fuzz target: receive assembler and bus event sequencing
//!
//! Interprets the input as a script of bus events. Each byte selects an
//! action:
//!
//! - `0x00..=0xEF`: the low 6 bits + 1 bytes of the remaining input arrive
//!   in one `Receive` event
//! - `0xF0..=0xF7`: `Request` (abandons any half-built frame)
//! - `0xF8..=0xFB`: `Finish`
//! - `0xFC..=0xFF`: the main loop dispatches one message
//!
//! Invariants checked:
//! - No panics under any event order or byte content
//! - Every pool buffer is always accounted for: free, queued or in flight
//! - A `Request` always leaves nothing in flight
//!
//! cargo fuzz run fuzz_rx_assembler

#![no_main]

use ctrlbridge::config::LinkConfig;
use ctrlbridge::link::{BufferedBus, BusEvent, Link, MessageHandler, POOL_SIZE};
use libfuzzer_sys::fuzz_target;

struct Sink;

impl MessageHandler for Sink {
    fn on_system_status(&mut self, _: &[u8]) {}
    fn on_image(&mut self, _: &[u8]) {}
    fn on_ssid(&mut self, _: &[u8]) {}
    fn on_password(&mut self, _: &[u8]) {}
    fn on_reset(&mut self) {}
}

fn assert_conserved(link: &Link) {
    let in_flight = usize::from(link.has_in_flight());
    assert_eq!(
        link.available_buffers() + link.inbound_len() + in_flight,
        POOL_SIZE,
        "receive buffer leaked"
    );
}

fuzz_target!(|data: &[u8]| {
    let link = Link::new(&LinkConfig::default());
    let mut bus: BufferedBus<64> = BufferedBus::new();
    let mut rest = data;

    while let Some((&op, tail)) = rest.split_first() {
        rest = tail;
        match op {
            0x00..=0xEF => {
                let n = ((op & 0x3F) as usize + 1).min(rest.len());
                let (bytes, tail) = rest.split_at(n);
                rest = tail;
                bus.push_rx(bytes);
                link.on_bus_event(&mut bus, BusEvent::Receive);
                bus.clear_rx();
            }
            0xF0..=0xF7 => {
                link.on_bus_event(&mut bus, BusEvent::Request);
                let _ = bus.take_tx();
                assert!(!link.has_in_flight());
            }
            0xF8..=0xFB => link.on_bus_event(&mut bus, BusEvent::Finish),
            _ => {
                link.process_messages(&mut Sink);
            }
        }
        assert_conserved(&link);
    }

    while link.process_messages(&mut Sink) {}
    link.on_bus_event(&mut bus, BusEvent::Request);
    assert_eq!(link.available_buffers(), POOL_SIZE);
});
