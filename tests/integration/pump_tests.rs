//! Bus pump over the host loopback peripheral.

use ctrlbridge::adapters::i2c_slave::I2cSlave;
use ctrlbridge::config::LinkConfig;
use ctrlbridge::drivers::bus_pump::{BusHardware, BusPump};
use ctrlbridge::link::{Link, NOOP, POOL_SIZE};

use crate::mock_bus::{Delivered, RecordingHandler, drain, frame};

/// Poll long enough for any write to be recognised as finished.
fn settle<H: BusHardware>(pump: &mut BusPump, link: &Link, hw: &mut H) -> usize {
    (0..200).filter(|_| pump.step(link, hw)).count()
}

#[test]
fn idle_bus_does_nothing() {
    let link = Link::new(&LinkConfig::default());
    let mut hw = I2cSlave::new();
    let mut pump = BusPump::new(&LinkConfig::default());
    assert_eq!(settle(&mut pump, &link, &mut hw), 0);
    assert!(hw.controller_read_all().is_empty());
}

#[test]
fn write_is_delivered_and_noop_staged() {
    let link = Link::new(&LinkConfig::default());
    let mut hw = I2cSlave::new();
    let mut pump = BusPump::new(&LinkConfig::default());

    hw.controller_write(&frame(0x0D, b"attic"));
    settle(&mut pump, &link, &mut hw);

    assert_eq!(hw.controller_read_all(), vec![NOOP]);
    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Ssid(b"attic".to_vec())]);
}

#[test]
fn write_larger_than_one_chunk() {
    let link = Link::new(&LinkConfig::default());
    let mut hw = I2cSlave::new();
    let mut pump = BusPump::new(&LinkConfig::default());
    let doc = vec![b'{'; 700];

    hw.controller_write(&frame(0x0A, &doc));
    settle(&mut pump, &link, &mut hw);

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Status(doc)]);
    assert_eq!(link.available_buffers(), POOL_SIZE);
}

#[test]
fn one_whole_frame_staged_per_write() {
    let link = Link::new(&LinkConfig::default());
    let mut hw = I2cSlave::new();
    let mut pump = BusPump::new(&LinkConfig::default());
    link.enqueue_request_with(0x11, "192.168.4.2").unwrap();
    link.enqueue_request(0x12).unwrap();

    hw.controller_write(&frame(0x0F, b""));
    settle(&mut pump, &link, &mut hw);
    assert_eq!(hw.controller_read_all(), frame(0x11, b"192.168.4.2"));
    assert_eq!(link.outbound_len(), 1);

    hw.controller_write(&frame(0x0A, b"{}"));
    settle(&mut pump, &link, &mut hw);
    assert_eq!(hw.controller_read_all(), frame(0x12, b""));
    assert_eq!(link.stats().sent, 2);
}

/// Loopback whose ring fills in bursts with empty reads in between, as the
/// driver's interrupt moves FIFO bytes.
struct BurstyI2c {
    inner: I2cSlave,
    pattern: Vec<usize>,
    reads: usize,
}

impl BusHardware for BurstyI2c {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> usize {
        let burst = self.pattern[self.reads % self.pattern.len()];
        self.reads += 1;
        let n = burst.min(buf.len());
        self.inner.read(&mut buf[..n], timeout_ms)
    }

    fn stage(&mut self, bytes: &[u8]) {
        self.inner.stage(bytes);
    }
}

#[test]
fn bursty_status_write_survives_empty_polls() {
    let link = Link::new(&LinkConfig::default());
    let doc = br#"{"mounted":"a-rather-long-image-name.iso","ready":true}"#.repeat(4);
    let mut hw = BurstyI2c {
        inner: I2cSlave::new(),
        pattern: vec![32, 0, 16, 0],
        reads: 0,
    };
    let mut pump = BusPump::new(&LinkConfig::default());

    hw.inner.controller_write(&frame(0x0A, &doc));
    hw.inner.controller_write(&frame(0x0B, b"{}"));
    settle(&mut pump, &link, &mut hw);

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Status(doc), Delivered::Image(b"{}".to_vec())]);
    assert_eq!(link.stats().abandoned, 0);
    assert_eq!(hw.inner.controller_read_all(), vec![NOOP]);
}

#[test]
fn request_queued_while_write_settles_is_staged_whole() {
    let link = Link::new(&LinkConfig::default());
    let mut hw = I2cSlave::new();
    let mut pump = BusPump::new(&LinkConfig::default());

    hw.controller_write(&frame(0x0F, b""));
    assert!(pump.step(&link, &mut hw));
    link.enqueue_request_with(0x11, "192.168.4.2").unwrap();
    settle(&mut pump, &link, &mut hw);

    assert_eq!(hw.controller_read_all(), frame(0x11, b"192.168.4.2"));
    assert_eq!(link.outbound_len(), 0);
}
