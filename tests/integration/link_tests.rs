//! Framing engine behaviour seen from the bus: reassembly, draining,
//! abandonment, starvation and dispatch.

use ctrlbridge::config::LinkConfig;
use ctrlbridge::error::{LinkError, QueueKind};
use ctrlbridge::link::{Link, MAX_MSG_SIZE, NOOP, POOL_SIZE, QUEUE_DEPTH};

use crate::mock_bus::{Controller, Delivered, RecordingHandler, drain, frame};

fn link() -> Link {
    Link::new(&LinkConfig::default())
}

// ── Receive ───────────────────────────────────────────────────

#[test]
fn zero_length_frame_in_one_event() {
    let link = link();
    let mut ctl = Controller::new();
    ctl.write(&link, &[0x0A, 0x00, 0x00]);

    assert_eq!(link.inbound_len(), 1);
    assert!(!link.has_in_flight());

    let mut h = RecordingHandler::default();
    assert!(link.process_messages(&mut h));
    assert_eq!(h.delivered, vec![Delivered::Status(Vec::new())]);
}

#[test]
fn split_length_bytes_resume() {
    let link = link();
    let mut ctl = Controller::new();
    ctl.write(&link, &[0x0D]);
    ctl.write(&link, &[0x00]);
    assert!(link.has_in_flight());
    ctl.write(&link, &[0x04]);
    ctl.write(&link, b"home");

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Ssid(b"home".to_vec())]);
}

#[test]
fn byte_at_a_time_reassembly() {
    let link = link();
    let mut ctl = Controller::new();
    let payload: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
    let wire = frame(0x0B, &payload);
    ctl.write_split(&link, &wire, &vec![1; wire.len()]);

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Image(payload)]);
}

#[test]
fn several_frames_in_one_event_keep_order() {
    let link = link();
    let mut ctl = Controller::new();
    let mut wire = frame(0x0D, b"net");
    wire.extend(frame(0x0E, b"secret99"));
    wire.extend(frame(0x0F, b""));
    ctl.write(&link, &wire);

    let mut h = RecordingHandler::default();
    assert_eq!(drain(&link, &mut h), 3);
    assert_eq!(
        h.delivered,
        vec![
            Delivered::Ssid(b"net".to_vec()),
            Delivered::Password(b"secret99".to_vec()),
            Delivered::Reset,
        ]
    );
}

#[test]
fn maximum_size_payload() {
    let link = link();
    let mut ctl = Controller::new();
    let payload = vec![b'x'; MAX_MSG_SIZE];
    ctl.write_split(&link, &frame(0x0A, &payload), &[3, 1000, 500]);

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Status(payload)]);
}

#[test]
fn oversize_frame_is_skipped_and_next_frame_survives() {
    let link = link();
    let mut ctl = Controller::new();
    let declared = MAX_MSG_SIZE + 10;
    let mut wire = vec![0x0B];
    wire.extend_from_slice(&(declared as u16).to_be_bytes());
    wire.extend(std::iter::repeat_n(0xAA, declared));
    wire.extend(frame(0x0F, b""));
    ctl.write_split(&link, &wire, &[1000, 1000]);

    assert_eq!(link.stats().oversize_dropped, 1);
    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Reset]);
    assert_eq!(link.available_buffers(), POOL_SIZE);
}

// ── Abandonment ───────────────────────────────────────────────

#[test]
fn abandoned_receive_is_reset_and_reusable() {
    let link = link();
    let mut ctl = Controller::new();
    ctl.write(&link, &[0x0A, 0x00, 0x10, b'p', b'a', b'r']);
    assert!(link.has_in_flight());

    // The controller gives up on the write and reads instead.
    ctl.request(&link);
    assert!(!link.has_in_flight());
    assert_eq!(link.available_buffers(), POOL_SIZE);
    assert_eq!(link.stats().abandoned, 1);

    ctl.send(&link, 0x0D, b"fresh");
    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Ssid(b"fresh".to_vec())]);
}

// ── Pool exhaustion ───────────────────────────────────────────

#[test]
fn starvation_is_reported_and_recovers() {
    let link = link();
    let mut ctl = Controller::new();
    for i in 0..POOL_SIZE {
        ctl.send(&link, 0x0B, &[b'0' + i as u8]);
    }
    assert_eq!(link.available_buffers(), 0);
    assert_eq!(link.inbound_len(), POOL_SIZE);

    ctl.write(&link, &frame(0x0D, b"lost"));
    assert_eq!(link.stats().starved, 1);
    assert_eq!(link.inbound_len(), POOL_SIZE);
    ctl.finish(&link);

    // Reclaim one buffer; the next transaction succeeds.
    let mut h = RecordingHandler::default();
    assert!(link.process_messages(&mut h));
    assert_eq!(h.delivered, vec![Delivered::Image(b"0".to_vec())]);

    ctl.send(&link, 0x0D, b"kept");
    drain(&link, &mut h);
    assert_eq!(h.delivered.last(), Some(&Delivered::Ssid(b"kept".to_vec())));
    assert_eq!(link.available_buffers(), POOL_SIZE);
}

#[test]
fn receive_event_after_reclaim_succeeds_mid_transaction() {
    let link = link();
    let mut ctl = Controller::new();
    for _ in 0..POOL_SIZE {
        ctl.send(&link, 0x0F, b"");
    }
    let mut h = RecordingHandler::default();

    ctl.write(&link, &[0x0D, 0x00, 0x00]);
    assert_eq!(link.stats().starved, 1);

    // One buffer comes back before the controller ends its transaction.
    assert!(link.process_messages(&mut h));
    ctl.write(&link, &[0x0F, 0x00, 0x00]);
    ctl.finish(&link);

    assert_eq!(link.inbound_len(), POOL_SIZE);
    assert_eq!(link.stats().starved, 1);
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Reset; POOL_SIZE + 1]);
}

// ── Dispatch ──────────────────────────────────────────────────

#[test]
fn unknown_command_is_dropped_and_buffer_returned() {
    let link = link();
    let mut ctl = Controller::new();
    ctl.send(&link, 0x7E, b"??");

    let mut h = RecordingHandler::default();
    assert!(link.process_messages(&mut h));
    assert!(h.delivered.is_empty());
    assert_eq!(link.stats().unrecognized, 1);
    assert_eq!(link.available_buffers(), POOL_SIZE);
    assert!(!link.process_messages(&mut h));
}

// ── Transmit ──────────────────────────────────────────────────

#[test]
fn abc_request_takes_three_events() {
    let link = link();
    let mut ctl = Controller::new();
    link.enqueue_request_with(0x0B, "abc").unwrap();

    assert_eq!(ctl.request(&link), vec![0x0B]);
    assert_eq!(ctl.request(&link), vec![0x00, 0x03]);
    assert_eq!(ctl.request(&link), b"abc".to_vec());
    assert_eq!(link.outbound_len(), 0);
    assert_eq!(link.stats().sent, 1);
}

#[test]
fn empty_queue_answers_noop_every_time() {
    let link = link();
    let mut ctl = Controller::new();
    for _ in 0..3 {
        assert_eq!(ctl.request(&link), vec![NOOP]);
    }
    assert_eq!(link.stats().sent, 0);
}

#[test]
fn requests_drain_in_fifo_order() {
    let link = link();
    let mut ctl = Controller::new();
    link.enqueue_request(0x0E).unwrap();
    link.enqueue_request_with(0x11, "10.1.2.3").unwrap();
    link.enqueue_request(0x12).unwrap();

    let frames = ctl.read_all(&link);
    let order: Vec<u8> = frames.iter().map(|f| f.command).collect();
    assert_eq!(order, vec![0x0E, 0x11, 0x12]);
    assert_eq!(frames[1].payload, b"10.1.2.3");
}

#[test]
fn long_payload_uses_minimum_events() {
    let link = link();
    let mut ctl = Controller::new();
    let text = "0123456789abcdefghij"; // 20 bytes, 3 chunks of 8
    link.enqueue_request_with(0x0B, text).unwrap();

    let f = ctl.read_frame(&link).unwrap();
    assert_eq!(f.payload, text.as_bytes());
    assert_eq!(f.events, 2 + 3);
}

#[test]
fn configured_chunk_size_is_honoured() {
    let cfg = LinkConfig {
        tx_chunk_size: 32,
        ..LinkConfig::default()
    };
    let link = Link::new(&cfg);
    let mut ctl = Controller::new();
    let text = "x".repeat(100);
    link.enqueue_request_with(0x0B, &text).unwrap();

    let f = ctl.read_frame(&link).unwrap();
    assert_eq!(f.payload.len(), 100);
    assert_eq!(f.events, 2 + 4);
}

#[test]
fn partial_send_survives_an_interleaved_write() {
    let link = link();
    let mut ctl = Controller::new();
    link.enqueue_request_with(0x11, "192.168.0.10").unwrap();

    assert_eq!(ctl.request(&link), vec![0x11]);
    ctl.send(&link, 0x0A, b"{}");
    assert_eq!(ctl.request(&link), vec![0x00, 0x0C]);
    assert_eq!(ctl.request(&link), b"192.168.".to_vec());
    assert_eq!(ctl.request(&link), b"0.10".to_vec());

    let mut h = RecordingHandler::default();
    drain(&link, &mut h);
    assert_eq!(h.delivered, vec![Delivered::Status(b"{}".to_vec())]);
}

#[test]
fn outbound_overflow_is_reported() {
    let link = link();
    for _ in 0..QUEUE_DEPTH {
        link.enqueue_request(0x0C).unwrap();
    }
    assert_eq!(link.enqueue_request(0x0C), Err(LinkError::QueueFull(QueueKind::Outbound)));
    assert_eq!(link.outbound_len(), QUEUE_DEPTH);
}

#[test]
fn overlong_request_text_is_truncated() {
    let link = link();
    let mut ctl = Controller::new();
    link.enqueue_request_with(0x0B, &"y".repeat(MAX_MSG_SIZE + 5)).unwrap();
    let f = ctl.read_frame(&link).unwrap();
    assert_eq!(f.payload.len(), MAX_MSG_SIZE);
}
