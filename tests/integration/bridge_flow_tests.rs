//! End-to-end bridge flow: credentials over the bus, Wi-Fi bring-up, HTTP
//! routes and link loss, with the controller scripted byte by byte.

use ctrlbridge::adapters::wifi::WifiAdapter;
use ctrlbridge::app::images::ImageCacheState;
use ctrlbridge::app::routes::WAIT_BODY;
use ctrlbridge::app::service::{BridgeService, BridgeState, PollOutcome};
use ctrlbridge::config::{BridgeConfig, LinkConfig};
use ctrlbridge::drivers::indicator::Indicator;
use ctrlbridge::drivers::reboot::Rebooter;
use ctrlbridge::link::Link;
use ctrlbridge::protocol::{ClientRequest, ControllerCommand};

use crate::mock_bus::{Controller, MemPin};

struct Rig {
    wifi: WifiAdapter,
    led: Indicator<MemPin>,
    reboot: Rebooter,
}

impl Rig {
    fn new() -> Self {
        Self {
            wifi: WifiAdapter::new(),
            led: Indicator::new(MemPin::default()),
            reboot: Rebooter::new(),
        }
    }
}

fn config() -> BridgeConfig {
    BridgeConfig {
        fallback_ssid: heapless::String::new(),
        fallback_password: heapless::String::new(),
        ..BridgeConfig::default()
    }
}

fn poll<'r>(svc: &mut BridgeService<'r, Link>, link: &Link, rig: &mut Rig) -> PollOutcome {
    svc.poll(link, &mut rig.wifi, &mut rig.led, &mut rig.reboot).unwrap()
}

fn expect_request(ctl: &mut Controller, link: &Link, request: ClientRequest) -> Vec<u8> {
    let f = ctl.read_frame(link).expect("a queued request");
    assert_eq!(f.command, request.id(), "unexpected request {:?}", f);
    f.payload
}

/// Run the service from power-on to `Normal`.
fn bring_up<'r>(
    svc: &mut BridgeService<'r, Link>,
    link: &'r Link,
    ctl: &mut Controller,
    rig: &mut Rig,
) {
    svc.start().unwrap();
    expect_request(ctl, link, ClientRequest::FetchSsid);

    ctl.send(link, ControllerCommand::Ssid as u8, b"workshop\0");
    poll(svc, link, rig);
    assert_eq!(svc.state(), BridgeState::WaitingForPassword);
    expect_request(ctl, link, ClientRequest::FetchSsidPassword);

    ctl.send(link, ControllerCommand::SsidPassword as u8, b"correct-horse");
    poll(svc, link, rig);
    assert_eq!(svc.state(), BridgeState::WifiInit);
    expect_request(ctl, link, ClientRequest::SubscribeStatusJson);

    assert_eq!(poll(svc, link, rig), PollOutcome::Continue);
    assert_eq!(svc.state(), BridgeState::WifiDown);
    assert_eq!(poll(svc, link, rig), PollOutcome::StartHttp);
    assert_eq!(svc.state(), BridgeState::Normal);
}

#[test]
fn power_on_to_ready() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());

    bring_up(&mut svc, &link, &mut ctl, &mut rig);

    let ip = expect_request(&mut ctl, &link, ClientRequest::IpAddress);
    assert_eq!(ip, b"192.168.4.2");
    assert!(rig.led.is_lit());
    assert_eq!(svc.ssid(), "workshop");
    assert!(ctl.read_frame(&link).is_none());
}

#[test]
fn status_documents_are_served() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());
    bring_up(&mut svc, &link, &mut ctl, &mut rig);

    let doc = br#"{"mounted":"disk1.iso","ready":true}"#;
    ctl.send(&link, ControllerCommand::SystemStatusJson as u8, doc);
    poll(&mut svc, &link, &mut rig);
    assert_eq!(svc.serve("/status", None).as_deref(), Some(core::str::from_utf8(doc).unwrap()));
}

#[test]
fn image_listing_round_trip() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());
    bring_up(&mut svc, &link, &mut ctl, &mut rig);
    ctl.read_all(&link);

    assert_eq!(svc.serve("/images", None).as_deref(), Some(WAIT_BODY));
    expect_request(&mut ctl, &link, ClientRequest::FetchImagesJson);

    let image = ControllerCommand::ImageJson as u8;
    ctl.send(&link, image, br#"{"filename":"a.iso","size":1}"#);
    ctl.send(&link, image, br#"{"filename":"b.iso","size":2}"#);
    ctl.send(&link, image, b"");
    for _ in 0..3 {
        poll(&mut svc, &link, &mut rig);
    }

    assert_eq!(svc.images().state(), ImageCacheState::Full);
    let body = svc.serve("/images", None).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    assert_eq!(parsed[1]["filename"], "b.iso");
}

#[test]
fn mount_and_eject_reach_the_controller() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());
    bring_up(&mut svc, &link, &mut ctl, &mut rig);
    ctl.read_all(&link);

    svc.serve("/image", Some("imageName=My%20Game+%281%29.iso")).unwrap();
    svc.serve("/eject", None).unwrap();

    let name = expect_request(&mut ctl, &link, ClientRequest::LoadImage);
    assert_eq!(name, b"My Game (1).iso");
    expect_request(&mut ctl, &link, ClientRequest::EjectImage);
}

#[test]
fn link_loss_reports_and_reconnects() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());
    bring_up(&mut svc, &link, &mut ctl, &mut rig);
    ctl.read_all(&link);

    rig.wifi.sim_drop_link();
    poll(&mut svc, &link, &mut rig);
    assert_eq!(svc.state(), BridgeState::WifiInit);
    assert!(!rig.led.is_lit());
    expect_request(&mut ctl, &link, ClientRequest::NetworkDown);

    poll(&mut svc, &link, &mut rig);
    assert_eq!(poll(&mut svc, &link, &mut rig), PollOutcome::Continue);
    assert_eq!(svc.state(), BridgeState::Normal);
    expect_request(&mut ctl, &link, ClientRequest::IpAddress);
}

#[test]
fn reset_request_schedules_reboot() {
    let link = Link::new(&LinkConfig::default());
    let mut ctl = Controller::new();
    let mut rig = Rig::new();
    let mut svc = BridgeService::new(&link, config());
    svc.start().unwrap();

    ctl.send(&link, ControllerCommand::Reset as u8, b"");
    poll(&mut svc, &link, &mut rig);
    assert_eq!(rig.reboot.requested(), Some(BridgeConfig::default().reset_delay_ms));
}
