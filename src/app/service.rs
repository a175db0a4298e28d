//! Bridge service: the hexagonal core.
//!
//! [`BridgeService`] owns the start-up state machine, the latest status
//! document and the image cache. Controller messages reach it through the
//! [`MessageHandler`] callbacks; everything it does to the outside world
//! goes through port traits passed in at call sites.
//!
//! ```text
//!  WaitingForSsid ──ssid──▶ WaitingForPassword ──password──▶ WifiInit
//!                                                            │    ▲
//!                                                  radio up  ▼    │ link lost
//!                                                     WifiDown ──▶ Normal
//!                                                          connected
//! ```

use log::{error, info, warn};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::link::{Link, MessageHandler};
use crate::protocol::ClientRequest;

use super::images::ImageCache;
use super::payload_text;
use super::ports::{IndicatorPort, NetworkPort, RebootPort, RequestPort};
use super::routes::{self, Response};

/// Start-up and connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    WaitingForSsid,
    WaitingForPassword,
    /// Credentials known; the radio has to be brought up.
    WifiInit,
    /// Radio up, station not associated.
    WifiDown,
    Normal,
}

/// What the caller should do after a [`BridgeService::poll`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    /// The station got its first address; start serving HTTP.
    StartHttp,
}

pub struct BridgeService<'r, R: RequestPort + ?Sized> {
    requests: &'r R,
    config: BridgeConfig,
    state: BridgeState,
    ssid: String,
    password: String,
    status: String,
    images: ImageCache,
    reboot_pending: bool,
    http_started: bool,
}

impl<'r, R: RequestPort + ?Sized> BridgeService<'r, R> {
    /// Construct the service. Nothing is requested until [`start`](Self::start).
    pub fn new(requests: &'r R, config: BridgeConfig) -> Self {
        Self {
            requests,
            config,
            state: BridgeState::WaitingForSsid,
            ssid: String::new(),
            password: String::new(),
            status: String::from("{}"),
            images: ImageCache::new(),
            reboot_pending: false,
            http_started: false,
        }
    }

    /// Ask the controller for the Wi-Fi SSID.
    pub fn start(&mut self) -> Result<()> {
        self.requests.request(ClientRequest::FetchSsid)?;
        info!("bridge: started, waiting for SSID");
        Ok(())
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// The latest status document pushed by the controller.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    // ── Main loop ─────────────────────────────────────────────

    /// Run one main-loop step.
    ///
    /// Only a radio that cannot be initialised is an error; a failed
    /// connection attempt is retried on the next call.
    pub fn poll<N, I, B>(
        &mut self,
        link: &Link,
        network: &mut N,
        indicator: &mut I,
        reboot: &mut B,
    ) -> Result<PollOutcome>
    where
        N: NetworkPort + ?Sized,
        I: IndicatorPort + ?Sized,
        B: RebootPort + ?Sized,
    {
        let mut outcome = PollOutcome::Continue;

        match self.state {
            BridgeState::WaitingForSsid | BridgeState::WaitingForPassword => {
                link.process_messages(self);
            }
            BridgeState::WifiInit => {
                if let Err(e) = network.init() {
                    error!("bridge: network init failed: {}", e);
                    return Err(e.into());
                }
                self.state = BridgeState::WifiDown;
            }
            BridgeState::WifiDown => {
                info!("bridge: connecting to '{}'", self.ssid);
                let timeout_ms = self.config.wifi_connect_timeout_ms;
                match network.connect(&self.ssid, &self.password, timeout_ms) {
                    Ok(ip) => {
                        info!("bridge: connected, address {}", ip);
                        let text = ip.to_string();
                        let reported = self.requests.request_with(ClientRequest::IpAddress, &text);
                        if let Err(e) = reported {
                            warn!("bridge: address not reported: {}", e);
                        }
                        if !self.http_started {
                            self.http_started = true;
                            outcome = PollOutcome::StartHttp;
                        }
                        indicator.set(true);
                        self.state = BridgeState::Normal;
                        info!("bridge: ready");
                    }
                    Err(e) => warn!("bridge: connect failed: {}", e),
                }
            }
            BridgeState::Normal => {
                link.process_messages(self);
                if !network.is_link_up() {
                    warn!("bridge: network link down");
                    self.state = BridgeState::WifiInit;
                    if let Err(e) = self.requests.request(ClientRequest::NetworkDown) {
                        warn!("bridge: link loss not reported: {}", e);
                    }
                    indicator.set(false);
                    network.deinit();
                }
            }
        }

        if self.reboot_pending {
            self.reboot_pending = false;
            reboot.reboot_after(self.config.reset_delay_ms);
        }

        Ok(outcome)
    }

    // ── HTTP ──────────────────────────────────────────────────

    /// Body for an HTTP request, or `None` for an unknown path.
    pub fn serve(&mut self, path: &str, query: Option<&str>) -> Option<String> {
        let body = match routes::resolve(path, query, &mut self.images, self.requests) {
            Response::Status => self.status.clone(),
            Response::Listing => self.images.listing().to_owned(),
            Response::Image(entry) => entry,
            other => other.static_body()?.to_owned(),
        };
        Some(body)
    }

    /// Pick the controller's value, or the compiled fallback when it sent none.
    fn credential(payload: &[u8], fallback: &str, what: &str) -> Option<String> {
        match payload_text(payload).filter(|s| !s.is_empty()) {
            Some(value) => {
                info!("bridge: using {} from the controller", what);
                Some(value.to_owned())
            }
            None if !fallback.is_empty() => {
                info!("bridge: using {} compiled into the firmware", what);
                Some(fallback.to_owned())
            }
            None => {
                warn!("bridge: no {} from the controller and none compiled in", what);
                None
            }
        }
    }
}

impl<R: RequestPort + ?Sized> MessageHandler for BridgeService<'_, R> {
    fn on_system_status(&mut self, payload: &[u8]) {
        match payload_text(payload) {
            Some(text) => {
                self.status.clear();
                self.status.push_str(text);
            }
            None => warn!("bridge: status document is not UTF-8, kept previous"),
        }
    }

    fn on_image(&mut self, payload: &[u8]) {
        self.images.on_image(payload);
    }

    fn on_ssid(&mut self, payload: &[u8]) {
        if let Some(ssid) = Self::credential(payload, &self.config.fallback_ssid, "SSID") {
            self.ssid = ssid;
        }
        if !self.ssid.is_empty() {
            if let Err(e) = self.requests.request(ClientRequest::FetchSsidPassword) {
                warn!("bridge: password request not queued: {}", e);
            }
            self.state = BridgeState::WaitingForPassword;
        }
    }

    fn on_password(&mut self, payload: &[u8]) {
        let fallback = &self.config.fallback_password;
        if let Some(password) = Self::credential(payload, fallback, "password") {
            self.password = password;
        }
        if !self.password.is_empty() {
            // Subscribe now so status flows as soon as the network is up.
            if let Err(e) = self.requests.request(ClientRequest::SubscribeStatusJson) {
                warn!("bridge: status subscription not queued: {}", e);
            }
            self.state = BridgeState::WifiInit;
        }
    }

    fn on_reset(&mut self) {
        info!("bridge: reset requested by the controller");
        self.reboot_pending = true;
    }
}
