//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`]: the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! Reconnection is driven by the bridge service: a failed attempt leaves
//! the radio up and the service simply calls [`NetworkPort::connect`] again.

use core::net::Ipv4Addr;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

use crate::app::ports::{NetworkError, NetworkPort};

// ───────────────────────────────────────────────────────────────
// Radio state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    /// Radio powered down.
    Off,
    /// Station mode up, not associated.
    Started,
    Connected(Ipv4Addr),
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() {
        return Err(NetworkError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(NetworkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetworkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(NetworkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: connect attempts left to fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
    /// Simulation: whether the associated link is still up.
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspError> {
        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), Some(nvs))?, sysloop)?;
        Ok(Self {
            state: WifiState::Off,
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Off,
            sim_failures: 0,
            sim_link_up: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), NetworkError> {
        let fail = |e: EspError| {
            log::error!("WiFi: start failed: {}", e);
            NetworkError::InitFailed
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(fail)?;
        self.wifi.start().map_err(fail)?;
        // Power save adds latency to every HTTP request.
        let no_power_save = esp_idf_svc::sys::wifi_ps_type_t_WIFI_PS_NONE;
        // SAFETY: plain FFI call after the driver has started.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_set_ps(no_power_save) };
        if ret != esp_idf_svc::sys::ESP_OK {
            warn!("WiFi: power save not disabled ({})", ret);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), NetworkError> {
        info!("WiFi(sim): radio up");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<Ipv4Addr, NetworkError> {
        let fail = |e: EspError| {
            warn!("WiFi: connect failed: {}", e);
            NetworkError::ConnectFailed
        };
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| NetworkError::InvalidSsid)?,
            password: password.try_into().map_err(|_| NetworkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        self.wifi.set_configuration(&Configuration::Client(config)).map_err(fail)?;

        let timeout = Some(core::time::Duration::from_millis(u64::from(timeout_ms)));
        let joined = self
            .wifi
            .wifi_mut()
            .connect()
            .and_then(|()| {
                self.wifi
                    .wifi_wait_while(|| self.wifi.is_connected().map(|c| !c), timeout)
            })
            .and_then(|()| self.wifi.ip_wait_while(|| self.wifi.is_up().map(|up| !up), timeout))
            .and_then(|()| self.wifi.wifi().sta_netif().get_ip_info());

        match joined {
            Ok(info) => Ok(Ipv4Addr::from(info.ip.octets())),
            Err(e) => {
                if let Err(e) = self.wifi.disconnect() {
                    warn!("WiFi: disconnect after failed attempt: {}", e);
                }
                Err(fail(e))
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(
        &mut self,
        ssid: &str,
        _password: &str,
        _timeout_ms: u32,
    ) -> Result<Ipv4Addr, NetworkError> {
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            warn!("WiFi(sim): simulated association failure for '{}'", ssid);
            return Err(NetworkError::ConnectFailed);
        }
        self.sim_link_up = true;
        Ok(Ipv4Addr::new(192, 168, 4, 2))
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        if let Err(e) = self.wifi.stop() {
            warn!("WiFi: stop failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        self.sim_link_up = false;
        info!("WiFi(sim): radio down");
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.sim_link_up
    }

    // ── Simulation controls ───────────────────────────────────

    /// Fail the next `n` connect attempts.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_failures = n;
    }

    /// Drop the association as if the access point went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link_up = false;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn init(&mut self) -> Result<(), NetworkError> {
        if self.state != WifiState::Off {
            warn!("WiFi: init while already up, ignoring");
            return Ok(());
        }
        self.platform_start()?;
        self.state = WifiState::Started;
        info!("WiFi: station mode up");
        Ok(())
    }

    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<Ipv4Addr, NetworkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        if self.state == WifiState::Off {
            return Err(NetworkError::ConnectFailed);
        }

        info!("WiFi: connecting to '{}' ({} ms timeout)", ssid, timeout_ms);
        let ip = self.platform_connect(ssid, password, timeout_ms)?;
        self.state = WifiState::Connected(ip);
        info!("WiFi: connected, address {}", ip);
        Ok(ip)
    }

    fn is_link_up(&self) -> bool {
        matches!(self.state, WifiState::Connected(_)) && self.platform_link_up()
    }

    fn deinit(&mut self) {
        self.platform_stop();
        self.state = WifiState::Off;
        info!("WiFi: radio down");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
