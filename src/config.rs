//! System configuration parameters
//!
//! Bus wiring for the framing link plus the bridge application's tunables.

use serde::{Deserialize, Serialize};

use crate::link::{DEFAULT_TX_CHUNK, MAX_MSG_SIZE};

/// Peripheral bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Data line GPIO
    pub sda_pin: u8,
    /// Clock line GPIO
    pub scl_pin: u8,
    /// 7-bit peripheral address
    pub address: u8,
    /// Bus clock (Hz)
    pub baud_rate: u32,
    /// Payload bytes written per controller read event
    pub tx_chunk_size: u16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sda_pin: crate::pins::BUS_SDA_GPIO,
            scl_pin: crate::pins::BUS_SCL_GPIO,
            address: 0x45,
            baud_rate: 100_000, // 100 kHz standard mode
            tx_chunk_size: DEFAULT_TX_CHUNK as u16,
        }
    }
}

impl LinkConfig {
    /// Reject settings the bus hardware cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(0x08..=0x77).contains(&self.address) {
            return Err("address outside the unreserved 7-bit range");
        }
        if self.baud_rate == 0 {
            return Err("baud rate must be non-zero");
        }
        if self.sda_pin == self.scl_pin {
            return Err("SDA and SCL must be different pins");
        }
        if self.tx_chunk_size == 0 || self.tx_chunk_size as usize > MAX_MSG_SIZE {
            return Err("tx chunk size out of range");
        }
        Ok(())
    }
}

/// Bridge application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// SSID used when the controller supplies none
    pub fallback_ssid: heapless::String<32>,
    /// Password used when the controller supplies none
    pub fallback_password: heapless::String<64>,
    /// Station connect timeout (milliseconds)
    pub wifi_connect_timeout_ms: u32,
    /// Delay between a reset request and the reboot (milliseconds)
    pub reset_delay_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fallback_ssid: compiled_credential(option_env!("WIFI_SSID")),
            fallback_password: compiled_credential(option_env!("WIFI_PASSWORD")),
            wifi_connect_timeout_ms: 30_000,
            reset_delay_ms: 1_000,
        }
    }
}

/// Take a build-time credential, or nothing if it is unset or too long.
fn compiled_credential<const N: usize>(value: Option<&str>) -> heapless::String<N> {
    let mut s = heapless::String::new();
    if let Some(v) = value {
        if s.push_str(v).is_err() {
            log::warn!("config: compiled credential longer than {} bytes ignored", N);
            s.clear();
        }
    }
    s
}
