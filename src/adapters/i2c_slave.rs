//! I2C peripheral-mode driver adapter.
//!
//! Presents the ESP-IDF buffered I2C slave driver as [`BusHardware`] for the
//! bus pump. On host targets an in-memory loopback stands in for the
//! controller so the pump can be exercised end to end.

use crate::drivers::bus_pump::BusHardware;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::delay::TickType;
    use esp_idf_hal::gpio::{InputPin, OutputPin};
    use esp_idf_hal::i2c::{I2c, I2cSlaveConfig, I2cSlaveDriver};
    use esp_idf_hal::peripheral::Peripheral;
    use esp_idf_sys::EspError;
    use log::{info, warn};

    use super::BusHardware;
    use crate::config::LinkConfig;
    use crate::link::MAX_MSG_SIZE;

    pub struct I2cSlave {
        driver: I2cSlaveDriver<'static>,
    }

    impl I2cSlave {
        /// Claim the peripheral and listen on `config.address`.
        pub fn new<I: I2c>(
            i2c: impl Peripheral<P = I> + 'static,
            sda: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
            scl: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
            config: &LinkConfig,
        ) -> Result<Self, EspError> {
            let hw_config = I2cSlaveConfig::new()
                .rx_buffer_length(MAX_MSG_SIZE + 3)
                .tx_buffer_length(MAX_MSG_SIZE + 3);
            let driver = I2cSlaveDriver::new(i2c, sda, scl, config.address, &hw_config)?;
            info!(
                "i2c: peripheral at 0x{:02X} (sda={}, scl={})",
                config.address, config.sda_pin, config.scl_pin
            );
            Ok(Self { driver })
        }
    }

    impl BusHardware for I2cSlave {
        fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> usize {
            let ticks = TickType::new_millis(u64::from(timeout_ms)).ticks();
            // A timeout is the idle case, not an error.
            self.driver.read(buf, ticks).unwrap_or(0)
        }

        fn stage(&mut self, bytes: &[u8]) {
            match self.driver.write(bytes, 0) {
                Ok(n) if n == bytes.len() => {}
                Ok(n) => warn!("i2c: staged {} of {} bytes", n, bytes.len()),
                Err(e) => warn!("i2c: stage failed: {}", e),
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::I2cSlave;

/// In-memory loopback standing in for the controller.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct I2cSlave {
    rx: std::collections::VecDeque<u8>,
    tx: Vec<u8>,
    tx_limit: Option<usize>,
}

#[cfg(not(target_os = "espidf"))]
impl I2cSlave {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the transmit buffer, as the hardware ring is bounded.
    pub fn with_tx_limit(limit: usize) -> Self {
        Self {
            tx_limit: Some(limit),
            ..Self::default()
        }
    }

    /// The controller writes `bytes`.
    pub fn controller_write(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// The controller reads everything staged so far.
    pub fn controller_read_all(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

#[cfg(not(target_os = "espidf"))]
impl BusHardware for I2cSlave {
    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, b) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = b;
        }
        n
    }

    fn stage(&mut self, bytes: &[u8]) {
        let room = self.tx_limit.map_or(bytes.len(), |l| l.saturating_sub(self.tx.len()));
        let n = room.min(bytes.len());
        if n < bytes.len() {
            log::warn!("i2c(sim): staged {} of {} bytes", n, bytes.len());
        }
        self.tx.extend_from_slice(&bytes[..n]);
    }
}
