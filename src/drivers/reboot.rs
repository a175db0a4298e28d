//! Delayed device restart.
//!
//! On ESP-IDF the restart runs on a short-lived thread so the main loop
//! keeps serving the bus until the delay expires. On host targets the
//! request is only logged and recorded.

use log::info;

use crate::app::ports::RebootPort;

#[derive(Default)]
pub struct Rebooter {
    /// Delay of the last request (host only).
    #[cfg(not(target_os = "espidf"))]
    requested: Option<u32>,
}

impl Rebooter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn requested(&self) -> Option<u32> {
        self.requested
    }
}

impl RebootPort for Rebooter {
    #[cfg(target_os = "espidf")]
    fn reboot_after(&mut self, delay_ms: u32) {
        info!("reboot: restarting in {} ms", delay_ms);
        let delay = std::time::Duration::from_millis(u64::from(delay_ms));
        let spawned = std::thread::Builder::new().name("reboot".into()).spawn(move || {
            std::thread::sleep(delay);
            esp_idf_svc::hal::reset::restart();
        });
        if let Err(e) = spawned {
            log::error!("reboot: delay thread failed ({}), restarting now", e);
            esp_idf_svc::hal::reset::restart();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn reboot_after(&mut self, delay_ms: u32) {
        info!("reboot(sim): restart requested in {} ms", delay_ms);
        self.requested = Some(delay_ms);
    }
}
