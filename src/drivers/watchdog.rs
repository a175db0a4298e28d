//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main loop stops feeding it. The timeout has to
//! outlast the longest blocking step of the loop, which is a Wi-Fi connect
//! attempt.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Margin added on top of the longest blocking main-loop step.
pub const WATCHDOG_MARGIN_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT with `timeout_ms` and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain FFI calls with a fully initialised config; a
            // null task handle means the calling task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("watchdog: reconfigure returned {} (already configured?)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("watchdog: subscribed ({} ms timeout)", timeout_ms);
                } else {
                    log::warn!("watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("watchdog(sim): {} ms, no-op", timeout_ms);
            Self {}
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: only called from the subscribed task.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
