//! Single-LED "network up" indicator.
//!
//! ## Dual-target design
//!
//! Generic over an `embedded-hal` output pin: on ESP-IDF a `PinDriver`
//! for the LED GPIO, on host tests an in-memory pin. The last commanded
//! level is tracked so it can be read back without touching the pin.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;

pub struct Indicator<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> Indicator<P> {
    /// Take `pin` and drive it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("indicator: initial set_low failed");
        }
        Self { pin, lit: false }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> IndicatorPort for Indicator<P> {
    fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.lit = on,
            Err(_) => warn!("indicator: pin write failed"),
        }
    }
}
