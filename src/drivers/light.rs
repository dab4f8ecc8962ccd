//! Grow-light driver: a single digital output, HIGH = on.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct LightDriver<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> LightDriver<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    pub fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            warn!("Light: GPIO write failed");
            return;
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
