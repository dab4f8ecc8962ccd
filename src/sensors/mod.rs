//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].

pub mod dht22;
pub mod rain;

use log::warn;

use crate::app::ports::RainReading;
use crate::drivers::hw_init::{AdcChannel, GpioIn, MicroDelay, OpenDrainPin};
use crate::pins;
use dht22::Dht22;
use rain::RainSensor;

pub type ClimateProbe = Dht22<OpenDrainPin, MicroDelay>;
pub type RainDetector = RainSensor<GpioIn, AdcChannel>;

/// Owns every sensor driver.
pub struct SensorHub {
    pub climate: ClimateProbe,
    pub rain: RainDetector,
    /// Consecutive failed climate conversions (reset on success).
    climate_failures: u32,
}

impl Default for SensorHub {
    /// Drivers on the board pins.  Requires `hw_init::init_peripherals()`.
    fn default() -> Self {
        Self::new(
            Dht22::new(OpenDrainPin(pins::DHT22_GPIO), MicroDelay),
            RainSensor::new(
                GpioIn(pins::RAIN_DO_GPIO),
                AdcChannel::new(pins::RAIN_AO_ADC2_CHANNEL),
            ),
        )
    }
}

impl SensorHub {
    pub fn new(climate: ClimateProbe, rain: RainDetector) -> Self {
        Self {
            climate,
            rain,
            climate_failures: 0,
        }
    }

    /// Temperature and humidity, or `None` when the probe failed.
    ///
    /// A failed read is logged and the field is omitted upstream; a single
    /// flaky conversion must not stall the loop.
    pub fn read_climate(&mut self) -> Option<(f32, f32)> {
        match self.climate.read() {
            Ok(reading) => {
                self.climate_failures = 0;
                Some(reading)
            }
            Err(e) => {
                self.climate_failures = self.climate_failures.saturating_add(1);
                warn!("DHT22: read failed ({}), {} in a row", e, self.climate_failures);
                None
            }
        }
    }

    pub fn read_rain(&mut self) -> RainReading {
        self.rain.read()
    }

    pub fn climate_failures(&self) -> u32 {
        self.climate_failures
    }
}
