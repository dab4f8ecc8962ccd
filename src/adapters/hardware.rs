//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the actuator drivers, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets the
//! underlying pin handles are simulation stubs.

use crate::app::ports::{ActuatorPort, RainReading, SensorPort};
use crate::drivers::hw_init::{GpioOut, LedcChannel, LEDC_CH_PUMP};
use crate::drivers::light::LightDriver;
use crate::drivers::pump::PumpDriver;
use crate::pins;
use crate::sensors::SensorHub;

use super::wifi;

pub type BoardLight = LightDriver<GpioOut>;
pub type BoardPump = PumpDriver<GpioOut, GpioOut, LedcChannel>;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    light: BoardLight,
    pump: BoardPump,
}

impl HardwareAdapter {
    pub fn new(sensor_hub: SensorHub, light: BoardLight, pump: BoardPump) -> Self {
        Self {
            sensor_hub,
            light,
            pump,
        }
    }

    /// Everything on its board pin.  Requires `hw_init::init_peripherals()`.
    pub fn on_board_pins() -> Self {
        Self::new(
            SensorHub::default(),
            LightDriver::new(GpioOut(pins::LIGHT_GPIO)),
            PumpDriver::new(
                GpioOut(pins::PUMP_IN1_GPIO),
                GpioOut(pins::PUMP_IN2_GPIO),
                LedcChannel(LEDC_CH_PUMP),
            ),
        )
    }

    pub fn pump(&self) -> &BoardPump {
        &self.pump
    }

    pub fn light(&self) -> &BoardLight {
        &self.light
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_temperature_humidity(&mut self) -> Option<(f32, f32)> {
        self.sensor_hub.read_climate()
    }

    fn read_rain(&mut self) -> RainReading {
        self.sensor_hub.read_rain()
    }

    fn read_signal_strength(&mut self) -> i32 {
        wifi::station_rssi()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_light(&mut self, on: bool) {
        self.light.set(on);
    }

    fn set_pump_drive(&mut self, on: bool) {
        self.pump.set_drive(on);
    }

    fn set_pump_duty(&mut self, raw: u8) {
        self.pump.set_duty(raw);
    }
}
