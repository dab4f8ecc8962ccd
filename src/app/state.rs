//! Canonical actuator state and its wire document.
//!
//! [`DeviceState`] is owned by the [`AppService`](super::service::AppService)
//! and only ever replaced by the command processor.  Pump speed is stored as
//! a percentage; [`duty_from_percent`] converts to the 8-bit PWM scale at the
//! actuation boundary.

use serde::{Deserialize, Serialize};

/// Highest raw PWM duty accepted by the pump driver (8-bit LEDC).
pub const MAX_PUMP_DUTY: u8 = 255;

/// Canonical light/pump state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub light_on: bool,
    pub pump_on: bool,
    /// Always within 0–100.
    pub pump_speed_percent: u8,
}

impl Default for DeviceState {
    /// Power-on state: everything off, pump speed at full.
    fn default() -> Self {
        Self {
            light_on: false,
            pump_on: false,
            pump_speed_percent: 100,
        }
    }
}

impl DeviceState {
    /// Raw duty the pump should currently be driven at.
    pub fn pump_duty(&self) -> u8 {
        if self.pump_on {
            duty_from_percent(self.pump_speed_percent)
        } else {
            0
        }
    }

    /// Build the `device/state` document.
    pub fn to_document(&self, rssi: i32, timestamp_ms: u64) -> DeviceStateDoc {
        DeviceStateDoc {
            light: OnOff::from(self.light_on),
            pump: OnOff::from(self.pump_on),
            pump_speed: self.pump_speed_percent,
            rssi: Some(rssi),
            timestamp: Some(timestamp_ms),
        }
    }
}

/// Convert a 0–100 percentage to the 0–255 PWM duty, rounding to nearest.
pub fn duty_from_percent(percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    ((percent * u32::from(MAX_PUMP_DUTY) + 50) / 100) as u8
}

// ---------------------------------------------------------------------------
// Wire document
// ---------------------------------------------------------------------------

/// `"on"` / `"off"` as used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

impl From<bool> for OnOff {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl From<OnOff> for bool {
    fn from(v: OnOff) -> Self {
        v == OnOff::On
    }
}

/// Retained `device/state` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStateDoc {
    pub light: OnOff,
    pub pump: OnOff,
    #[serde(rename = "pumpSpeed")]
    pub pump_speed: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl From<&DeviceStateDoc> for DeviceState {
    fn from(doc: &DeviceStateDoc) -> Self {
        Self {
            light_on: doc.light.into(),
            pump_on: doc.pump.into(),
            pump_speed_percent: doc.pump_speed.min(100),
        }
    }
}
