//! Sensor telemetry samples and the outbound JSON documents.

use serde::Serialize;

use super::ports::SensorPort;

/// One sensor sweep, ephemeral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub temperature_c: Option<f32>,
    pub humidity_percent: Option<f32>,
    pub rain_analog: u16,
    pub is_raining: bool,
    pub signal_strength_dbm: i32,
    pub timestamp_ms: u64,
}

impl TelemetrySample {
    /// Read every sensor once.
    pub fn capture(sensors: &mut impl SensorPort, now_ms: u64) -> Self {
        let climate = sensors.read_temperature_humidity();
        let rain = sensors.read_rain();
        Self {
            temperature_c: climate.map(|(t, _)| t).filter(|t| t.is_finite()),
            humidity_percent: climate.map(|(_, h)| h).filter(|h| h.is_finite()),
            rain_analog: rain.analog,
            is_raining: rain.raining,
            signal_strength_dbm: sensors.read_signal_strength(),
            timestamp_ms: now_ms,
        }
    }

    pub fn to_document(&self) -> TelemetryDoc {
        TelemetryDoc {
            temperature: self.temperature_c.map(round_tenth),
            humidity: self.humidity_percent.map(round_tenth),
            rain_analog: self.rain_analog,
            rain_digital: u8::from(!self.is_raining),
            is_raining: self.is_raining,
            rssi: self.signal_strength_dbm,
            timestamp: self.timestamp_ms,
        }
    }
}

fn round_tenth(v: f32) -> f64 {
    (f64::from(v) * 10.0).round() / 10.0
}

/// `sensor/state` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    pub rain_analog: u16,
    /// Raw detector level: 0 = wet, 1 = dry.
    pub rain_digital: u8,
    pub is_raining: bool,
    pub rssi: i32,
    pub timestamp: u64,
}

/// `sys/online` payload.  The last-will variant carries identity only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementDoc<'a> {
    pub online: bool,
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    pub firmware: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}
