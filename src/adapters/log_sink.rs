//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | light={} pump={} speed={}%", state.light_on, state.pump_on, state.pump_speed_percent);
            }
            AppEvent::PhaseChanged { layer, from, to } => {
                info!("LINK  | {} {:?} -> {:?}", layer.name(), from, to);
            }
            AppEvent::LinkAttemptFailed(e) => {
                warn!("LINK  | bring-up failed: {}", e);
            }
            AppEvent::SessionAttemptFailed(e) => {
                warn!("SESS  | attempt failed: {}", e);
            }
            AppEvent::CommandApplied(state) => {
                info!(
                    "CMD   | light={} pump={} speed={}% duty={}",
                    state.light_on,
                    state.pump_on,
                    state.pump_speed_percent,
                    state.pump_duty()
                );
            }
            AppEvent::CommandRejected(e) => {
                warn!("CMD   | rejected: {}", e);
            }
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | T={} H={} | rain={} ({}) | rssi={}dBm",
                    t.temperature_c
                        .map_or_else(|| "n/a".to_string(), |v| format!("{:.1}\u{00b0}C", v)),
                    t.humidity_percent
                        .map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v)),
                    t.rain_analog,
                    if t.is_raining { "WET" } else { "DRY" },
                    t.signal_strength_dbm,
                );
            }
            AppEvent::Heartbeat(state) => {
                info!("BEAT  | light={} pump={} speed={}%", state.light_on, state.pump_on, state.pump_speed_percent);
            }
            AppEvent::PublishFailed { channel, error } => {
                warn!("PUB   | {:?}: {}", channel, error);
            }
        }
    }
}
