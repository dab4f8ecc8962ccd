//! Outbound publishing: serialises documents and pushes them through the
//! session port.  Failures are logged and surfaced as events; they never
//! abort the caller.

use log::warn;

use crate::config::Topics;
use crate::error::SessionError;

use super::events::{AppEvent, Channel};
use super::ports::{EventSink, SessionPort};
use super::state::DeviceState;
use super::telemetry::{AnnouncementDoc, TelemetrySample};

/// Knows the channel names and node identity.
#[derive(Debug, Clone)]
pub struct Reporter {
    topics: Topics,
    device_id: String,
    firmware_version: String,
}

impl Reporter {
    pub fn new(topics: Topics, device_id: &str, firmware_version: &str) -> Self {
        Self {
            topics,
            device_id: device_id.to_string(),
            firmware_version: firmware_version.to_string(),
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Retained `device/state`.
    pub fn publish_state(
        &self,
        session: &mut impl SessionPort,
        state: &DeviceState,
        rssi: i32,
        now_ms: u64,
        sink: &mut dyn EventSink,
    ) -> bool {
        let doc = state.to_document(rssi, now_ms);
        self.send(session, Channel::DeviceState, &doc, true, sink)
    }

    /// Retained `sys/online` with `online=true`.
    pub fn publish_announcement(
        &self,
        session: &mut impl SessionPort,
        rssi: i32,
        now_ms: u64,
        sink: &mut dyn EventSink,
    ) -> bool {
        let doc = AnnouncementDoc {
            online: true,
            device_id: &self.device_id,
            firmware: &self.firmware_version,
            rssi: Some(rssi),
            timestamp: Some(now_ms),
        };
        self.send(session, Channel::SysOnline, &doc, true, sink)
    }

    /// Non-retained `sensor/state`.
    pub fn publish_telemetry(
        &self,
        session: &mut impl SessionPort,
        sample: &TelemetrySample,
        sink: &mut dyn EventSink,
    ) -> bool {
        self.send(session, Channel::SensorState, &sample.to_document(), false, sink)
    }

    /// Payload the broker publishes on `sys/online` if the session dies.
    pub fn last_will_payload(&self) -> Vec<u8> {
        let doc = AnnouncementDoc {
            online: false,
            device_id: &self.device_id,
            firmware: &self.firmware_version,
            rssi: None,
            timestamp: None,
        };
        serde_json::to_vec(&doc).unwrap_or_default()
    }

    fn topic(&self, channel: Channel) -> &str {
        match channel {
            Channel::SensorState => &self.topics.sensor_state,
            Channel::DeviceState => &self.topics.device_state,
            Channel::SysOnline => &self.topics.sys_online,
        }
    }

    fn send(
        &self,
        session: &mut impl SessionPort,
        channel: Channel,
        doc: &impl serde::Serialize,
        retain: bool,
        sink: &mut dyn EventSink,
    ) -> bool {
        let result = serde_json::to_vec(doc)
            .map_err(|_| SessionError::PublishFailed)
            .and_then(|payload| session.publish(self.topic(channel), &payload, retain));
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!("Reporter: publish to {} failed: {}", self.topic(channel), error);
                sink.emit(&AppEvent::PublishFailed { channel, error });
                false
            }
        }
    }
}
