//! MQTT session adapter.
//!
//! Implements [`SessionPort`] on top of the ESP-IDF MQTT client.  The
//! client runs its own task; its event callback only flips a connected
//! flag and queues complete deliveries, which the main loop drains through
//! [`next_message`](SessionPort::next_message).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-memory broker stand-in for host tests.

use std::collections::VecDeque;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};

use crate::app::commands::MAX_COMMAND_BYTES;
use crate::app::ports::{InboundMessage, SessionOptions, SessionPort};
use crate::error::SessionError;

/// Deliveries held between polls.  Older entries are dropped first.
const INBOX_CAPACITY: usize = 8;

/// Append to a bounded inbox, discarding the oldest entry when full.
fn enqueue(inbox: &mut VecDeque<InboundMessage>, message: InboundMessage) {
    if inbox.len() >= INBOX_CAPACITY {
        if let Some(dropped) = inbox.pop_front() {
            warn!("MQTT: inbox full, dropping delivery on {}", dropped.topic);
        }
    }
    inbox.push_back(message);
}

/// Whether a delivery is small enough to hand to the command decoder.
fn accept_payload(topic: &str, len: usize) -> bool {
    if len > MAX_COMMAND_BYTES {
        warn!("MQTT: dropping oversized payload on {} ({} bytes)", topic, len);
        return false;
    }
    true
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    url: String,
    client: Option<EspMqttClient<'static>>,
    connected: Arc<AtomicBool>,
    inbox: Arc<Mutex<VecDeque<InboundMessage>>>,
    /// Drained from the shared inbox on `poll`.
    pending: VecDeque<InboundMessage>,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            url: format!("mqtt://{}:{}", host, port),
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            inbox: Arc::new(Mutex::new(VecDeque::new())),
            pending: VecDeque::new(),
        }
    }

    fn client(&mut self) -> Result<&mut EspMqttClient<'static>, SessionError> {
        self.client.as_mut().ok_or(SessionError::NotConnected)
    }
}

#[cfg(target_os = "espidf")]
impl SessionPort for MqttAdapter {
    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError> {
        use esp_idf_hal::delay::FreeRtos;
        use std::time::Duration;

        // A fresh client per attempt; the old one stops its task on drop.
        self.client = None;
        self.connected.store(false, Ordering::Relaxed);

        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: options.username,
            password: options.password,
            keep_alive_interval: Some(Duration::from_secs(u64::from(options.keep_alive_secs))),
            network_timeout: Duration::from_secs(u64::from(options.timeout_secs)),
            lwt: options.will.map(|will| LwtConfiguration {
                topic: will.topic,
                payload: will.payload,
                qos: QoS::AtLeastOnce,
                retain: will.retain,
            }),
            ..Default::default()
        };

        let connected = Arc::clone(&self.connected);
        let inbox = Arc::clone(&self.inbox);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => connected.store(true, Ordering::Relaxed),
            EventPayload::Disconnected => connected.store(false, Ordering::Relaxed),
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => {
                if !accept_payload(topic, data.len()) {
                    return;
                }
                if let Ok(mut queue) = inbox.lock() {
                    enqueue(
                        &mut queue,
                        InboundMessage {
                            topic: topic.to_string(),
                            payload: data.to_vec(),
                        },
                    );
                }
            }
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        })
        .map_err(|e| SessionError::ConnectFailed(e.code()))?;
        self.client = Some(client);

        let deadline_ms = u32::from(options.timeout_secs.max(1)) * 1_000;
        let mut waited_ms = 0;
        while !self.connected.load(Ordering::Relaxed) {
            if waited_ms >= deadline_ms {
                self.client = None;
                return Err(SessionError::ConnectFailed(-1));
            }
            FreeRtos::delay_ms(50);
            waited_ms += 50;
        }
        info!("MQTT: connected to {} as {}", self.url, options.client_id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Relaxed)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        self.client()?
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: subscribe {} failed: {}", topic, e);
                SessionError::SubscribeFailed
            })
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.client()?
            .enqueue(topic, QoS::AtMostOnce, retain, payload)
            .map(|_| debug!("MQTT: queued {} bytes on {}", payload.len(), topic))
            .map_err(|e| {
                warn!("MQTT: publish {} failed: {}", topic, e);
                SessionError::PublishFailed
            })
    }

    fn poll(&mut self) {
        if let Ok(mut queue) = self.inbox.lock() {
            self.pending.extend(queue.drain(..));
        }
    }

    fn next_message(&mut self) -> Option<InboundMessage> {
        self.pending.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// One publish captured by the simulated broker.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPublish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    url: String,
    connected: bool,
    subscriptions: Vec<String>,
    published: Vec<SimPublish>,
    inbox: VecDeque<InboundMessage>,
    pending: VecDeque<InboundMessage>,
    /// Last will registered by the most recent `connect`.
    will: Option<SimPublish>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            url: format!("mqtt://{}:{}", host, port),
            connected: false,
            subscriptions: Vec::new(),
            published: Vec::new(),
            inbox: VecDeque::new(),
            pending: VecDeque::new(),
            will: None,
        }
    }

    /// Simulation: the broker delivers `payload` on `topic` if subscribed.
    pub fn inject(&mut self, topic: &str, payload: &[u8]) {
        if !self.connected || !self.subscriptions.iter().any(|s| s == topic) {
            debug!("MQTT(sim): no subscriber for {}", topic);
            return;
        }
        if accept_payload(topic, payload.len()) {
            enqueue(
                &mut self.inbox,
                InboundMessage {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                },
            );
        }
    }

    /// Simulation: the broker drops the session and fires the last will.
    pub fn sim_drop(&mut self) {
        self.connected = false;
        self.subscriptions.clear();
        if let Some(will) = self.will.clone() {
            self.published.push(will);
        }
    }

    /// Everything published so far, oldest first.
    pub fn published(&self) -> &[SimPublish] {
        &self.published
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(not(target_os = "espidf"))]
impl SessionPort for MqttAdapter {
    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError> {
        self.will = options.will.map(|w| SimPublish {
            topic: w.topic.to_string(),
            payload: w.payload.to_vec(),
            retain: w.retain,
        });
        self.subscriptions.clear();
        self.connected = true;
        info!("MQTT(sim): connected to {} as {}", self.url, options.client_id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::SubscribeFailed);
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.published.push(SimPublish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retain,
        });
        Ok(())
    }

    fn poll(&mut self) {
        self.pending.extend(self.inbox.drain(..));
    }

    fn next_message(&mut self) -> Option<InboundMessage> {
        self.pending.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
