//! Mock adapters for integration tests.
//!
//! Records every actuator write, every publish and every connect attempt so
//! tests can assert on full histories without a radio or a broker.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use garden_node::app::events::AppEvent;
use garden_node::app::ports::{
    ActuatorPort, EventSink, InboundMessage, LinkPort, RainReading, SensorPort, SessionOptions,
    SessionPort,
};
use garden_node::app::service::AppService;
use garden_node::config::SystemConfig;
use garden_node::error::{LinkError, SessionError};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    SetLight(bool),
    SetPumpDrive(bool),
    SetPumpDuty(u8),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub climate: Option<(f32, f32)>,
    pub rain: RainReading,
    pub rssi: i32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            climate: Some((22.0, 55.0)),
            rain: RainReading {
                analog: 4095,
                raining: false,
            },
            rssi: -61,
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature_humidity(&mut self) -> Option<(f32, f32)> {
        self.climate
    }

    fn read_rain(&mut self) -> RainReading {
        self.rain
    }

    fn read_signal_strength(&mut self) -> i32 {
        self.rssi
    }
}

impl ActuatorPort for MockHardware {
    fn set_light(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetLight(on));
    }

    fn set_pump_drive(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetPumpDrive(on));
    }

    fn set_pump_duty(&mut self, raw: u8) {
        self.calls.push(ActuatorCall::SetPumpDuty(raw));
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// Associates on `begin` while `reachable`.
pub struct MockLink {
    pub reachable: bool,
    pub associated: bool,
    pub begin_calls: u32,
    pub disconnect_calls: u32,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            associated: false,
            begin_calls: 0,
            disconnect_calls: 0,
        }
    }

    /// The access point vanishes without notice.
    pub fn lose_association(&mut self) {
        self.associated = false;
    }
}

impl LinkPort for MockLink {
    fn begin(&mut self) -> Result<(), LinkError> {
        self.begin_calls += 1;
        if self.reachable {
            self.associated = true;
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnect_calls += 1;
        self.associated = false;
    }

    fn is_connected(&self) -> bool {
        self.associated
    }
}

// ── MockSession ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

#[allow(dead_code)]
impl Published {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Snapshot of the options handed to the last `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub will_topic: Option<String>,
    pub will_payload: Option<Vec<u8>>,
    pub will_retain: bool,
}

pub struct MockSession {
    pub accept: bool,
    pub connected: bool,
    pub fail_publish: bool,
    pub connects: Vec<ConnectRecord>,
    pub subscriptions: Vec<String>,
    pub published: Vec<Published>,
    pub polls: u32,
    inbox: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockSession {
    pub fn new() -> Self {
        Self {
            accept: true,
            connected: false,
            fail_publish: false,
            connects: Vec::new(),
            subscriptions: Vec::new(),
            published: Vec::new(),
            polls: 0,
            inbox: VecDeque::new(),
        }
    }

    /// Queue a broker delivery.
    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        self.inbox.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    /// The broker drops the connection.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }

    /// Deliveries not yet consumed by the service.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<&Published> {
        self.published.iter().filter(|p| p.topic == topic).collect()
    }

    pub fn topics(&self) -> Vec<&str> {
        self.published.iter().map(|p| p.topic.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPort for MockSession {
    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError> {
        self.connects.push(ConnectRecord {
            client_id: options.client_id.to_string(),
            username: options.username.map(str::to_string),
            password: options.password.map(str::to_string),
            will_topic: options.will.map(|w| w.topic.to_string()),
            will_payload: options.will.map(|w| w.payload.to_vec()),
            will_retain: options.will.is_some_and(|w| w.retain),
        });
        if !self.accept {
            return Err(SessionError::ConnectFailed(-2));
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        if self.fail_publish {
            return Err(SessionError::PublishFailed);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retain,
        });
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }

    fn next_message(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}

// ── FakeDelay ─────────────────────────────────────────────────

/// Accumulates requested waits instead of sleeping.
#[derive(Debug, Default)]
pub struct FakeDelay {
    pub total_ns: u64,
}

#[allow(dead_code)]
impl FakeDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: service + mocks + fake clock ─────────────────────────

pub const CMD_TOPIC: &str = "demo/garden/device/cmd";
pub const DEVICE_STATE_TOPIC: &str = "demo/garden/device/state";
pub const SENSOR_STATE_TOPIC: &str = "demo/garden/sensor/state";
pub const SYS_ONLINE_TOPIC: &str = "demo/garden/sys/online";

pub struct Rig {
    pub app: AppService,
    pub link: MockLink,
    pub session: MockSession,
    pub hw: MockHardware,
    pub delay: FakeDelay,
    pub sink: RecordingSink,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig, link_reachable: bool) -> Self {
        Self {
            app: AppService::new(config, "garden_cafe").unwrap(),
            link: MockLink::new(link_reachable),
            session: MockSession::new(),
            hw: MockHardware::new(),
            delay: FakeDelay::default(),
            sink: RecordingSink::default(),
            now_ms: 0,
        }
    }

    /// Default configuration, reachable network, started at t=0.
    pub fn started() -> Self {
        let mut rig = Self::new(SystemConfig::default(), true);
        rig.start();
        rig
    }

    /// Started and ticked once, so the session is up.
    pub fn online() -> Self {
        let mut rig = Self::started();
        rig.tick();
        rig
    }

    pub fn start(&mut self) {
        self.app.start(
            self.now_ms,
            &mut self.link,
            &mut self.delay,
            &mut self.hw,
            &mut self.sink,
        );
    }

    pub fn tick(&mut self) {
        self.app.tick(
            self.now_ms,
            &mut self.link,
            &mut self.session,
            &mut self.hw,
            &mut self.delay,
            &mut self.sink,
        );
    }

    pub fn tick_at(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.tick();
    }

    /// Tick every `step_ms` until `until_ms` inclusive.
    pub fn run_until(&mut self, until_ms: u64, step_ms: u64) {
        while self.now_ms + step_ms <= until_ms {
            self.now_ms += step_ms;
            self.tick();
        }
    }

    /// Deliver a command and tick once.
    pub fn command(&mut self, payload: &str) {
        self.session.deliver(CMD_TOPIC, payload.as_bytes());
        self.tick();
    }
}
