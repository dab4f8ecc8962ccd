//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, WiFi, MQTT, event sinks) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.
//! Every method is expected to return promptly; the only blocking in the
//! system is the bounded link bring-up, which waits through an injected
//! [`DelayNs`](embedded_hal::delay::DelayNs).

use crate::error::{LinkError, SessionError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One rain detector sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RainReading {
    /// Raw 12-bit ADC value (0–4095); lower means wetter.
    pub analog: u16,
    /// Digital comparator output says the plate is wet.
    pub raining: bool,
}

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Temperature (°C) and relative humidity (%), or `None` when the
    /// probe did not answer.
    fn read_temperature_humidity(&mut self) -> Option<(f32, f32)>;

    /// Rain detector analog level and wet/dry decision.
    fn read_rain(&mut self) -> RainReading;

    /// Received signal strength of the network link (dBm, 0 when unknown).
    fn read_signal_strength(&mut self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
/// Actuators are never read back.
pub trait ActuatorPort {
    /// Switch the grow light.
    fn set_light(&mut self, on: bool);

    /// Enable (forward) or release the pump H-bridge.
    fn set_pump_drive(&mut self, on: bool);

    /// Raw pump PWM duty, 0–255.
    fn set_pump_duty(&mut self, raw: u8);
}

// ───────────────────────────────────────────────────────────────
// Link port (network association)
// ───────────────────────────────────────────────────────────────

/// The layer beneath the session: WiFi station association.
pub trait LinkPort {
    /// Start (or restart) association.  Returns without waiting for it
    /// to complete; the supervisor polls [`is_connected`](Self::is_connected).
    fn begin(&mut self) -> Result<(), LinkError>;

    /// Drop the current association.
    fn disconnect(&mut self);

    /// Whether the station is associated and has an address.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Session port (publish/subscribe)
// ───────────────────────────────────────────────────────────────

/// Message the broker publishes on session loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastWill<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub retain: bool,
}

/// Everything a session adapter needs to open a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions<'a> {
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub keep_alive_secs: u16,
    pub timeout_secs: u16,
    pub will: Option<LastWill<'a>>,
}

/// A message delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// The application session on top of the link.
pub trait SessionPort {
    /// Open the session.  One attempt; no internal retry loop.
    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError>;

    /// Whether the session is currently established.
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic filter.
    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    /// Publish without waiting for broker acknowledgement.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError>;

    /// Service keep-alives and collect pending deliveries.
    fn poll(&mut self);

    /// Next delivery collected by [`poll`](Self::poll), oldest first.
    fn next_message(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Delegates (decouple the supervisor / scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callbacks the connectivity supervisor invokes on session activity.
///
/// Both run synchronously inside the supervisor's tick, so their side
/// effects complete before the tick moves on.
pub trait SessionDelegate<S: SessionPort> {
    /// The session just came up and the command channel is subscribed.
    fn on_session_established(&mut self, session: &mut S, sink: &mut dyn EventSink);

    /// A delivery arrived on an established session.
    fn on_message(&mut self, session: &mut S, message: &InboundMessage, sink: &mut dyn EventSink);
}

/// Which periodic report fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Sensor telemetry sample (not retained).
    SensorTelemetry,
    /// Device state + online announcement (both retained).
    Heartbeat,
}

/// Callback trait that the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    /// * `label`: the human-readable label of the schedule that fired.
    /// * `kind`: which report is due.
    fn on_schedule_fired(&mut self, label: &str, kind: ReportKind);
}
