//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, test recorder, ...).

use crate::connectivity::{ConnectionPhase, Layer};
use crate::error::{DecodeError, LinkError, SessionError};

use super::state::DeviceState;
use super::telemetry::TelemetrySample;

/// Outbound channel a publish was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    SensorState,
    DeviceState,
    SysOnline,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(DeviceState),

    /// A connectivity layer moved between phases.
    PhaseChanged {
        layer: Layer,
        from: ConnectionPhase,
        to: ConnectionPhase,
    },

    /// A link bring-up burst ended without association.
    LinkAttemptFailed(LinkError),

    /// A session connect attempt failed.
    SessionAttemptFailed(SessionError),

    /// An inbound command changed (or re-asserted) the device state.
    CommandApplied(DeviceState),

    /// An inbound command was discarded.
    CommandRejected(DecodeError),

    /// Sensor telemetry sample that was just published.
    Telemetry(TelemetrySample),

    /// Heartbeat published (carries the state it announced).
    Heartbeat(DeviceState),

    /// An outbound publish could not be enqueued.
    PublishFailed { channel: Channel, error: SessionError },
}
