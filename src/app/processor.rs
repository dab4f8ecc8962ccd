//! Command processor: decode → plan → actuate → republish.

use log::{info, warn};

use crate::error::DecodeError;

use super::commands::{ActuatorAction, CommandBatch};
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort, SessionPort};
use super::reporter::Reporter;
use super::state::DeviceState;

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The payload could not be decoded; nothing changed.
    Rejected(DecodeError),
    /// Decoded, but carried no recognised command.
    Ignored,
    /// State updated and actuators driven.
    Applied {
        state: DeviceState,
        /// The retained state publish was accepted by the session.
        republished: bool,
    },
}

/// Stateless; the device state it mutates is owned by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandProcessor;

impl CommandProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Apply one `device/cmd` payload.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        raw: &[u8],
        state: &mut DeviceState,
        hw: &mut (impl SensorPort + ActuatorPort),
        session: &mut impl SessionPort,
        reporter: &Reporter,
        now_ms: u64,
        sink: &mut dyn EventSink,
    ) -> CommandOutcome {
        let batch = match CommandBatch::decode(raw) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Command: discarded ({})", e);
                sink.emit(&AppEvent::CommandRejected(e));
                return CommandOutcome::Rejected(e);
            }
        };

        let plan = batch.plan(state);
        if !plan.changed {
            info!("Command: no recognised keys");
            return CommandOutcome::Ignored;
        }

        for action in &plan.actions {
            match *action {
                ActuatorAction::SetLight(on) => hw.set_light(on),
                ActuatorAction::SetPumpDrive(on) => hw.set_pump_drive(on),
                ActuatorAction::SetPumpDuty(duty) => hw.set_pump_duty(duty),
            }
        }
        *state = plan.next;
        info!(
            "Command: light={} pump={} speed={}%",
            state.light_on, state.pump_on, state.pump_speed_percent
        );
        sink.emit(&AppEvent::CommandApplied(*state));

        let rssi = hw.read_signal_strength();
        let republished = reporter.publish_state(session, state, rssi, now_ms, sink);
        CommandOutcome::Applied {
            state: *state,
            republished,
        }
    }
}
