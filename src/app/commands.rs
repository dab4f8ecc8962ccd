//! Inbound commands and their pure planning step.
//!
//! A `device/cmd` payload is a JSON object carrying any subset of
//! `light`, `pump` and `pumpSpeed`.  [`CommandBatch::decode`] turns it into
//! typed commands, failing only when the document itself is unusable;
//! individual fields with bad values are dropped on their own.
//! [`CommandBatch::plan`] then computes the resulting [`DeviceState`] and
//! the actuator writes needed to reach it, without performing any I/O.

use log::debug;
use serde_json::Value;

use crate::error::DecodeError;

use super::state::DeviceState;

/// Inbound payloads larger than this are discarded unparsed.
pub const MAX_COMMAND_BYTES: usize = 512;

const KEY_LIGHT: &str = "light";
const KEY_PUMP: &str = "pump";
const KEY_PUMP_SPEED: &str = "pumpSpeed";

/// Value of an on/off channel command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    Toggle,
    On,
    Off,
}

impl Switch {
    /// Parse `"toggle"`, `"on"` or `"off"`.  Anything else is `None`.
    pub fn parse(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "toggle" => Some(Self::Toggle),
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// The value the channel takes when this switch is applied to `current`.
    pub fn resolve(self, current: bool) -> bool {
        match self {
            Self::Toggle => !current,
            Self::On => true,
            Self::Off => false,
        }
    }
}

/// A single typed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetLight(Switch),
    SetPump(Switch),
    /// Requested speed before clamping.
    SetPumpSpeedPercent(i64),
}

/// One actuator write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    SetLight(bool),
    SetPumpDrive(bool),
    SetPumpDuty(u8),
}

/// Result of planning a batch against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub next: DeviceState,
    /// Writes in the order they must be issued.
    pub actions: heapless::Vec<ActuatorAction, 3>,
    /// At least one command was applied; the state must be republished.
    pub changed: bool,
}

impl Plan {
    fn push(&mut self, action: ActuatorAction) {
        let pushed = self.actions.push(action);
        debug_assert!(pushed.is_ok(), "plan holds at most one write per actuator line");
    }
}

/// All recognised commands found in one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandBatch {
    pub light: Option<Switch>,
    pub pump: Option<Switch>,
    pub pump_speed: Option<i64>,
}

impl CommandBatch {
    /// Decode a raw payload.
    ///
    /// Fails on oversized, malformed or non-object documents.  Unknown keys
    /// and invalid values for known keys are skipped.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() > MAX_COMMAND_BYTES {
            return Err(DecodeError::TooLarge(raw.len()));
        }
        let doc: Value = serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
        let Value::Object(map) = doc else {
            return Err(DecodeError::NotAnObject);
        };

        let mut batch = Self::default();
        if let Some(v) = map.get(KEY_LIGHT) {
            batch.light = Switch::parse(v);
            if batch.light.is_none() {
                debug!("Command: ignoring light={}", v);
            }
        }
        if let Some(v) = map.get(KEY_PUMP) {
            batch.pump = Switch::parse(v);
            if batch.pump.is_none() {
                debug!("Command: ignoring pump={}", v);
            }
        }
        if let Some(v) = map.get(KEY_PUMP_SPEED) {
            batch.pump_speed = parse_speed(v);
            if batch.pump_speed.is_none() {
                debug!("Command: ignoring pumpSpeed={}", v);
            }
        }
        Ok(batch)
    }

    /// No recognised command survived decoding.
    pub fn is_empty(&self) -> bool {
        self.light.is_none() && self.pump.is_none() && self.pump_speed.is_none()
    }

    /// Commands in processing order: light, pump, pump speed.
    pub fn commands(&self) -> impl Iterator<Item = Command> {
        [
            self.light.map(Command::SetLight),
            self.pump.map(Command::SetPump),
            self.pump_speed.map(Command::SetPumpSpeedPercent),
        ]
        .into_iter()
        .flatten()
    }

    /// Compute the next state and the actuator writes that realise it.
    ///
    /// Writes are derived from the final state, so a message that turns the
    /// pump on and sets its speed drives the pump once at the new speed.
    /// A speed change alone only reaches the actuator while the pump runs.
    pub fn plan(&self, current: &DeviceState) -> Plan {
        let mut next = *current;
        for command in self.commands() {
            match command {
                Command::SetLight(sw) => next.light_on = sw.resolve(next.light_on),
                Command::SetPump(sw) => next.pump_on = sw.resolve(next.pump_on),
                Command::SetPumpSpeedPercent(pct) => {
                    next.pump_speed_percent = pct.clamp(0, 100) as u8;
                }
            }
        }

        let mut plan = Plan {
            next,
            actions: heapless::Vec::new(),
            changed: !self.is_empty(),
        };
        if self.light.is_some() {
            plan.push(ActuatorAction::SetLight(next.light_on));
        }
        if self.pump.is_some() {
            plan.push(ActuatorAction::SetPumpDrive(next.pump_on));
            plan.push(ActuatorAction::SetPumpDuty(next.pump_duty()));
        } else if self.pump_speed.is_some() && next.pump_on {
            plan.push(ActuatorAction::SetPumpDuty(next.pump_duty()));
        }
        plan
    }
}

/// Integers pass through; fractional numbers are truncated toward zero.
fn parse_speed(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value.as_f64().map(|f| f.trunc() as i64)
}
