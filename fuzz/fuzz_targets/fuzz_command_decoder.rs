//! Fuzz target: `CommandBatch::decode` + `plan`
//!
//! Drives arbitrary payloads through the `device/cmd` decoder and planner
//! and asserts that neither panics and that any plan keeps the pump speed
//! inside 0–100 with at most one write per actuator line.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use garden_node::app::commands::{ActuatorAction, CommandBatch, MAX_COMMAND_BYTES};
use garden_node::app::state::DeviceState;
use garden_node::error::DecodeError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let batch = match CommandBatch::decode(data) {
        Ok(batch) => batch,
        Err(DecodeError::TooLarge(len)) => {
            assert!(len > MAX_COMMAND_BYTES);
            return;
        }
        Err(_) => return,
    };

    let plan = batch.plan(&DeviceState::default());
    assert!(plan.next.pump_speed_percent <= 100);
    assert_eq!(plan.changed, !batch.is_empty());

    let light_writes = plan
        .actions
        .iter()
        .filter(|a| matches!(a, ActuatorAction::SetLight(_)))
        .count();
    assert!(light_writes <= 1);

    // A duty write always reflects the planned state.
    for action in &plan.actions {
        if let ActuatorAction::SetPumpDuty(duty) = action {
            assert_eq!(*duty, plan.next.pump_duty());
        }
    }
});
