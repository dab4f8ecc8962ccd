//! Inbound `device/cmd` handling: actuation order, state and republish.

use garden_node::app::events::AppEvent;
use garden_node::app::processor::CommandOutcome;
use garden_node::app::state::DeviceState;
use garden_node::error::DecodeError;

use crate::mock_hw::{ActuatorCall, DEVICE_STATE_TOPIC, Rig};

/// Online rig with the connect-time publishes and power-on writes cleared.
fn ready() -> Rig {
    let mut rig = Rig::online();
    rig.session.clear();
    rig.hw.clear();
    rig
}

#[test]
fn pump_on_with_speed_drives_once_at_new_speed() {
    let mut rig = ready();
    rig.command(r#"{"pump":"on","pumpSpeed":40}"#);

    assert_eq!(
        rig.app.state(),
        DeviceState {
            light_on: false,
            pump_on: true,
            pump_speed_percent: 40,
        }
    );
    assert_eq!(
        rig.hw.calls,
        [ActuatorCall::SetPumpDrive(true), ActuatorCall::SetPumpDuty(102)]
    );
    let states = rig.session.on_topic(DEVICE_STATE_TOPIC);
    assert_eq!(states.len(), 1);
    assert!(states[0].retain);
    let doc = states[0].json();
    assert_eq!(doc["pump"], "on");
    assert_eq!(doc["pumpSpeed"], 40);
    assert_eq!(doc["rssi"], -61);
}

#[test]
fn speed_while_pump_off_is_stored_and_applied_later() {
    let mut rig = ready();
    rig.command(r#"{"pumpSpeed":30}"#);
    assert!(rig.hw.calls.is_empty(), "stopped pump is not driven");
    assert_eq!(rig.app.state().pump_speed_percent, 30);
    assert_eq!(rig.session.on_topic(DEVICE_STATE_TOPIC).len(), 1);

    rig.command(r#"{"pump":"on"}"#);
    assert_eq!(
        rig.hw.calls,
        [ActuatorCall::SetPumpDrive(true), ActuatorCall::SetPumpDuty(77)]
    );
}

#[test]
fn speed_while_running_updates_duty_only() {
    let mut rig = ready();
    rig.command(r#"{"pump":"on"}"#);
    rig.hw.clear();
    rig.command(r#"{"pumpSpeed":50}"#);
    assert_eq!(rig.hw.calls, [ActuatorCall::SetPumpDuty(128)]);
}

#[test]
fn light_toggle_twice_restores_state() {
    let mut rig = ready();
    let before = rig.app.state();
    rig.command(r#"{"light":"toggle"}"#);
    rig.command(r#"{"light":"toggle"}"#);

    assert_eq!(rig.app.state(), before);
    assert_eq!(
        rig.hw.calls,
        [ActuatorCall::SetLight(true), ActuatorCall::SetLight(false)]
    );
    let states = rig.session.on_topic(DEVICE_STATE_TOPIC);
    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|p| p.retain));
    assert_eq!(states[0].json()["light"], "on");
    assert_eq!(states[1].json()["light"], "off");
}

#[test]
fn unknown_keys_change_nothing() {
    let mut rig = ready();
    rig.command(r#"{"fan":"on","valve":3}"#);
    assert_eq!(rig.app.state(), DeviceState::default());
    assert!(rig.hw.calls.is_empty());
    assert!(rig.session.published.is_empty());
}

#[test]
fn malformed_payload_is_discarded() {
    let mut rig = ready();
    rig.command("{light: on");
    assert_eq!(rig.app.state(), DeviceState::default());
    assert!(rig.hw.calls.is_empty());
    assert!(rig.session.published.is_empty());
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::CommandRejected(DecodeError::Malformed { .. })))
    );
}

#[test]
fn array_payload_is_not_a_command() {
    let mut rig = ready();
    rig.command(r#"["light","on"]"#);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::CommandRejected(DecodeError::NotAnObject))
    );
    assert!(rig.session.published.is_empty());
}

#[test]
fn out_of_range_speed_is_clamped() {
    let mut rig = ready();
    rig.command(r#"{"pumpSpeed":250}"#);
    assert_eq!(rig.app.state().pump_speed_percent, 100);
    rig.command(r#"{"pumpSpeed":-20}"#);
    assert_eq!(rig.app.state().pump_speed_percent, 0);
}

#[test]
fn repeated_identical_command_republishes() {
    let mut rig = ready();
    rig.command(r#"{"light":"on"}"#);
    rig.command(r#"{"light":"on"}"#);
    assert_eq!(rig.session.on_topic(DEVICE_STATE_TOPIC).len(), 2);
    assert_eq!(
        rig.hw.calls,
        [ActuatorCall::SetLight(true), ActuatorCall::SetLight(true)]
    );
}

#[test]
fn messages_on_other_topics_are_ignored() {
    let mut rig = ready();
    rig.session
        .deliver("demo/garden/device/state", br#"{"light":"on"}"#);
    rig.tick();
    assert!(!rig.app.state().light_on);
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn several_deliveries_in_one_tick_apply_in_order() {
    let mut rig = ready();
    rig.session.deliver(crate::mock_hw::CMD_TOPIC, br#"{"light":"on"}"#);
    rig.session.deliver(crate::mock_hw::CMD_TOPIC, br#"{"pump":"toggle"}"#);
    rig.tick();
    assert!(rig.app.state().light_on);
    assert!(rig.app.state().pump_on);
    assert_eq!(rig.session.on_topic(DEVICE_STATE_TOPIC).len(), 2);
}

#[test]
fn direct_command_reports_outcome() {
    let mut rig = ready();
    let outcome = rig.app.handle_command(
        br#"{"light":"on"}"#,
        rig.now_ms,
        &mut rig.session,
        &mut rig.hw,
        &mut rig.sink,
    );
    let CommandOutcome::Applied { state, republished } = outcome else {
        panic!("expected Applied, got {:?}", outcome);
    };
    assert!(state.light_on);
    assert!(republished);

    let outcome = rig.app.handle_command(
        br#"{"colour":"red"}"#,
        rig.now_ms,
        &mut rig.session,
        &mut rig.hw,
        &mut rig.sink,
    );
    assert_eq!(outcome, CommandOutcome::Ignored);
}

#[test]
fn command_applies_even_when_republish_fails() {
    let mut rig = ready();
    rig.session.fail_publish = true;
    rig.command(r#"{"light":"on"}"#);
    assert!(rig.app.state().light_on);
    assert_eq!(rig.hw.calls, [ActuatorCall::SetLight(true)]);
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::PublishFailed { .. }))
    );
}
