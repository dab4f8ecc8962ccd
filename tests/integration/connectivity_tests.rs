//! Link and session supervision through the full service.

use garden_node::app::events::AppEvent;
use garden_node::config::SystemConfig;
use garden_node::connectivity::{ConnectionPhase, Layer};
use garden_node::error::{LinkError, SessionError};

use crate::mock_hw::{CMD_TOPIC, DEVICE_STATE_TOPIC, Rig, SENSOR_STATE_TOPIC, SYS_ONLINE_TOPIC};

#[test]
fn start_brings_link_up_without_waiting() {
    let rig = Rig::started();
    assert_eq!(rig.app.link_phase(), ConnectionPhase::Up);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Down);
    assert_eq!(rig.link.begin_calls, 1);
    assert_eq!(rig.link.disconnect_calls, 0, "first bring-up does not reset");
    assert_eq!(rig.delay.total_ms(), 0);
}

#[test]
fn first_tick_opens_session_and_subscribes() {
    let rig = Rig::online();
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Up);
    assert_eq!(rig.session.connects.len(), 1);
    assert_eq!(rig.session.subscriptions, [CMD_TOPIC]);
}

#[test]
fn session_up_announces_then_publishes_state() {
    let rig = Rig::online();
    assert_eq!(rig.session.topics(), [SYS_ONLINE_TOPIC, DEVICE_STATE_TOPIC]);
    assert!(rig.session.published.iter().all(|p| p.retain));

    let online = rig.session.published[0].json();
    assert_eq!(online["online"], true);
    assert_eq!(online["deviceId"], "esp32s3_garden_real");
    assert_eq!(online["firmware"], "s3-hw-1.0.0");

    let state = rig.session.published[1].json();
    assert_eq!(state["light"], "off");
    assert_eq!(state["pump"], "off");
    assert_eq!(state["pumpSpeed"], 100);
}

#[test]
fn announcement_precedes_commands_queued_before_connect() {
    let mut rig = Rig::started();
    rig.session.deliver(CMD_TOPIC, br#"{"light":"on"}"#);
    rig.tick();

    assert_eq!(
        rig.session.topics(),
        [SYS_ONLINE_TOPIC, DEVICE_STATE_TOPIC, DEVICE_STATE_TOPIC]
    );
    assert_eq!(rig.session.published[1].json()["light"], "off");
    assert_eq!(rig.session.published[2].json()["light"], "on");
}

#[test]
fn connect_carries_identity_and_last_will() {
    let config = SystemConfig {
        mqtt_username: "gardener".into(),
        mqtt_password: "s3cret".into(),
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, true);
    rig.start();
    rig.tick();

    let record = &rig.session.connects[0];
    assert_eq!(record.client_id, "garden_cafe");
    assert_eq!(record.username.as_deref(), Some("gardener"));
    assert_eq!(record.password.as_deref(), Some("s3cret"));
    assert_eq!(record.will_topic.as_deref(), Some(SYS_ONLINE_TOPIC));
    assert!(record.will_retain);

    let will: serde_json::Value =
        serde_json::from_slice(record.will_payload.as_deref().unwrap()).unwrap();
    assert_eq!(will["online"], false);
    assert_eq!(will["deviceId"], "esp32s3_garden_real");
    assert!(will.get("rssi").is_none());
}

#[test]
fn anonymous_broker_gets_no_credentials() {
    let rig = Rig::online();
    assert_eq!(rig.session.connects[0].username, None);
    assert_eq!(rig.session.connects[0].password, None);
}

#[test]
fn unreachable_network_exhausts_initial_burst() {
    let mut rig = Rig::new(SystemConfig::default(), false);
    rig.start();

    assert_eq!(rig.app.link_phase(), ConnectionPhase::Down);
    assert_eq!(rig.delay.total_ms(), 20 * 500);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::LinkAttemptFailed(LinkError::Exhausted { attempts: 20 }))
    );
}

#[test]
fn session_is_never_attempted_while_link_is_down() {
    let mut rig = Rig::new(SystemConfig::default(), false);
    rig.start();
    rig.run_until(12_000, 100);

    assert!(rig.session.connects.is_empty());
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Down);
    assert!(rig.session.published.is_empty());
}

#[test]
fn reconnect_burst_resets_association_first() {
    let mut rig = Rig::new(SystemConfig::default(), false);
    rig.start();
    let before = rig.delay.total_ms();

    rig.tick_at(5_000);
    assert_eq!(rig.link.disconnect_calls, 1);
    assert_eq!(rig.delay.total_ms() - before, 100 + 10 * 500);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::LinkAttemptFailed(LinkError::Exhausted { attempts: 10 }))
    );
}

#[test]
fn link_recovers_on_next_check_and_session_follows() {
    let mut rig = Rig::new(SystemConfig::default(), false);
    rig.start();
    rig.link.reachable = true;

    rig.tick_at(4_900);
    assert_eq!(rig.app.link_phase(), ConnectionPhase::Down, "check not due yet");

    rig.tick_at(5_000);
    assert_eq!(rig.app.link_phase(), ConnectionPhase::Up);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Up);
    assert_eq!(rig.session.connects.len(), 1);
}

#[test]
fn silent_link_drop_takes_session_down_and_reconnects() {
    let mut rig = Rig::online();
    rig.link.lose_association();
    rig.link.reachable = false;

    rig.tick_at(5_000);
    assert_eq!(rig.app.link_phase(), ConnectionPhase::Down);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Down);
    assert!(rig.sink.events.contains(&AppEvent::PhaseChanged {
        layer: Layer::Session,
        from: ConnectionPhase::Up,
        to: ConnectionPhase::Down,
    }));

    rig.link.reachable = true;
    rig.session.clear();
    rig.tick_at(10_000);
    assert_eq!(rig.app.link_phase(), ConnectionPhase::Up);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Up);
    assert_eq!(rig.session.connects.len(), 2);

    // The sensor report skipped at 5 s is due again in the reconnect tick.
    let topics = rig.session.topics();
    assert_eq!(topics[..2], [SYS_ONLINE_TOPIC, DEVICE_STATE_TOPIC]);
    assert_eq!(topics[2..], [SENSOR_STATE_TOPIC]);
}

#[test]
fn failed_session_retries_once_per_interval() {
    let mut rig = Rig::started();
    rig.session.accept = false;

    rig.tick();
    rig.run_until(4_900, 100);
    assert_eq!(rig.session.connects.len(), 1);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Down);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SessionAttemptFailed(SessionError::ConnectFailed(-2)))
    );

    rig.session.accept = true;
    rig.tick_at(5_000);
    assert_eq!(rig.session.connects.len(), 2);
    assert_eq!(rig.app.session_phase(), ConnectionPhase::Up);
}

#[test]
fn broker_drop_discards_pending_deliveries() {
    let mut rig = Rig::online();
    rig.session.drop_connection();
    rig.session.deliver(CMD_TOPIC, br#"{"light":"on"}"#);
    rig.tick_at(100);

    assert_eq!(rig.app.session_phase(), ConnectionPhase::Down);
    assert!(!rig.app.state().light_on);
    assert_eq!(rig.session.pending(), 0);
}

#[test]
fn session_is_polled_every_tick_while_up() {
    let mut rig = Rig::online();
    let polls = rig.session.polls;
    rig.run_until(1_000, 100);
    assert_eq!(rig.session.polls - polls, 10);
}

#[test]
fn phase_changes_are_reported_in_order() {
    let rig = Rig::online();
    let phases: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PhaseChanged { layer, to, .. } => Some((*layer, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        [
            (Layer::Link, ConnectionPhase::Connecting),
            (Layer::Link, ConnectionPhase::Up),
            (Layer::Session, ConnectionPhase::Connecting),
            (Layer::Session, ConnectionPhase::Up),
        ]
    );
}
