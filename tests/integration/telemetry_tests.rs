//! Periodic sensor telemetry and heartbeat publishing.

use garden_node::app::events::AppEvent;
use garden_node::app::ports::RainReading;
use garden_node::config::SystemConfig;

use crate::mock_hw::{DEVICE_STATE_TOPIC, Rig, SENSOR_STATE_TOPIC, SYS_ONLINE_TOPIC};

#[test]
fn sensor_report_every_three_seconds() {
    let mut rig = Rig::online();
    rig.run_until(2_900, 100);
    assert!(rig.session.on_topic(SENSOR_STATE_TOPIC).is_empty());

    rig.run_until(3_000, 100);
    let reports = rig.session.on_topic(SENSOR_STATE_TOPIC);
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].retain);

    let doc = reports[0].json();
    assert_eq!(doc["temperature"], 22.0);
    assert_eq!(doc["humidity"], 55.0);
    assert_eq!(doc["rain_analog"], 4095);
    assert_eq!(doc["rain_digital"], 1);
    assert_eq!(doc["is_raining"], false);
    assert_eq!(doc["rssi"], -61);
    assert_eq!(doc["timestamp"], 3_000);
}

#[test]
fn wet_plate_reports_raining() {
    let mut rig = Rig::online();
    rig.hw.rain = RainReading {
        analog: 1200,
        raining: true,
    };
    rig.run_until(3_000, 100);
    let doc = rig.session.on_topic(SENSOR_STATE_TOPIC)[0].json();
    assert_eq!(doc["is_raining"], true);
    assert_eq!(doc["rain_digital"], 0);
    assert_eq!(doc["rain_analog"], 1200);
}

#[test]
fn climate_failure_omits_fields_but_still_publishes() {
    let mut rig = Rig::online();
    rig.hw.climate = None;
    rig.run_until(3_000, 100);
    let doc = rig.session.on_topic(SENSOR_STATE_TOPIC)[0].json();
    assert!(doc.get("temperature").is_none());
    assert!(doc.get("humidity").is_none());
    assert_eq!(doc["rain_analog"], 4095);
}

#[test]
fn readings_are_rounded_to_one_decimal() {
    let mut rig = Rig::online();
    rig.hw.climate = Some((19.96, 48.04));
    rig.run_until(3_000, 100);
    let doc = rig.session.on_topic(SENSOR_STATE_TOPIC)[0].json();
    assert_eq!(doc["temperature"], 20.0);
    assert_eq!(doc["humidity"], 48.0);
}

#[test]
fn heartbeat_publishes_state_then_announcement() {
    let mut rig = Rig::online();
    rig.session.clear();
    rig.run_until(15_000, 100);

    let heartbeat: Vec<_> = rig
        .session
        .topics()
        .into_iter()
        .filter(|t| *t != SENSOR_STATE_TOPIC)
        .collect();
    assert_eq!(heartbeat, [DEVICE_STATE_TOPIC, SYS_ONLINE_TOPIC]);
    assert!(rig.sink.events.iter().any(|e| matches!(e, AppEvent::Heartbeat(_))));
}

#[test]
fn heartbeat_cadence_over_a_minute() {
    let mut rig = Rig::online();
    rig.session.clear();
    rig.run_until(60_000, 100);

    let beats = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Heartbeat(_)))
        .count();
    assert_eq!(beats, 4);
    assert_eq!(rig.session.on_topic(SENSOR_STATE_TOPIC).len(), 20);
    assert_eq!(rig.session.on_topic(SYS_ONLINE_TOPIC).len(), 4);
}

#[test]
fn reports_are_skipped_while_session_is_down() {
    let mut rig = Rig::new(SystemConfig::default(), false);
    rig.start();
    rig.run_until(30_000, 100);
    assert!(rig.session.published.is_empty());
    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::Telemetry(_) | AppEvent::Heartbeat(_)))
    );
}

#[test]
fn custom_intervals_are_honoured() {
    let config = SystemConfig {
        sensor_publish_interval_ms: 1_000,
        heartbeat_interval_ms: 4_000,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, true);
    rig.start();
    rig.tick();
    rig.session.clear();
    rig.run_until(8_000, 50);

    assert_eq!(rig.session.on_topic(SENSOR_STATE_TOPIC).len(), 8);
    assert_eq!(rig.session.on_topic(SYS_ONLINE_TOPIC).len(), 2);
}
