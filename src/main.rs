//! Garden Node Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    WifiAdapter   MqttAdapter   LogEventSink   │
//! │  (Sensor+Actuator)  (LinkPort)    (SessionPort) (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ConnectivitySupervisor · CommandProcessor · Scheduler │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single cooperative loop: every iteration hands the current uptime to
//! [`AppService::tick`], then yields for a few milliseconds.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{error, info};

use garden_node::adapters::device_id;
use garden_node::adapters::hardware::HardwareAdapter;
use garden_node::adapters::log_sink::LogEventSink;
use garden_node::adapters::mqtt::MqttAdapter;
use garden_node::adapters::time::UptimeClock;
use garden_node::adapters::wifi::WifiAdapter;
use garden_node::app::service::AppService;
use garden_node::config::SystemConfig;
use garden_node::error::Error;
use garden_node::drivers::hw_init;

/// Yield between loop iterations so the idle task can feed the watchdog.
const LOOP_YIELD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Garden Node v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let mut config = SystemConfig::default();
    config.apply_build_env();
    config.validate()?;

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("{} ({}), halting", Error::from(e), e);
        loop {
            FreeRtos::delay_ms(1_000);
        }
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 4. Adapters ───────────────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mut wifi = WifiAdapter::new(esp_wifi, &config.wifi_ssid, &config.wifi_password)?;
    let mut mqtt = MqttAdapter::new(&config.mqtt_host, config.mqtt_port);
    let mut hw = HardwareAdapter::on_board_pins();
    let mut log_sink = LogEventSink::new();
    // Link retry waits yield to the scheduler instead of busy-waiting.
    let mut delay = FreeRtos;
    let clock = UptimeClock::new();

    let client_id = device_id::client_id(&config.device_id, &device_id::read_mac());
    info!("Device: {} (client id {})", config.device_id, client_id);

    // ── 5. Application service ────────────────────────────────
    let mut app = AppService::new(config, &client_id)?;
    app.start(clock.uptime_ms(), &mut wifi, &mut delay, &mut hw, &mut log_sink);

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        app.tick(
            clock.uptime_ms(),
            &mut wifi,
            &mut mqtt,
            &mut hw,
            &mut delay,
            &mut log_sink,
        );
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }
}
