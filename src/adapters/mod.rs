//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                 |
//! |-------------|---------------|-----------------------------|
//! | `hardware`  | SensorPort    | DHT22, rain plate, RSSI     |
//! |             | ActuatorPort  | Light GPIO, pump H-bridge   |
//! | `wifi`      | LinkPort      | ESP-IDF WiFi STA            |
//! | `mqtt`      | SessionPort   | ESP-IDF MQTT client         |
//! | `log_sink`  | EventSink     | Serial log output           |
//! | `time`      | (none)        | ESP32 system timer          |
//! | `device_id` | (none)        | eFuse MAC                   |

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
