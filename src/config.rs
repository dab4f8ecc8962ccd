//! System configuration parameters
//!
//! All tunable parameters for the garden node.  Defaults carry the factory
//! values; overrides arrive as a JSON document or from the build
//! environment (credentials are never committed to the source tree).

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Capacity of a fully-qualified topic name (`<namespace>/<suffix>`).
pub const TOPIC_CAPACITY: usize = 128;

/// Fixed-capacity topic string.
pub type TopicString = heapless::String<TOPIC_CAPACITY>;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Network ---
    /// WiFi station SSID
    pub wifi_ssid: String,
    /// WiFi password (empty for open networks)
    pub wifi_password: String,

    // --- Broker ---
    /// MQTT broker host name or IP address
    pub mqtt_host: String,
    /// MQTT broker TCP port
    pub mqtt_port: u16,
    /// MQTT username (empty = anonymous)
    pub mqtt_username: String,
    /// MQTT password (ignored when username is empty)
    pub mqtt_password: String,
    /// MQTT keep-alive (seconds)
    pub mqtt_keep_alive_secs: u16,
    /// MQTT socket / connect timeout (seconds)
    pub mqtt_socket_timeout_secs: u16,

    // --- Identity ---
    /// Device identity string announced on `sys/online`
    pub device_id: String,
    /// Firmware version string announced on `sys/online`
    pub firmware_version: String,
    /// Topic namespace prefix (e.g. `demo/garden`)
    pub topic_namespace: String,

    // --- Timing ---
    /// Sensor telemetry publish interval (milliseconds)
    pub sensor_publish_interval_ms: u32,
    /// Heartbeat (state + online) publish interval (milliseconds)
    pub heartbeat_interval_ms: u32,
    /// Link health check interval (milliseconds)
    pub link_check_interval_ms: u32,
    /// Minimum spacing between session connect attempts (milliseconds)
    pub session_retry_interval_ms: u32,

    // --- Link retry policy ---
    /// Association polls on first bring-up
    pub link_initial_attempts: u8,
    /// Association polls on reconnect
    pub link_reconnect_attempts: u8,
    /// Delay between association polls (milliseconds)
    pub link_retry_delay_ms: u32,
    /// Settle time after dropping a stale association (milliseconds)
    pub link_reset_delay_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: String::new(),
            wifi_password: String::new(),

            // Broker
            mqtt_host: String::from("192.168.1.7"),
            mqtt_port: 1883,
            mqtt_username: String::new(),
            mqtt_password: String::new(),
            mqtt_keep_alive_secs: 60,
            mqtt_socket_timeout_secs: 10,

            // Identity
            device_id: String::from("esp32s3_garden_real"),
            firmware_version: String::from("s3-hw-1.0.0"),
            topic_namespace: String::from("demo/garden"),

            // Timing
            sensor_publish_interval_ms: 3_000, // 3 s
            heartbeat_interval_ms: 15_000,     // 15 s
            link_check_interval_ms: 5_000,     // 5 s
            session_retry_interval_ms: 5_000,  // 5 s

            // Link retry policy
            link_initial_attempts: 20,
            link_reconnect_attempts: 10,
            link_retry_delay_ms: 500,
            link_reset_delay_ms: 100,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON override document.  Missing fields keep their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill empty credentials from the compile-time environment.
    ///
    /// Recognised variables: `GARDEN_WIFI_SSID`, `GARDEN_WIFI_PASS`,
    /// `GARDEN_MQTT_HOST`, `GARDEN_MQTT_USER`, `GARDEN_MQTT_PASS`.
    pub fn apply_build_env(&mut self) {
        fill_if_empty(&mut self.wifi_ssid, option_env!("GARDEN_WIFI_SSID"));
        fill_if_empty(&mut self.wifi_password, option_env!("GARDEN_WIFI_PASS"));
        fill_if_empty(&mut self.mqtt_username, option_env!("GARDEN_MQTT_USER"));
        fill_if_empty(&mut self.mqtt_password, option_env!("GARDEN_MQTT_PASS"));
        if let Some(host) = option_env!("GARDEN_MQTT_HOST") {
            self.mqtt_host = host.to_string();
        }
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::ValidationFailed("device_id must not be empty"));
        }
        if self.topic_namespace.is_empty() {
            return Err(ConfigError::ValidationFailed("topic_namespace must not be empty"));
        }
        if self.topic_namespace.contains(['+', '#'])
            || self.topic_namespace.ends_with('/')
        {
            return Err(ConfigError::ValidationFailed(
                "topic_namespace must not contain wildcards or a trailing '/'",
            ));
        }
        Topics::new(&self.topic_namespace)?;
        if self.mqtt_host.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_host must not be empty"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_port must be non-zero"));
        }
        if self.sensor_publish_interval_ms == 0
            || self.heartbeat_interval_ms == 0
            || self.link_check_interval_ms == 0
            || self.session_retry_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.link_initial_attempts == 0 || self.link_reconnect_attempts == 0 {
            return Err(ConfigError::ValidationFailed("link attempt counts must be non-zero"));
        }
        Ok(())
    }
}

fn fill_if_empty(field: &mut String, value: Option<&str>) {
    if field.is_empty() {
        if let Some(v) = value {
            *field = v.to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// The four channel names derived from the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// `N/sensor/state`: telemetry, not retained.
    pub sensor_state: TopicString,
    /// `N/device/state`: actuator state, retained.
    pub device_state: TopicString,
    /// `N/device/cmd`: inbound commands.
    pub device_cmd: TopicString,
    /// `N/sys/online`: identity announcement, retained.
    pub sys_online: TopicString,
}

impl Topics {
    pub fn new(namespace: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            sensor_state: join(namespace, "sensor/state")?,
            device_state: join(namespace, "device/state")?,
            device_cmd: join(namespace, "device/cmd")?,
            sys_online: join(namespace, "sys/online")?,
        })
    }
}

fn join(namespace: &str, suffix: &str) -> Result<TopicString, ConfigError> {
    let mut topic = TopicString::new();
    write!(topic, "{namespace}/{suffix}").map_err(|_| ConfigError::TopicTooLong)?;
    Ok(topic)
}
