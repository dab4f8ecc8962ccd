//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for the network link.
//! `begin` only kicks off association; the connectivity supervisor polls
//! [`is_connected`](LinkPort::is_connected) through its bounded retry burst.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

use crate::app::ports::LinkPort;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() {
        return Err(LinkError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    /// Driver configured and started.
    started: bool,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: association state.
    #[cfg(not(target_os = "espidf"))]
    sim_associated: bool,
    /// Simulation: number of `begin` calls.
    #[cfg(not(target_os = "espidf"))]
    sim_begin_count: u32,
}

impl WifiAdapter {
    /// Wrap the station driver.  Credentials are checked here so a bad
    /// build-time SSID is reported once, not on every retry.  An empty SSID
    /// is accepted; `begin` then fails with [`LinkError::NoCredentials`].
    pub fn new(
        #[cfg(target_os = "espidf")] wifi: EspWifi<'static>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, LinkError> {
        match validate_ssid(ssid) {
            Ok(()) | Err(LinkError::NoCredentials) => {}
            Err(e) => return Err(e),
        }
        validate_password(password)?;

        let mut adapter = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            started: false,
            #[cfg(target_os = "espidf")]
            wifi,
            #[cfg(not(target_os = "espidf"))]
            sim_associated: false,
            #[cfg(not(target_os = "espidf"))]
            sim_begin_count: 0,
        };
        adapter.ssid.push_str(ssid).map_err(|_| LinkError::InvalidSsid)?;
        adapter
            .password
            .push_str(password)
            .map_err(|_| LinkError::InvalidPassword)?;
        Ok(adapter)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self) -> Result<(), LinkError> {
        if !self.started {
            let auth_method = if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPAWPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: self.ssid.as_str().try_into().map_err(|_| LinkError::InvalidSsid)?,
                password: self
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| LinkError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(|e| {
                warn!("WiFi: set_configuration failed: {}", e);
                LinkError::StartFailed
            })?;
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                LinkError::StartFailed
            })?;
            self.started = true;
        }
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {}", e);
            LinkError::StartFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self) -> Result<(), LinkError> {
        self.started = true;
        self.sim_begin_count = self.sim_begin_count.wrapping_add(1);
        self.sim_associated = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if self.started {
            if let Err(e) = self.wifi.disconnect() {
                warn!("WiFi: disconnect failed: {}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_associated = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        // Associated and the netif has an address.
        self.started && self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.started && self.sim_associated
    }

    /// Simulation: drop the association as if the AP vanished.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        self.sim_associated = false;
    }

    /// Simulation: how many times association was started.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_begin_count(&self) -> u32 {
        self.sim_begin_count
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn begin(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        info!("WiFi: associating with '{}'", self.ssid);
        self.platform_begin()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Signal strength
// ───────────────────────────────────────────────────────────────

/// RSSI of the associated AP in dBm, or 0 when not associated.
#[cfg(target_os = "espidf")]
pub fn station_rssi() -> i32 {
    let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
    // SAFETY: fills a caller-owned record; fails cleanly when not associated.
    let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
    if rc == esp_idf_svc::sys::ESP_OK {
        i32::from(ap_info.rssi)
    } else {
        0
    }
}

/// Simulation: no radio, signal strength unknown.
#[cfg(not(target_os = "espidf"))]
pub fn station_rssi() -> i32 {
    0
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
