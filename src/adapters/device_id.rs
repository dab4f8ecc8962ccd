//! Node identity derived from the ESP32 factory MAC address.
//!
//! The session client id is `<device_id>_<xxyy>`, where `xxyy` is the last
//! two MAC bytes in lowercase hex.  It is stable across reboots, so the
//! broker sees the same client after every reconnect.

use core::fmt::Write;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly six bytes into a caller-owned buffer.
    let rc = unsafe { esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) };
    if rc != esp_idf_svc::sys::ESP_OK {
        log::warn!("DeviceId: eFuse MAC read failed (rc={}), using zeros", rc);
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Session client identifier for `device_id` on this board.
pub fn client_id(device_id: &str, mac: &MacAddress) -> String {
    let mut id = String::with_capacity(device_id.len() + 5);
    id.push_str(device_id);
    let _ = write!(id, "_{:02x}{:02x}", mac[4], mac[5]);
    id
}
