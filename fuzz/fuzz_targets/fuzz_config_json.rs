//! Fuzz target: `SystemConfig::from_json`
//!
//! Whatever the override document, a loaded config always validates and
//! always yields channel names.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use garden_node::config::{SystemConfig, Topics};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = SystemConfig::from_json(data) {
        assert!(config.validate().is_ok());
        assert!(Topics::new(&config.topic_namespace).is_ok());
        let _ = serde_json::to_vec(&config);
    }
});
