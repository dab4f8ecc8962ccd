//! Fuzz target: `dht22::decode_frame`
//!
//! Any 5-byte frame either fails cleanly or decodes to a reading inside the
//! probe's physical range.
//!
//! cargo fuzz run fuzz_dht_frame

#![no_main]

use garden_node::sensors::dht22::decode_frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|frame: [u8; 5]| {
    if let Ok((temperature, humidity)) = decode_frame(frame) {
        assert!((-40.0..=80.0).contains(&temperature));
        assert!((0.0..=100.0).contains(&humidity));
    }
});
