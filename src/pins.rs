//! GPIO / peripheral pin assignments for the garden node (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Climate probe (DHT22, single-wire, open-drain with pull-up)
// ---------------------------------------------------------------------------

pub const DHT22_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Grow light
// ---------------------------------------------------------------------------

/// Digital output: HIGH = light on.
pub const LIGHT_GPIO: i32 = 20;

// ---------------------------------------------------------------------------
// Pump motor driver (L298N H-bridge, channel A)
// ---------------------------------------------------------------------------

/// Direction input 1: HIGH with IN2 LOW = forward.
pub const PUMP_IN1_GPIO: i32 = 5;
/// Direction input 2.
pub const PUMP_IN2_GPIO: i32 = 6;
/// Enable input, driven by LEDC PWM for speed.
pub const PUMP_ENA_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Rain detector (comparator board)
// ---------------------------------------------------------------------------

/// Digital output of the comparator: LOW = wet.  Pull-up enabled.
pub const RAIN_DO_GPIO: i32 = 15;
/// Analog output of the plate.  ADC2 channel 5 on ESP32-S3.
pub const RAIN_AO_GPIO: i32 = 16;
pub const RAIN_AO_ADC2_CHANNEL: u32 = 5;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the pump enable line.
pub const PUMP_PWM_FREQ_HZ: u32 = 5_000;
