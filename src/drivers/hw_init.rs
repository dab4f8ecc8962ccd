//! One-shot hardware peripheral initialization and raw pin handles.
//!
//! Configures GPIO directions, the LEDC timer/channel for the pump and the
//! ADC2 oneshot unit for the rain plate using raw ESP-IDF sys calls.  Called
//! once from `main()` before the loop starts.  The handle types below wrap
//! the configured peripherals in `embedded-hal` 1.0 traits so the drivers
//! stay generic; on non-espidf targets they are inert simulation stubs.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

use crate::error::Error;
use crate::pins;
use crate::sensors::rain::AnalogInput;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC2 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::AdcInitFailed(_) => "ADC2",
            HwInitError::GpioConfigFailed(_) => "GPIO",
            HwInitError::LedcInitFailed(_) => "LEDC",
        })
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
        init_adc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as esp_err_t { Ok(()) } else { Err(err(ret)) }
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn config_pin(pin: i32, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    unsafe {
        config_pin(pins::RAIN_DO_GPIO, gpio_mode_t_GPIO_MODE_INPUT, true)?;
        // DHT22 data line: open-drain so the probe can pull it low.
        config_pin(pins::DHT22_GPIO, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD, true)?;
        gpio_set_level(pins::DHT22_GPIO, 1);
    }
    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [pins::LIGHT_GPIO, pins::PUMP_IN1_GPIO, pins::PUMP_IN2_GPIO];
    for &pin in &output_pins {
        unsafe {
            config_pin(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
            gpio_set_level(pin, 0);
        }
    }
    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: register read on an already-configured pin; main loop only.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: register write on an already-configured output; main loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_PUMP: u32 = 0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::PUMP_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer) }, HwInitError::LedcInitFailed)?;

    let channel = ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_PUMP,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::PUMP_ENA_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    check(unsafe { ledc_channel_config(&channel) }, HwInitError::LedcInitFailed)?;

    info!(
        "hw_init: LEDC configured (pump=CH{}, {} Hz, {}-bit)",
        LEDC_CH_PUMP,
        pins::PUMP_PWM_FREQ_HZ,
        pins::PWM_RESOLUTION_BITS
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: channel configured in init_ledc(); main loop is the only writer.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── ADC2 (oneshot) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC2_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: written once by `init_adc()` before the loop starts; read only
/// from the main loop afterwards.
#[cfg(target_os = "espidf")]
unsafe fn adc2_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC2_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_2,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    check(
        unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC2_HANDLE) },
        HwInitError::AdcInitFailed,
    )?;

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    check(
        unsafe { adc_oneshot_config_channel(adc2_handle(), pins::RAIN_AO_ADC2_CHANNEL, &chan_cfg) },
        HwInitError::AdcInitFailed,
    )?;

    info!("hw_init: ADC2 configured (CH{}=rain)", pins::RAIN_AO_ADC2_CHANNEL);
    Ok(())
}

/// Raw 12-bit reading, or `None` when the unit is busy (ADC2 is shared
/// with the WiFi radio).
#[cfg(target_os = "espidf")]
pub fn adc2_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc2_handle() contract; single-threaded main-loop access.
    let ret = unsafe { adc_oneshot_read(adc2_handle(), channel, &mut raw) };
    if ret != ESP_OK as esp_err_t {
        warn!("hw_init: ADC2 CH{} read failed (rc={})", channel, ret);
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

/// Simulation: a dry plate reads full scale.
#[cfg(not(target_os = "espidf"))]
pub fn adc2_read(_channel: u32) -> Option<u16> {
    Some(4095)
}

// ═══════════════════════════════════════════════════════════════
//  embedded-hal handles
// ═══════════════════════════════════════════════════════════════

/// Push-pull output configured by [`init_peripherals`].
#[derive(Debug)]
pub struct GpioOut(pub i32);

impl ErrorType for GpioOut {
    type Error = Infallible;
}

impl OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, true);
        Ok(())
    }
}

/// Input configured by [`init_peripherals`].
#[derive(Debug)]
pub struct GpioIn(pub i32);

impl ErrorType for GpioIn {
    type Error = Infallible;
}

impl InputPin for GpioIn {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

/// Open-drain line that can both drive low and be read back.
#[derive(Debug)]
pub struct OpenDrainPin(pub i32);

impl ErrorType for OpenDrainPin {
    type Error = Infallible;
}

impl OutputPin for OpenDrainPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, false);
        Ok(())
    }

    /// Releases the line; the pull-up takes it high.
    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, true);
        Ok(())
    }
}

impl InputPin for OpenDrainPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

/// One LEDC channel at 8-bit resolution.
#[derive(Debug)]
pub struct LedcChannel(pub u32);

impl pwm::ErrorType for LedcChannel {
    type Error = Infallible;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        (1 << pins::PWM_RESOLUTION_BITS) - 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        ledc_set(self.0, duty.min(self.max_duty_cycle()) as u8);
        Ok(())
    }
}

/// ADC2 oneshot channel.  Keeps the last good sample for when the radio
/// holds the converter.
#[derive(Debug)]
pub struct AdcChannel {
    channel: u32,
    last: u16,
}

impl AdcChannel {
    pub fn new(channel: u32) -> Self {
        Self { channel, last: 4095 }
    }
}

impl AnalogInput for AdcChannel {
    fn read_raw(&mut self) -> u16 {
        if let Some(raw) = adc2_read(self.channel) {
            self.last = raw;
        }
        self.last
    }
}

/// Busy-wait microsecond delay for bit-banged protocols.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroDelay;

impl DelayNs for MicroDelay {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        // SAFETY: ROM busy-wait, no shared state.
        unsafe { esp_rom_delay_us(ns.div_ceil(1_000)) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
