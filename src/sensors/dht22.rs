//! DHT22 / AM2302 temperature + humidity probe (single-wire, bit-banged).
//!
//! ```text
//!  host:  ‾‾‾\______________/‾‾‾‾ (release)
//!  probe:                        \__80µs__/‾‾80µs‾‾\_50µs_/‾26µs‾ = 0
//!                                                   \_50µs_/‾‾70µs‾‾ = 1
//! ```
//!
//! 40 bits, MSB first: humidity ×10 (u16), temperature ×10 (sign bit +
//! 15-bit magnitude), checksum (low byte of the sum of the first four).
//! The probe needs at least 2 s between conversions.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Host start pulse (datasheet: at least 1 ms).
const START_LOW_US: u32 = 1_100;
/// Upper bound for any single level phase of the reply.
const EDGE_TIMEOUT_US: u32 = 100;
/// Sampling point after a rising edge; between the 26 µs and 70 µs highs.
const BIT_SAMPLE_US: u32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    /// The probe did not answer or an edge never came.
    Timeout,
    /// Frame arrived but the checksum did not match.
    Checksum,
    /// Frame decoded to an impossible value.
    OutOfRange,
    /// The GPIO driver reported an error.
    Pin,
}

impl fmt::Display for DhtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "no response"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Pin => write!(f, "GPIO error"),
        }
    }
}

/// Decode a raw 5-byte frame into (°C, %RH).
pub fn decode_frame(frame: [u8; 5]) -> Result<(f32, f32), DhtError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(DhtError::Checksum);
    }
    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    if humidity > 100.0 || !(-40.0..=80.0).contains(&temperature) {
        return Err(DhtError::OutOfRange);
    }
    Ok((temperature, humidity))
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up, idling high.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Run one conversion.  Blocks for roughly 5 ms.
    pub fn read(&mut self) -> Result<(f32, f32), DhtError> {
        decode_frame(self.read_frame()?)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], DhtError> {
        self.pin.set_low().map_err(|_| DhtError::Pin)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| DhtError::Pin)?;

        // Response: low 80 µs, high 80 µs, then the first bit's low.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_for(true)?;
            self.delay.delay_us(BIT_SAMPLE_US);
            if self.pin.is_high().map_err(|_| DhtError::Pin)? {
                frame[bit / 8] |= 0x80 >> (bit % 8);
                self.wait_for(false)?;
            }
        }
        Ok(frame)
    }

    fn wait_for(&mut self, high: bool) -> Result<(), DhtError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high().map_err(|_| DhtError::Pin)? == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }
}
