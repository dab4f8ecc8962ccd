//! Rain detector: comparator board with a digital and an analog output.
//!
//! The digital line goes LOW when the plate is wet.  The analog level is
//! reported raw (12-bit, lower = wetter) for trend plotting.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::RainReading;

/// A raw ADC channel.
pub trait AnalogInput {
    /// Raw sample, 0–4095.
    fn read_raw(&mut self) -> u16;
}

pub struct RainSensor<D, A> {
    digital: D,
    analog: A,
}

impl<D: InputPin, A: AnalogInput> RainSensor<D, A> {
    pub fn new(digital: D, analog: A) -> Self {
        Self { digital, analog }
    }

    pub fn read(&mut self) -> RainReading {
        let raining = match self.digital.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Rain: digital read failed, assuming dry");
                false
            }
        };
        RainReading {
            analog: self.analog.read_raw().min(4095),
            raining,
        }
    }
}
