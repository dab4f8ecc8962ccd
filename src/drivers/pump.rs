//! Water pump motor driver (L298N H-bridge, channel A).
//!
//! Direction is fixed forward; speed is the PWM duty on the enable line.
//!
//! | IN1 | IN2 | ENA  | Motor        |
//! |-----|-----|------|--------------|
//! | H   | L   | duty | forward      |
//! | L   | L   | 0    | coast (off)  |
//!
//! Drive and duty are separate calls so the caller controls the order;
//! this driver is a dumb actuator.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::state::MAX_PUMP_DUTY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running { duty: u8 },
}

pub struct PumpDriver<A, B, E> {
    in1: A,
    in2: B,
    enable: E,
    driving: bool,
    duty: u8,
}

impl<A, B, E> PumpDriver<A, B, E>
where
    A: OutputPin,
    B: OutputPin,
    E: SetDutyCycle,
{
    pub fn new(in1: A, in2: B, enable: E) -> Self {
        Self {
            in1,
            in2,
            enable,
            driving: false,
            duty: 0,
        }
    }

    /// Forward (`true`) or release both bridge inputs (`false`).
    pub fn set_drive(&mut self, forward: bool) {
        let ok = if forward {
            self.in1.set_high().is_ok() && self.in2.set_low().is_ok()
        } else {
            self.in1.set_low().is_ok() && self.in2.set_low().is_ok()
        };
        if !ok {
            warn!("Pump: direction GPIO write failed");
        }
        self.driving = forward;
    }

    /// Raw 8-bit duty on the enable line.
    pub fn set_duty(&mut self, raw: u8) {
        if self
            .enable
            .set_duty_cycle_fraction(u16::from(raw), u16::from(MAX_PUMP_DUTY))
            .is_err()
        {
            warn!("Pump: PWM update failed");
            return;
        }
        self.duty = raw;
    }

    pub fn state(&self) -> PumpState {
        if self.driving && self.duty > 0 {
            PumpState::Running { duty: self.duty }
        } else {
            PumpState::Stopped
        }
    }

    pub fn current_duty(&self) -> u8 {
        self.duty
    }
}
