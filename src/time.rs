//! Time units
//!
//! Rates and durations come from [`embedded_time`]; this module adds the clock
//! arithmetic of the PWM timer.

pub use embedded_time::duration::{self, Microseconds};
pub use embedded_time::rate::{self, Extensions, Hertz};

use crate::config::{PRESCALER, TOP};
use crate::map::Prescaler;

const DIVISOR: u32 = match PRESCALER.divisor() {
    Some(divisor) => divisor,
    None => panic!("the PWM timer must run from the prescaled CPU clock"),
};

/// Counter increment rate for a CPU clock and prescaler.
///
/// `None` when the prescaler does not divide the CPU clock.
pub const fn tick_rate_with(clock: Hertz, prescaler: Prescaler) -> Option<Hertz> {
    match prescaler.divisor() {
        Some(divisor) => Some(Hertz(clock.0 / divisor)),
        None => None,
    }
}

/// Counter increment rate of the configured timer.
pub const fn tick_rate(clock: Hertz) -> Hertz {
    Hertz(clock.0 / DIVISOR)
}

/// Waveform period in phase and frequency correct mode.
///
/// One period counts from BOTTOM up to `top` and back down, `2 * top` ticks.
/// `None` when the prescaler does not divide the CPU clock, the clock is zero
/// or the period does not fit into [`Microseconds`].
pub const fn pwm_period_with(clock: Hertz, prescaler: Prescaler, top: u16) -> Option<Microseconds> {
    match prescaler.divisor() {
        Some(divisor) if clock.0 > 0 => {
            let micros = 2 * top as u64 * divisor as u64 * 1_000_000 / clock.0 as u64;
            if micros > u32::MAX as u64 {
                None
            } else {
                Some(Microseconds(micros as u32))
            }
        }
        _ => None,
    }
}

/// Waveform period of the configured timer, see [`pwm_period_with`].
pub const fn pwm_period(clock: Hertz) -> Option<Microseconds> {
    pwm_period_with(clock, PRESCALER, TOP)
}
