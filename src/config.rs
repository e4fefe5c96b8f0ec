//! Compile time configuration of the PWM timer.
//!
//! There are no runtime knobs; changing the waveform means changing these
//! constants.

use crate::map::{CompareOutputMode, Prescaler, WaveformMode};
use crate::time::Hertz;

/// Clock divider in front of the counter.
///
/// At 16 MHz the counter ticks at 15.625 kHz.
pub const PRESCALER: Prescaler = Prescaler::Div1024;

/// Up/down counting between BOTTOM and `ICRn`, centered pulses, glitch free
/// updates of both TOP and the compare values.
pub const MODE: WaveformMode = WaveformMode::PhaseFrequencyCorrectIcr;

/// Counter TOP, written to `ICRn`. Full 16-bit duty cycle resolution.
pub const TOP: u16 = u16::MAX;

/// Output polarity of every channel: a compare value of 0 keeps the output low,
/// a compare value of [`TOP`] keeps it high.
pub const OUTPUT_ACTION: CompareOutputMode = CompareOutputMode::ClearUpSetDown;

/// CPU clock of the reference board (ATmega2560 on an Arduino Mega).
pub const CPU_FREQUENCY: Hertz = Hertz(16_000_000);
