//! # Phase and frequency correct PWM
//!
//! [`PhaseCorrectPwm`] takes over one 16-bit timer/counter and runs it in
//! phase and frequency correct mode with TOP taken from `ICRn`, see
//! [`crate::config`]. The counter runs up and down between BOTTOM and TOP, so
//! every output pulse is centered in the period and all three channels stay
//! phase aligned. Only the compare value differs per channel.
//!
//! The driver moves through these states:
//!
//! ```text
//! Uninitialized --reset, setup--> CoreReady {}
//! CoreReady {S} --activate X----> CoreReady {S + X}
//! any state -----reset----------> Uninitialized
//! ```
//!
//! There is no way to take a single channel out again, short of a full reset.
//!
//! Every operation is a single atomic section: an interrupt handler sees the
//! control registers either before or after it, never in between. Operations
//! are not atomic against each other; calling `setup` before activating a
//! channel is up to the caller, and is what [`PhaseCorrectPwm::new`] does.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use enumset::{EnumSet, EnumSetType};

use crate::config::{MODE, OUTPUT_ACTION, PRESCALER, TOP};
use crate::interrupt::{AtomicSection, InterruptControl};
use crate::map::{self, ChannelMap, CompareOutputMode, Prescaler, TimerMap, WaveformMode};
use crate::map::{CS, WGM_HIGH, WGM_LOW};
use crate::reg::RegisterAccess;

/// Output channel of the timer, bound to `OCnA`, `OCnB` or `OCnC`.
#[derive(Debug, EnumSetType)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
    C,
}

impl Channel {
    /// All channels in register order.
    pub const ALL: [Channel; 3] = [Channel::A, Channel::B, Channel::C];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Configuration state read back from the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Prescaler, mode or TOP do not match the configuration.
    Uninitialized,
    /// The counter runs as configured, `active` channels drive their pins.
    CoreReady { active: EnumSet<Channel> },
}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DriverState::Uninitialized => defmt::write!(f, "Uninitialized"),
            DriverState::CoreReady { active } => {
                defmt::write!(f, "CoreReady {{ active: {=u8:#b} }}", active.as_u8())
            }
        }
    }
}

/// 16-bit timer/counter in phase and frequency correct PWM mode.
#[derive(Debug)]
pub struct PhaseCorrectPwm<R, I> {
    regs: R,
    irq: I,
    map: TimerMap,
}

impl<R, I> PhaseCorrectPwm<R, I>
where
    R: RegisterAccess,
    I: InterruptControl,
{
    /// Take over the timer described by `map`, reset and set it up.
    ///
    /// No channel is active afterwards.
    pub fn new(regs: R, irq: I, map: TimerMap) -> Self {
        let mut pwm = PhaseCorrectPwm { regs, irq, map };
        pwm.reset();
        pwm.setup();
        pwm
    }

    /// Run `f` on the registers inside one atomic section.
    #[inline]
    fn transaction<T>(&self, f: impl FnOnce(&R, &TimerMap) -> T) -> T {
        let _section = AtomicSection::enter(&self.irq);
        f(&self.regs, &self.map)
    }

    /// Clear the control registers and the counter.
    ///
    /// Stops the waveform generation and disconnects all channels from their
    /// pins until [`setup`](Self::setup) runs again. Pin directions and the
    /// compare values are left alone.
    pub fn reset(&mut self) {
        self.transaction(|regs, map| {
            // stop the clock before anything else
            regs.write8(map.tccrb, 0);
            regs.write8(map.tccra, 0);
            regs.write8(map.tccrc, 0);
            regs.write16(map.tcnt, 0);
        });
        trace!("timer reset");
    }

    /// Program TOP, the waveform mode and the prescaler.
    ///
    /// Must run after [`reset`](Self::reset) and before any channel is
    /// activated. Compare output settings are preserved.
    pub fn setup(&mut self) {
        self.transaction(|regs, map| {
            regs.write16(map.icr, TOP);
            regs.modify8(map.tccra, |r| WGM_LOW.insert(r, MODE.low_bits()));
            // the clock select goes last, the counter only starts once the
            // rest of the configuration is in place
            regs.modify8(map.tccrb, |r| {
                CS.insert(WGM_HIGH.insert(r, MODE.high_bits()), PRESCALER.bits())
            });
        });
        debug!("timer running, TOP = {=u16}", TOP);
    }

    /// Connect `channel` to its pin.
    ///
    /// Sets the pin to output and selects clear on compare match while counting
    /// up, set on compare match while counting down. The other channels are not
    /// touched. Activating an active channel again rewrites the same bits.
    pub fn activate(&mut self, channel: Channel) {
        self.transaction(|regs, map| {
            let binding = &map.channels[channel.index()];
            regs.modify8(binding.ddr, |r| r | binding.pin_mask());
            regs.modify8(map.tccra, |r| binding.com.insert(r, OUTPUT_ACTION.bits()));
        });
        debug!("channel {} active", channel);
    }

    /// Read the configuration state back from the registers.
    pub fn state(&self) -> DriverState {
        self.transaction(|regs, map| {
            let tccra = regs.read8(map.tccra);
            let tccrb = regs.read8(map.tccrb);

            let configured = Prescaler::from_bits(CS.extract(tccrb)) == PRESCALER
                && WaveformMode::from_registers(tccra, tccrb) == MODE
                && regs.read16(map.icr) == TOP;
            if !configured {
                return DriverState::Uninitialized;
            }

            let active = Channel::ALL
                .iter()
                .copied()
                .filter(|channel| {
                    let binding = &map.channels[channel.index()];
                    CompareOutputMode::from_bits(binding.com.extract(tccra)) == OUTPUT_ACTION
                        && regs.read8(binding.ddr) & binding.pin_mask() != 0
                })
                .collect();
            DriverState::CoreReady { active }
        })
    }

    /// Handle to set the compare value of `channel`.
    ///
    /// The handle does not check whether the channel was activated.
    pub fn channel(&self, channel: Channel) -> PwmChannel<'_, R, I> {
        PwmChannel { pwm: self, channel }
    }

    /// Register map of the driven timer.
    pub fn map(&self) -> &TimerMap {
        &self.map
    }

    /// Release the register access and interrupt capability.
    ///
    /// The timer keeps running as configured.
    pub fn free(self) -> (R, I) {
        (self.regs, self.irq)
    }

    fn binding(&self, channel: Channel) -> &ChannelMap {
        &self.map.channels[channel.index()]
    }
}

macro_rules! channel_activation {
    ($($X:ident),+) => {
        paste::paste! {
            impl<R, I> PhaseCorrectPwm<R, I>
            where
                R: RegisterAccess,
                I: InterruptControl,
            {
                $(
                    #[doc = "Connect channel " $X " to the `OCn" $X "` pin, see [`activate`](Self::activate)."]
                    #[inline]
                    pub fn [<activate_channel_ $X:lower>](&mut self) {
                        self.activate(Channel::$X);
                    }
                )+
            }
        }
    };
}

channel_activation!(A, B, C);

macro_rules! pwm_timer {
    ($($X:literal),+) => {
        paste::paste! {
            $(
                #[doc = "Take over Timer/Counter" $X ", see [`PhaseCorrectPwm::new`]."]
                pub fn [<timer $X>]<R, I>(regs: R, irq: I) -> PhaseCorrectPwm<R, I>
                where
                    R: RegisterAccess,
                    I: InterruptControl,
                {
                    PhaseCorrectPwm::new(regs, irq, map::[<TIMER $X>])
                }
            )+
        }
    };
}

pwm_timer!(1, 3, 4, 5);

/// Compare value access of one channel.
///
/// Compare values range from 0, output constantly low, to TOP, output
/// constantly high.
pub struct PwmChannel<'a, R, I> {
    pwm: &'a PhaseCorrectPwm<R, I>,
    channel: Channel,
}

impl<R, I> PwmChannel<'_, R, I>
where
    R: RegisterAccess,
    I: InterruptControl,
{
    /// The channel this handle writes to.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Current compare value.
    pub fn duty(&self) -> u16 {
        let ocr = self.pwm.binding(self.channel).ocr;
        self.pwm.transaction(|regs, _| regs.read16(ocr))
    }
}

impl<R, I> ErrorType for PwmChannel<'_, R, I> {
    type Error = Infallible;
}

impl<R, I> SetDutyCycle for PwmChannel<'_, R, I>
where
    R: RegisterAccess,
    I: InterruptControl,
{
    fn max_duty_cycle(&self) -> u16 {
        self.pwm.transaction(|regs, map| regs.read16(map.icr))
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let ocr = self.pwm.binding(self.channel).ocr;
        self.pwm.transaction(|regs, _| regs.write16(ocr, duty));
        Ok(())
    }
}
