/*!
 # Phase and frequency correct PWM

   Driver for the 16-bit timer/counters of AVR microcontrollers (ATmega640,
   ATmega1280, ATmega2560) in phase and frequency correct PWM mode, with up to
   three independent outputs for motor drivers.

   The timer is set up with a /1024 prescaler, TOP = 0xFFFF in `ICRn` and
   non-inverting outputs (clear on compare match counting up, set counting
   down). See [`config`] for the fixed settings.

   Registers are only reached through a [`RegisterAccess`](reg::RegisterAccess)
   handle and every configuration step runs inside an atomic section provided by
   an [`InterruptControl`](interrupt::InterruptControl) capability. On the device
   these are [`Mmio`](reg::Mmio) and
   [`GlobalInterrupts`](interrupt::GlobalInterrupts); in tests both roles are
   filled by a `SimBus` from the `sim` module, enabled with the `sim` feature.

   ```
   use phase_correct_pwm::prelude::*;
   use phase_correct_pwm::pwm::{self, Channel, DriverState};
   use phase_correct_pwm::sim::SimBus;

   let bus = SimBus::new();
   let mut timer = pwm::timer1(&bus, &bus);
   timer.activate_channel_a();
   timer.activate_channel_c();

   let mut left = timer.channel(Channel::A);
   left.set_duty_cycle_percent(25).unwrap();
   assert_eq!(left.duty(), 16383);

   assert_eq!(
       timer.state(),
       DriverState::CoreReady { active: Channel::A | Channel::C }
   );
   ```

   On the device the registers are memory mapped:

   ```no_run
   use phase_correct_pwm::{interrupt::GlobalInterrupts, pwm, reg::Mmio};

   // SAFETY: Timer/Counter1 and PB5..PB7 are not used elsewhere.
   let mut timer = pwm::timer1(unsafe { Mmio::new() }, GlobalInterrupts);
   timer.activate_channel_a();
   timer.activate_channel_b();
   ```
*/
#![no_std]

mod fmt;

pub use embedded_hal as hal;

pub mod config;
pub mod interrupt;
pub mod map;
pub mod prelude;
pub mod pwm;
pub mod reg;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod time;

pub use crate::pwm::{Channel, DriverState, PhaseCorrectPwm, PwmChannel};
