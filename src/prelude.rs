//! Prelude
pub use crate::hal::pwm::SetDutyCycle as _embedded_hal_pwm_SetDutyCycle;
pub use crate::interrupt::InterruptControl as _phase_correct_pwm_interrupt_InterruptControl;
pub use crate::reg::RegisterAccess as _phase_correct_pwm_reg_RegisterAccess;
pub use crate::time::Extensions as _embedded_time_rate_Extensions;
