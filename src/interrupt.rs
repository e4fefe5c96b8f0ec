//! # Atomic sections
//!
//! Register updates that an interrupt handler must never observe half applied
//! run inside an [`AtomicSection`]: the global interrupt flag is captured and
//! cleared on entry and the captured state is put back on exit, whichever way
//! the section is left. Interrupts are not re-enabled unconditionally, so a
//! section entered with interrupts already masked leaves them masked.
//!
//! Sections delay every interrupt in the system. Keep them to a few register
//! writes.

use core::marker::PhantomData;

/// Capability to mask the maskable interrupts and restore them afterwards.
pub trait InterruptControl {
    /// Interrupt-enable state captured on entry.
    type RestoreState: Copy;

    /// Capture the current interrupt-enable state, then disable interrupts.
    fn disable(&self) -> Self::RestoreState;

    /// Put back a state captured by [`disable`](InterruptControl::disable).
    ///
    /// # Safety
    ///
    /// `state` must come from the most recent `disable` call that has not been
    /// restored yet, sections have to be left in reverse order of entry.
    unsafe fn restore(&self, state: Self::RestoreState);
}

impl<T> InterruptControl for &T
where
    T: InterruptControl + ?Sized,
{
    type RestoreState = T::RestoreState;

    #[inline]
    fn disable(&self) -> Self::RestoreState {
        T::disable(self)
    }

    #[inline]
    unsafe fn restore(&self, state: Self::RestoreState) {
        T::restore(self, state)
    }
}

/// The interrupt flag of the running device.
///
/// Backed by the [`critical_section`] crate. The final binary selects the
/// implementation, e.g. through the `critical-section-impl` feature of
/// `avr-device` or `critical-section-single-core` of `cortex-m`.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlobalInterrupts;

impl InterruptControl for GlobalInterrupts {
    type RestoreState = critical_section::RestoreState;

    #[inline]
    fn disable(&self) -> Self::RestoreState {
        // SAFETY: every state handed out here is released by `AtomicSection::drop`.
        unsafe { critical_section::acquire() }
    }

    #[inline]
    unsafe fn restore(&self, state: Self::RestoreState) {
        critical_section::release(state)
    }
}

/// Guard of an active atomic section.
///
/// Restores the captured interrupt state when dropped. Guards are only handed
/// out by reference (see [`free`]), which keeps sections strictly nested.
pub struct AtomicSection<'a, I>
where
    I: InterruptControl + ?Sized,
{
    irq: &'a I,
    state: I::RestoreState,
    // The captured state belongs to the current execution context.
    _not_send: PhantomData<*mut ()>,
}

impl<'a, I> AtomicSection<'a, I>
where
    I: InterruptControl + ?Sized,
{
    #[inline]
    pub(crate) fn enter(irq: &'a I) -> Self {
        AtomicSection {
            irq,
            state: irq.disable(),
            _not_send: PhantomData,
        }
    }

    /// Interrupt-enable state that will be restored on exit.
    #[inline]
    pub fn restore_state(&self) -> I::RestoreState {
        self.state
    }
}

impl<I> Drop for AtomicSection<'_, I>
where
    I: InterruptControl + ?Sized,
{
    #[inline]
    fn drop(&mut self) {
        // SAFETY: guards never leave the scope that created them, so they are
        // dropped in reverse order of entry.
        unsafe { self.irq.restore(self.state) }
    }
}

/// Execute `f` with interrupts masked by `irq`.
///
/// The previous interrupt state is restored when `f` returns or unwinds.
#[inline]
pub fn free<I, F, R>(irq: &I, f: F) -> R
where
    I: InterruptControl + ?Sized,
    F: FnOnce(&AtomicSection<'_, I>) -> R,
{
    let section = AtomicSection::enter(irq);
    f(&section)
}
