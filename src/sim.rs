//! # Simulated register space
//!
//! [`SimBus`] stands in for the data space of the device: a block of plain
//! memory plus a model of the global interrupt flag. It implements both
//! [`RegisterAccess`] and [`InterruptControl`], so one bus can be handed to the
//! driver for both roles.
//!
//! An optional interrupt service routine can be attached. It is raised by every
//! register write: with interrupts enabled it runs right after the write, with
//! interrupts masked it stays pending until they are restored. The routine sees
//! a [`Snapshot`] of the whole register space, which makes half-applied updates
//! visible to tests.

use core::cell::Cell;
use core::fmt;

use crate::interrupt::InterruptControl;
use crate::reg::{Address, RegisterAccess};

/// Size of the simulated data space, covering the extended I/O of the ATmega2560.
pub const SIM_SPACE: usize = 0x200;

/// Copy of the simulated register space at one point in time.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    mem: [u8; SIM_SPACE],
}

impl Snapshot {
    /// Byte at `addr`.
    ///
    /// # Panics
    ///
    /// If `addr` lies outside of [`SIM_SPACE`].
    #[inline]
    pub fn read8(&self, addr: Address) -> u8 {
        self.mem[addr]
    }

    /// 16-bit register at `addr`, low byte first.
    #[inline]
    pub fn read16(&self, addr: Address) -> u16 {
        u16::from_le_bytes([self.read8(addr), self.read8(addr + 1)])
    }

    /// Addresses whose content differs from `other`.
    pub fn diff<'a>(&'a self, other: &'a Snapshot) -> impl Iterator<Item = Address> + 'a {
        (0..SIM_SPACE).filter(move |&addr| self.mem[addr] != other.mem[addr])
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // only non-zero registers, the space is mostly empty
        f.debug_map()
            .entries(
                self.mem
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| **value != 0)
                    .map(|(addr, value)| (addr, value)),
            )
            .finish()
    }
}

/// Simulated register space with an interrupt flag.
pub struct SimBus<'a> {
    mem: [Cell<u8>; SIM_SPACE],
    interrupts_enabled: Cell<bool>,
    pending: Cell<bool>,
    writes: Cell<usize>,
    isr_runs: Cell<usize>,
    isr: Option<&'a dyn Fn(&Snapshot)>,
}

impl SimBus<'static> {
    /// All registers zero, interrupts enabled, no interrupt routine.
    pub fn new() -> Self {
        SimBus::build(None)
    }
}

impl Default for SimBus<'static> {
    fn default() -> Self {
        SimBus::new()
    }
}

impl<'a> SimBus<'a> {
    /// Like [`SimBus::new`], with `isr` raised by every register write.
    pub fn with_isr(isr: &'a dyn Fn(&Snapshot)) -> Self {
        SimBus::build(Some(isr))
    }

    fn build(isr: Option<&'a dyn Fn(&Snapshot)>) -> Self {
        SimBus {
            mem: core::array::from_fn(|_| Cell::new(0)),
            interrupts_enabled: Cell::new(true),
            pending: Cell::new(false),
            writes: Cell::new(0),
            isr_runs: Cell::new(0),
            isr,
        }
    }

    /// Current content of the register space.
    pub fn snapshot(&self) -> Snapshot {
        let mut mem = [0; SIM_SPACE];
        for (byte, cell) in mem.iter_mut().zip(self.mem.iter()) {
            *byte = cell.get();
        }
        Snapshot { mem }
    }

    /// State of the simulated global interrupt flag.
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled.get()
    }

    /// Set or clear the global interrupt flag, like `sei`/`cli`.
    ///
    /// Enabling runs a pending interrupt routine.
    pub fn set_interrupts_enabled(&self, enabled: bool) {
        self.interrupts_enabled.set(enabled);
        if enabled && self.pending.replace(false) {
            self.run_isr();
        }
    }

    /// Number of register writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Number of times the interrupt routine has run.
    pub fn isr_runs(&self) -> usize {
        self.isr_runs.get()
    }

    /// Whether a raised interrupt is waiting for interrupts to be enabled.
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    fn raise(&self) {
        if self.isr.is_none() {
            return;
        }
        if self.interrupts_enabled.get() {
            self.run_isr();
        } else {
            self.pending.set(true);
        }
    }

    fn run_isr(&self) {
        if let Some(isr) = self.isr {
            self.isr_runs.set(self.isr_runs.get() + 1);
            isr(&self.snapshot());
        }
    }
}

impl RegisterAccess for SimBus<'_> {
    /// # Panics
    ///
    /// If `addr` lies outside of [`SIM_SPACE`].
    fn read8(&self, addr: Address) -> u8 {
        self.mem[addr].get()
    }

    /// # Panics
    ///
    /// If `addr` lies outside of [`SIM_SPACE`].
    fn write8(&self, addr: Address, value: u8) {
        self.mem[addr].set(value);
        self.writes.set(self.writes.get() + 1);
        self.raise();
    }
}

impl InterruptControl for SimBus<'_> {
    type RestoreState = bool;

    fn disable(&self) -> bool {
        self.interrupts_enabled.replace(false)
    }

    unsafe fn restore(&self, state: bool) {
        self.set_interrupts_enabled(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_with_interrupts_enabled() {
        let bus = SimBus::new();
        assert_eq!(bus.snapshot(), Snapshot { mem: [0; SIM_SPACE] });
        assert!(bus.interrupts_enabled());
        assert_eq!(bus.writes(), 0);
    }

    #[test]
    fn isr_runs_after_each_write_while_enabled() {
        let seen = Cell::new(0u8);
        let isr = |snapshot: &Snapshot| seen.set(snapshot.read8(0x10));
        let bus = SimBus::with_isr(&isr);

        bus.write8(0x10, 7);
        assert_eq!(seen.get(), 7);
        bus.write8(0x10, 9);
        assert_eq!(seen.get(), 9);
        assert_eq!(bus.isr_runs(), 2);
    }

    #[test]
    fn isr_is_deferred_while_masked() {
        let seen = Cell::new(0u16);
        let isr = |snapshot: &Snapshot| seen.set(snapshot.read16(0x86));
        let bus = SimBus::with_isr(&isr);

        let state = bus.disable();
        bus.write16(0x86, 0xFFFF);
        assert_eq!(bus.isr_runs(), 0);
        assert!(bus.is_pending());

        unsafe { bus.restore(state) };
        assert_eq!(bus.isr_runs(), 1);
        assert_eq!(seen.get(), 0xFFFF);
        assert!(!bus.is_pending());
    }

    #[test]
    fn diff_lists_changed_registers() {
        let bus = SimBus::new();
        let before = bus.snapshot();
        bus.write8(0x24, 0x20);
        bus.write8(0x80, 0x80);
        let after = bus.snapshot();

        let mut changed = after.diff(&before);
        assert_eq!(changed.next(), Some(0x24));
        assert_eq!(changed.next(), Some(0x80));
        assert_eq!(changed.next(), None);
    }
}
