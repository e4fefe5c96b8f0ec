//! Register modifying support
//!
//! Every register access of this crate goes through [`RegisterAccess`], so the
//! driver can run against real memory mapped I/O ([`Mmio`]) as well as against
//! a simulated register space ([`crate::sim::SimBus`]).

use core::ptr;

/// Data-space address of an 8-bit register.
///
/// 16-bit registers are addressed by their low byte, the high byte lives at
/// `address + 1`.
pub type Address = usize;

/// Byte wide access to a register space.
///
/// Implementors only need to provide [`read8`](RegisterAccess::read8) and
/// [`write8`](RegisterAccess::write8). The provided 16-bit accessors follow the
/// AVR TEMP latch protocol and must therefore only be used inside an atomic
/// section, see [`crate::interrupt`].
pub trait RegisterAccess {
    /// Read the byte at `addr`.
    fn read8(&self, addr: Address) -> u8;

    /// Write `value` to the byte at `addr`.
    fn write8(&self, addr: Address, value: u8);

    /// Read-modify-write the byte at `addr`.
    #[inline]
    fn modify8<F>(&self, addr: Address, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read8(addr);
        self.write8(addr, f(value));
    }

    /// Read a 16-bit register.
    ///
    /// The low byte is read first, which latches the high byte.
    #[inline]
    fn read16(&self, addr: Address) -> u16 {
        let low = self.read8(addr);
        let high = self.read8(addr + 1);
        u16::from_le_bytes([low, high])
    }

    /// Write a 16-bit register.
    ///
    /// The high byte is written first, the write of the low byte commits both.
    #[inline]
    fn write16(&self, addr: Address, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write8(addr + 1, high);
        self.write8(addr, low);
    }
}

impl<T> RegisterAccess for &T
where
    T: RegisterAccess + ?Sized,
{
    #[inline]
    fn read8(&self, addr: Address) -> u8 {
        T::read8(self, addr)
    }

    #[inline]
    fn write8(&self, addr: Address, value: u8) {
        T::write8(self, addr, value)
    }
}

/// A contiguous bit field inside an 8-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    offset: u8,
    width: u8,
}

impl Field {
    /// A field of `width` bits starting at bit `offset`.
    ///
    /// # Panics
    ///
    /// If the field is empty or does not fit into 8 bits. In a `const` this is
    /// a compile time error.
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width > 0 && width <= 8, "field width out of range");
        assert!(offset <= 8 - width, "field exceeds the register");
        Field { offset, width }
    }

    /// Position of the least significant bit.
    #[inline]
    pub const fn offset(self) -> u8 {
        self.offset
    }

    /// Number of bits.
    #[inline]
    pub const fn width(self) -> u8 {
        self.width
    }

    /// A single bit field.
    pub const fn bit(offset: u8) -> Self {
        Field::new(offset, 1)
    }

    /// Mask of the field, in register position.
    #[inline]
    pub const fn mask(self) -> u8 {
        (u8::MAX >> (8 - self.width)) << self.offset
    }

    /// Replace the field inside `register` with `value`.
    ///
    /// Bits of `value` beyond the field width are dropped.
    #[inline]
    pub const fn insert(self, register: u8, value: u8) -> u8 {
        register & !self.mask() | (value << self.offset) & self.mask()
    }

    /// Extract the field from `register`.
    #[inline]
    pub const fn extract(self, register: u8) -> u8 {
        (register & self.mask()) >> self.offset
    }
}

/// Volatile access to the memory mapped I/O space.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Access the memory mapped registers of the running device.
    ///
    /// # Safety
    ///
    /// Every address handed to this backend must be a valid register of the
    /// device the code runs on, and the caller must own the peripherals it
    /// configures through it for the lifetime of the program.
    pub const unsafe fn new() -> Self {
        Mmio { _private: () }
    }
}

impl RegisterAccess for Mmio {
    #[inline]
    fn read8(&self, addr: Address) -> u8 {
        // SAFETY: validity of `addr` is guaranteed by the contract of `Mmio::new`.
        unsafe { ptr::read_volatile(addr as *const u8) }
    }

    #[inline]
    fn write8(&self, addr: Address, value: u8) {
        // SAFETY: validity of `addr` is guaranteed by the contract of `Mmio::new`.
        unsafe { ptr::write_volatile(addr as *mut u8, value) }
    }
}
