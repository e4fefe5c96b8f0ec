//! # Register maps
//!
//! Description of a 16-bit timer/counter peripheral: where its registers live
//! and how its fields are encoded. The driver never hard-codes an address, so
//! retargeting to a different timer instance is a matter of passing a different
//! [`TimerMap`].
//!
//! The bundled maps cover the four 16-bit timers of the ATmega640/1280/2560.

use crate::reg::{Address, Field};

/// Clock select, `TCCRnB[2:0]`.
pub const CS: Field = Field::new(0, 3);
/// Waveform generation mode bits 1:0, `TCCRnA[1:0]`.
pub const WGM_LOW: Field = Field::new(0, 2);
/// Waveform generation mode bits 3:2, `TCCRnB[4:3]`.
pub const WGM_HIGH: Field = Field::new(3, 2);
/// Compare output mode of channel A, `TCCRnA[7:6]`.
pub const COM_A: Field = Field::new(6, 2);
/// Compare output mode of channel B, `TCCRnA[5:4]`.
pub const COM_B: Field = Field::new(4, 2);
/// Compare output mode of channel C, `TCCRnA[3:2]`.
pub const COM_C: Field = Field::new(2, 2);

/// Clock source of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    /// No clock source, the counter is stopped.
    Stopped = 0b000,
    Div1 = 0b001,
    Div8 = 0b010,
    Div64 = 0b011,
    Div256 = 0b100,
    Div1024 = 0b101,
    /// External clock on the Tn pin, falling edge.
    ExternalFalling = 0b110,
    /// External clock on the Tn pin, rising edge.
    ExternalRising = 0b111,
}

impl Prescaler {
    /// Encoding of the `CS` field.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the `CS` field. Bits above the field are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Prescaler::Stopped,
            0b001 => Prescaler::Div1,
            0b010 => Prescaler::Div8,
            0b011 => Prescaler::Div64,
            0b100 => Prescaler::Div256,
            0b101 => Prescaler::Div1024,
            0b110 => Prescaler::ExternalFalling,
            _ => Prescaler::ExternalRising,
        }
    }

    /// Clock divisor, `None` when the counter is stopped or externally clocked.
    pub const fn divisor(self) -> Option<u32> {
        match self {
            Prescaler::Div1 => Some(1),
            Prescaler::Div8 => Some(8),
            Prescaler::Div64 => Some(64),
            Prescaler::Div256 => Some(256),
            Prescaler::Div1024 => Some(1024),
            Prescaler::Stopped | Prescaler::ExternalFalling | Prescaler::ExternalRising => None,
        }
    }
}

/// Waveform generation mode of a 16-bit timer, the 4-bit `WGM` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WaveformMode {
    Normal = 0,
    PhaseCorrect8Bit = 1,
    PhaseCorrect9Bit = 2,
    PhaseCorrect10Bit = 3,
    /// Clear timer on compare match, TOP = OCRnA.
    CtcOcr = 4,
    Fast8Bit = 5,
    Fast9Bit = 6,
    Fast10Bit = 7,
    /// Phase and frequency correct PWM, TOP = ICRn.
    PhaseFrequencyCorrectIcr = 8,
    /// Phase and frequency correct PWM, TOP = OCRnA.
    PhaseFrequencyCorrectOcr = 9,
    /// Phase correct PWM, TOP = ICRn.
    PhaseCorrectIcr = 10,
    /// Phase correct PWM, TOP = OCRnA.
    PhaseCorrectOcr = 11,
    /// Clear timer on compare match, TOP = ICRn.
    CtcIcr = 12,
    Reserved = 13,
    /// Fast PWM, TOP = ICRn.
    FastIcr = 14,
    /// Fast PWM, TOP = OCRnA.
    FastOcr = 15,
}

impl WaveformMode {
    /// The 4-bit `WGM` value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// `WGMn1:0`, stored in `TCCRnA`.
    #[inline]
    pub const fn low_bits(self) -> u8 {
        self.bits() & 0b11
    }

    /// `WGMn3:2`, stored in `TCCRnB`.
    #[inline]
    pub const fn high_bits(self) -> u8 {
        self.bits() >> 2
    }

    /// Reassemble the mode from the two halves kept in `TCCRnA` and `TCCRnB`.
    pub const fn from_registers(tccra: u8, tccrb: u8) -> Self {
        match WGM_HIGH.extract(tccrb) << 2 | WGM_LOW.extract(tccra) {
            0 => WaveformMode::Normal,
            1 => WaveformMode::PhaseCorrect8Bit,
            2 => WaveformMode::PhaseCorrect9Bit,
            3 => WaveformMode::PhaseCorrect10Bit,
            4 => WaveformMode::CtcOcr,
            5 => WaveformMode::Fast8Bit,
            6 => WaveformMode::Fast9Bit,
            7 => WaveformMode::Fast10Bit,
            8 => WaveformMode::PhaseFrequencyCorrectIcr,
            9 => WaveformMode::PhaseFrequencyCorrectOcr,
            10 => WaveformMode::PhaseCorrectIcr,
            11 => WaveformMode::PhaseCorrectOcr,
            12 => WaveformMode::CtcIcr,
            13 => WaveformMode::Reserved,
            14 => WaveformMode::FastIcr,
            _ => WaveformMode::FastOcr,
        }
    }
}

/// Action of a compare output pin on compare match.
///
/// The names describe the PWM modes; in phase correct counting the first
/// action applies while counting up and the second while counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CompareOutputMode {
    /// Normal port operation, the pin is not driven by the timer.
    Disconnected = 0b00,
    Toggle = 0b01,
    /// Clear on match while up-counting, set on match while down-counting.
    ClearUpSetDown = 0b10,
    /// Set on match while up-counting, clear on match while down-counting.
    SetUpClearDown = 0b11,
}

impl CompareOutputMode {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a 2-bit `COMnx` field.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => CompareOutputMode::Disconnected,
            0b01 => CompareOutputMode::Toggle,
            0b10 => CompareOutputMode::ClearUpSetDown,
            _ => CompareOutputMode::SetUpClearDown,
        }
    }
}

/// Hardware resources bound to one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap {
    /// 16-bit output compare register `OCRnx`.
    pub ocr: Address,
    /// Data direction register of the port carrying the `OCnx` pin.
    pub ddr: Address,
    /// Pin number inside the port.
    pub pin: u8,
    /// Compare output mode field inside `TCCRnA`.
    pub com: Field,
}

impl ChannelMap {
    /// Direction bit of the pin inside its DDR.
    ///
    /// # Panics
    ///
    /// If `pin` is not a bit of an 8-bit port.
    #[inline]
    pub const fn pin_mask(&self) -> u8 {
        assert!(self.pin < 8, "pin outside of the port");
        1 << self.pin
    }
}

/// Register map of one 16-bit timer/counter with three compare channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerMap {
    pub tccra: Address,
    pub tccrb: Address,
    pub tccrc: Address,
    /// 16-bit counter `TCNTn`.
    pub tcnt: Address,
    /// 16-bit input capture register `ICRn`, used as TOP.
    pub icr: Address,
    /// Channels A, B and C in that order.
    pub channels: [ChannelMap; 3],
}

macro_rules! timer_map {
    ($({
        $TIMERX:ident: (
            $X:literal,
            base: $base:literal,
            ddr: $ddr:literal,
            port: $port:literal,
            pins: [$pa:literal, $pb:literal, $pc:literal]
        ),
    },)+) => {
        $(
            #[doc = concat!(
                "Timer/Counter", $X, ", outputs on P", $port, $pa,
                ", P", $port, $pb, " and P", $port, $pc, "."
            )]
            pub const $TIMERX: TimerMap = TimerMap {
                tccra: $base,
                tccrb: $base + 0x01,
                tccrc: $base + 0x02,
                tcnt: $base + 0x04,
                icr: $base + 0x06,
                channels: [
                    ChannelMap { ocr: $base + 0x08, ddr: $ddr, pin: $pa, com: COM_A },
                    ChannelMap { ocr: $base + 0x0A, ddr: $ddr, pin: $pb, com: COM_B },
                    ChannelMap { ocr: $base + 0x0C, ddr: $ddr, pin: $pc, com: COM_C },
                ],
            };
        )+
    };
}

timer_map! {
    { TIMER1: (1, base: 0x80, ddr: 0x24, port: "B", pins: [5, 6, 7]), },
    { TIMER3: (3, base: 0x90, ddr: 0x2D, port: "E", pins: [3, 4, 5]), },
    { TIMER4: (4, base: 0xA0, ddr: 0x101, port: "H", pins: [3, 4, 5]), },
    { TIMER5: (5, base: 0x120, ddr: 0x10A, port: "L", pins: [3, 4, 5]), },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer1_layout() {
        assert_eq!(TIMER1.tccra, 0x80);
        assert_eq!(TIMER1.tccrb, 0x81);
        assert_eq!(TIMER1.tccrc, 0x82);
        assert_eq!(TIMER1.tcnt, 0x84);
        assert_eq!(TIMER1.icr, 0x86);
        assert_eq!(TIMER1.channels[0].ocr, 0x88);
        assert_eq!(TIMER1.channels[1].ocr, 0x8A);
        assert_eq!(TIMER1.channels[2].ocr, 0x8C);
        for (channel, pin) in TIMER1.channels.iter().zip([5, 6, 7]) {
            assert_eq!(channel.ddr, 0x24);
            assert_eq!(channel.pin, pin);
        }
    }

    #[test]
    fn timer5_lives_in_extended_io() {
        assert_eq!(TIMER5.tccra, 0x120);
        assert_eq!(TIMER5.icr, 0x126);
        assert_eq!(TIMER5.channels[2].ocr, 0x12C);
        assert_eq!(TIMER5.channels[0].ddr, 0x10A);
    }

    #[test]
    #[should_panic(expected = "pin outside of the port")]
    fn pin_mask_rejects_pins_beyond_the_port() {
        let channel = ChannelMap {
            pin: 8,
            ..TIMER1.channels[0]
        };
        channel.pin_mask();
    }

    #[test]
    fn clear_up_set_down_is_the_com1x1_bit() {
        let set = |field: Field| field.insert(0, CompareOutputMode::ClearUpSetDown.bits());
        assert_eq!(set(COM_A), 0x80);
        assert_eq!(set(COM_B), 0x20);
        assert_eq!(set(COM_C), 0x08);
    }

    #[test]
    fn phase_frequency_correct_icr_is_wgm13_only() {
        let mode = WaveformMode::PhaseFrequencyCorrectIcr;
        assert_eq!(mode.low_bits(), 0);
        assert_eq!(WGM_HIGH.insert(0, mode.high_bits()), 0x10);
        assert_eq!(WaveformMode::from_registers(0, 0x10), mode);
    }

    #[test]
    fn mode_split_across_both_control_registers() {
        // WGM = 0b1110, fast PWM with TOP = ICRn
        assert_eq!(
            WaveformMode::from_registers(0b0000_0010, 0b0001_1000),
            WaveformMode::FastIcr
        );
        // unrelated bits do not leak in
        assert_eq!(
            WaveformMode::from_registers(0b1010_1000, 0b1100_0111),
            WaveformMode::Normal
        );
    }

    #[test]
    fn prescaler_encoding() {
        assert_eq!(Prescaler::Div1024.bits(), 0b101);
        assert_eq!(Prescaler::from_bits(0b1111_1101), Prescaler::Div1024);
        assert_eq!(Prescaler::Div1024.divisor(), Some(1024));
        assert_eq!(Prescaler::Stopped.divisor(), None);
        assert_eq!(Prescaler::ExternalRising.divisor(), None);
    }

    #[test]
    fn compare_output_decoding() {
        assert_eq!(
            CompareOutputMode::from_bits(COM_B.extract(0x20)),
            CompareOutputMode::ClearUpSetDown
        );
        assert_eq!(
            CompareOutputMode::from_bits(0b1111_1100),
            CompareOutputMode::Disconnected
        );
    }
}
