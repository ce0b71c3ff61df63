//! SPI mode definitions
//!
//! The clock mode is the low two bits of the spidev mode field: bit 0 is
//! the clock phase (CPHA), bit 1 the clock polarity (CPOL). The remaining
//! bits are device flags that only the 32-bit mode field can carry in full.

use bitflags::bitflags;

/// SPI mode 0: CPOL=0, CPHA=0
pub const MODE_0: u8 = 0;
/// SPI mode 1: CPOL=0, CPHA=1
pub const MODE_1: u8 = SpiModeFlags::CPHA.bits() as u8;
/// SPI mode 2: CPOL=1, CPHA=0
pub const MODE_2: u8 = SpiModeFlags::CPOL.bits() as u8;
/// SPI mode 3: CPOL=1, CPHA=1
pub const MODE_3: u8 = (SpiModeFlags::CPOL.bits() | SpiModeFlags::CPHA.bits()) as u8;

bitflags! {
    /// spidev mode flags
    ///
    /// Bit assignments follow `<linux/spi/spidev.h>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiModeFlags: u32 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Chip select is active high
        const CS_HIGH   = 0x04;
        /// Least significant bit is shifted first
        const LSB_FIRST = 0x08;
        /// SI/SO signals shared
        const THREE_WIRE = 0x10;
        /// Loopback mode
        const LOOP      = 0x20;
        /// No chip select at all
        const NO_CS     = 0x40;
        /// Slave pulls low to pause
        const READY     = 0x80;
        /// Transmit with 2 wires
        const TX_DUAL   = 0x100;
        /// Transmit with 4 wires
        const TX_QUAD   = 0x200;
        /// Receive with 2 wires
        const RX_DUAL   = 0x400;
        /// Receive with 4 wires
        const RX_QUAD   = 0x800;

        /// Clock mode bits (CPOL | CPHA)
        const CLOCK_MODE = Self::CPOL.bits() | Self::CPHA.bits();
    }
}

impl Default for SpiModeFlags {
    fn default() -> Self {
        SpiModeFlags::empty()
    }
}

impl SpiModeFlags {
    /// Build flags from a plain clock mode (0-3)
    ///
    /// Bits above the clock mode are ignored.
    pub fn from_mode(mode: u8) -> Self {
        SpiModeFlags::from_bits_truncate(mode as u32) & SpiModeFlags::CLOCK_MODE
    }

    /// The clock mode (0-3) encoded in these flags
    pub fn clock_mode(self) -> u8 {
        (self & SpiModeFlags::CLOCK_MODE).bits() as u8
    }
}
