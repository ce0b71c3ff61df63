//! spiline-linux-spi - Linux spidev support
//!
//! This crate provides blocking access to one SPI chip-select through the
//! `/dev/spidevX.Y` character device interface.
//!
//! # Overview
//!
//! The Linux SPI driver exposes SPI controllers through character devices
//! at `/dev/spidevX.Y` where X is the bus number and Y is the chip select.
//! Configuration (clock mode, bit order, word size, maximum speed) and
//! full-duplex transfers all go through ioctls on that device; the
//! [`ioctl`] module encodes them and [`LinuxSpi`] issues them.
//!
//! Opening a device takes an exclusive `flock` on it, so a second process
//! (or a second handle in the same process) gets
//! [`LinuxSpiError::DeviceBusy`] until the first one is closed. Boards that
//! route chip-select to a plain GPIO can pass a
//! [`ChipSelectController`](spiline_core::ChipSelectController) instead;
//! the line is then asserted around every transfer and the lock is skipped.
//!
//! # Example
//!
//! ```no_run
//! use spiline_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(4_000_000);
//! let mut spi = LinuxSpi::open(&config)?;
//! spi.set_mode(spiline_core::mode::MODE_0)?;
//!
//! // Read JEDEC ID
//! let send = [0x9F, 0, 0, 0];
//! let mut recv = [0u8; 4];
//! spi.transfer(&send, &mut recv)?;
//! println!("JEDEC ID: {:02X} {:02X} {:02X}", recv[1], recv[2], recv[3]);
//!
//! spi.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - May require adding user to `spi` group or using udev rules

pub mod backend;
pub mod device;
pub mod error;
pub mod ioctl;

// Re-exports
pub use backend::{IoctlArg, SpidevBackend, SpidevFile};
pub use device::{LinuxSpi, LinuxSpiConfig, DEFAULT_SPEED_HZ};
pub use error::{LinuxSpiError, Result};
