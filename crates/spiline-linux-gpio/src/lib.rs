//! spiline-linux-gpio - Linux GPIO chip-select support
//!
//! This crate lets a spidev device use an ordinary GPIO as its chip-select,
//! using the Linux character device GPIO interface (gpiocdev).
//!
//! # Overview
//!
//! Some boards wire a peripheral's CS# to a GPIO instead of one of the SPI
//! controller's native chip-selects. [`GpioChipSelect`] claims that GPIO as
//! an active-low output; `spiline-linux-spi` then asserts it around every
//! transfer. The line stays claimed until the SPI device is closed, which
//! keeps other users off it.
//!
//! # Example
//!
//! ```no_run
//! use spiline_linux_gpio::GpioChipSelect;
//! use spiline_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let mut cs = GpioChipSelect::new("/dev/gpiochip0");
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_chip_select(25);
//! let mut spi = LinuxSpi::open_with_chip_select(&config, &mut cs)?;
//!
//! let mut buf = [0x9F, 0, 0, 0];
//! spi.transfer_in_place(&mut buf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;

// Re-exports
pub use device::{chip_path, GpioChipSelect, GpioLine};
