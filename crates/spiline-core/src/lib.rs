//! spiline-core - Shared vocabulary for spiline
//!
//! This crate holds the pieces that both the spidev driver and the
//! chip-select backends need to agree on:
//!
//! - [`mode`] - SPI clock mode values and the full set of spidev mode flags
//! - [`chip_select`] - the traits a software chip-select line implements
//! - [`error`] - errors raised while claiming or driving such a line
//!
//! # Example
//!
//! ```
//! use spiline_core::mode::{SpiModeFlags, MODE_3};
//!
//! let flags = SpiModeFlags::from_mode(MODE_3) | SpiModeFlags::LSB_FIRST;
//! assert_eq!(flags.clock_mode(), MODE_3);
//! assert!(flags.contains(SpiModeFlags::CPOL | SpiModeFlags::CPHA));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip_select;
pub mod error;
pub mod mode;

// Re-exports
pub use chip_select::{ChipSelectController, OutputLine};
pub use error::{ChipSelectError, Result};
pub use mode::SpiModeFlags;
