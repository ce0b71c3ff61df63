//! Software chip-select traits
//!
//! A spidev device normally drives its own chip-select. Boards that route
//! the peripheral's CS to an ordinary GPIO instead hand the driver an
//! [`OutputLine`], claimed from a [`ChipSelectController`], and the driver
//! asserts it around each transfer.

use crate::error::Result;

/// A claimed digital output line
///
/// `write(true)` asserts the line and `write(false)` deasserts it. Whether
/// asserted means a low or a high level is fixed when the line is claimed.
pub trait OutputLine: Send {
    /// Drive the line to its asserted (`true`) or deasserted (`false`) state
    fn write(&mut self, active: bool) -> Result<()>;
}

/// Source of claimable output lines
pub trait ChipSelectController {
    /// Claim `pin` as an output
    ///
    /// * `initial` - logical state the line starts in (`false` = deasserted)
    /// * `active_low` - asserted means a low level on the pin
    ///
    /// The returned line keeps the pin claimed until it is dropped.
    fn claim_output(
        &mut self,
        pin: u32,
        initial: bool,
        active_low: bool,
    ) -> Result<Box<dyn OutputLine>>;
}
