//! Linux GPIO chip-select implementation
//!
//! This module provides `GpioChipSelect`, a `ChipSelectController` that
//! claims lines through Linux's GPIO character device interface (gpiocdev).

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use spiline_core::{ChipSelectController, ChipSelectError, OutputLine};

/// Default consumer label shown in `gpioinfo`
const DEFAULT_CONSUMER: &str = "spiline";

/// Highest chip number accepted in the short `N` form
const MAX_GPIOCHIP: u32 = 9;

/// Logical line value for an asserted/deasserted state
fn level(active: bool) -> Value {
    if active {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// Resolve a GPIO chip argument to a device path
///
/// Accepts either a chip number (`"0"` becomes `/dev/gpiochip0`) or a path.
pub fn chip_path(chip: &str) -> std::result::Result<String, String> {
    if chip.is_empty() {
        return Err("No GPIO chip specified. Use /dev/gpiochipN or N".to_string());
    }
    match chip.parse::<u32>() {
        Ok(n) if n > MAX_GPIOCHIP => {
            Err(format!("Maximum gpiochip number supported is {}", MAX_GPIOCHIP))
        }
        Ok(n) => Ok(format!("/dev/gpiochip{}", n)),
        Err(_) => Ok(chip.to_string()),
    }
}

/// Chip-select controller backed by a `/dev/gpiochipN` device
#[derive(Debug, Clone)]
pub struct GpioChipSelect {
    /// Device path (e.g., "/dev/gpiochip0")
    chip: String,
    /// Consumer label for claimed lines
    consumer: String,
}

impl GpioChipSelect {
    /// Create a controller for the given GPIO chip path
    pub fn new(chip: impl Into<String>) -> Self {
        Self {
            chip: chip.into(),
            consumer: DEFAULT_CONSUMER.to_string(),
        }
    }

    /// Set the consumer label for claimed lines
    pub fn with_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = consumer.into();
        self
    }

    /// GPIO chip path lines are claimed from
    pub fn chip(&self) -> &str {
        &self.chip
    }

    /// Line configuration for a chip-select output
    fn line_config(pin: Offset, initial: bool, active_low: bool) -> Config {
        let mut cfg = Config::default();
        cfg.with_line(pin);
        if active_low {
            cfg.as_active_low();
        }
        cfg.as_output(level(initial));
        cfg
    }
}

impl ChipSelectController for GpioChipSelect {
    fn claim_output(
        &mut self,
        pin: u32,
        initial: bool,
        active_low: bool,
    ) -> spiline_core::Result<Box<dyn OutputLine>> {
        log::debug!(
            "linux_gpio: Claiming {} line {} (active_low={})",
            self.chip,
            pin,
            active_low
        );

        let request = Request::from_config(Self::line_config(pin, initial, active_low))
            .on_chip(&self.chip)
            .with_consumer(self.consumer.as_str())
            .request()
            .map_err(|e| ChipSelectError::Claim {
                pin,
                source: Box::new(e),
            })?;

        log::info!("linux_gpio: Using {} line {} as chip-select", self.chip, pin);

        Ok(Box::new(GpioLine { request, pin }))
    }
}

/// A claimed chip-select line; released when dropped
pub struct GpioLine {
    request: Request,
    pin: Offset,
}

impl OutputLine for GpioLine {
    fn write(&mut self, active: bool) -> spiline_core::Result<()> {
        self.request
            .set_value(self.pin, level(active))
            .map_err(|e| ChipSelectError::Write {
                pin: self.pin,
                source: Box::new(e),
            })?;
        Ok(())
    }
}
