//! Error types for chip-select lines

use thiserror::Error;

/// Boxed backend error carried as the source of a [`ChipSelectError`]
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a chip-select controller or one of its lines
#[derive(Debug, Error)]
pub enum ChipSelectError {
    /// The pin could not be claimed as a digital output
    #[error("Failed to claim GPIO {pin} as chip-select output: {source}")]
    Claim {
        /// Pin number that was requested
        pin: u32,
        /// Backend error
        #[source]
        source: BoxedSource,
    },

    /// Driving the line to a new level failed
    #[error("Failed to drive chip-select GPIO {pin}: {source}")]
    Write {
        /// Pin number of the line
        pin: u32,
        /// Backend error
        #[source]
        source: BoxedSource,
    },
}

impl ChipSelectError {
    /// Pin number the error refers to
    pub fn pin(&self) -> u32 {
        match self {
            ChipSelectError::Claim { pin, .. } | ChipSelectError::Write { pin, .. } => *pin,
        }
    }
}

/// Result type for chip-select operations
pub type Result<T> = std::result::Result<T, ChipSelectError>;
