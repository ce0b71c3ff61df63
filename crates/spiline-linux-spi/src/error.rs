//! Error types for Linux SPI operations

use crate::ioctl::{request_name, RequestCode};

use nix::errno::Errno;
use spiline_core::ChipSelectError;
use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open or lock the device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The device is locked by another owner
    #[error("{path}: device is in use")]
    DeviceBusy { path: String },

    /// Claiming or driving the custom chip-select failed
    #[error("Chip-select failed: {0}")]
    ChipSelectFailed(#[from] ChipSelectError),

    /// Send and receive buffers differ in length, or are empty
    #[error("Transfer length mismatch: send {send} bytes, receive {receive} bytes")]
    LengthMismatch { send: usize, receive: usize },

    /// A raw write accepted fewer bytes than requested
    #[error("Wrote {written} bytes instead of {expected}")]
    ShortWrite { written: usize, expected: usize },

    /// The device reported end of file before the buffer was filled
    #[error("Read {read} bytes instead of {expected}")]
    ShortRead { read: usize, expected: usize },

    /// A device-control call failed
    #[error("{} ({request:#010x}) failed: {errno}", request_name(*request))]
    Ioctl { request: RequestCode, errno: Errno },

    /// Raw read failed
    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Raw write failed
    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Releasing the descriptor failed
    #[error("Close failed: {0}")]
    CloseFailed(#[source] std::io::Error),

    /// Operation on a device that has been closed
    #[error("Device has already been closed")]
    UseAfterClose,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

impl LinuxSpiError {
    /// OS error number behind a failed device-control call
    pub fn errno(&self) -> Option<Errno> {
        match self {
            LinuxSpiError::Ioctl { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
