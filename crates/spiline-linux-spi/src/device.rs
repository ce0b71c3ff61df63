//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct, a blocking handle on one
//! spidev chip-select. Every configuration accessor is a single ioctl and a
//! transfer is a single `SPI_IOC_MESSAGE(1)`, optionally bracketed by a
//! software chip-select line.

use crate::backend::{IoctlArg, SpidevBackend, SpidevFile};
use crate::error::{LinuxSpiError, Result};
use crate::ioctl::{self, RequestCode, SpiIocTransfer, TransferParams};

use nix::errno::Errno;
use spiline_core::{ChipSelectController, OutputLine, SpiModeFlags};

/// Default SPI clock speed in Hz (1 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// Default word size
pub const DEFAULT_BITS_PER_WORD: u8 = 8;

/// Default delay after each transfer in microseconds
pub const DEFAULT_DELAY_USECS: u16 = 0;

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz used for transfers (default: 1 MHz)
    pub speed_hz: u32,
    /// GPIO used as a software chip-select instead of the controller's own
    pub chip_select: Option<u32>,
    /// Word size put in every transfer descriptor (default: 8)
    pub bits_per_word: u8,
    /// Delay after every transfer in microseconds (default: 0)
    pub delay_usecs: u16,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            chip_select: None,
            bits_per_word: DEFAULT_BITS_PER_WORD,
            delay_usecs: DEFAULT_DELAY_USECS,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Drive chip-select through the given GPIO
    pub fn with_chip_select(mut self, pin: u32) -> Self {
        self.chip_select = Some(pin);
        self
    }

    /// Set the per-transfer word size
    pub fn with_bits_per_word(mut self, bits: u8) -> Self {
        self.bits_per_word = bits;
        self
    }

    /// Set the per-transfer delay in microseconds
    pub fn with_delay_usecs(mut self, delay_usecs: u16) -> Self {
        self.delay_usecs = delay_usecs;
        self
    }
}

/// Linux SPI device using the spidev interface
///
/// The device is either open or closed. Once [`close`](Self::close) has
/// been called every operation fails with [`LinuxSpiError::UseAfterClose`].
/// Dropping an open device releases the descriptor without reporting errors.
pub struct LinuxSpi<B: SpidevBackend = SpidevFile> {
    /// Open descriptor, `None` once closed
    backend: Option<B>,
    /// Device path, for diagnostics
    path: String,
    /// Clock rate for transfers
    speed_hz: u32,
    bits_per_word: u8,
    delay_usecs: u16,
    /// Software chip-select, if the device is not using its own
    chip_select: Option<Box<dyn OutputLine>>,
}

impl LinuxSpi<SpidevFile> {
    /// Open a Linux SPI device with the given configuration
    ///
    /// The device is locked exclusively so no other process can use the
    /// same chip-select concurrently. A configuration naming a custom
    /// chip-select pin must be opened with
    /// [`open_with_chip_select`](Self::open_with_chip_select).
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        Self::open_inner(config, None)
    }

    /// Open a device, claiming `config.chip_select` from `controller`
    ///
    /// With a custom chip-select the exclusive lock is skipped; ownership of
    /// the GPIO line is what keeps other users off the peripheral.
    pub fn open_with_chip_select(
        config: &LinuxSpiConfig,
        controller: &mut dyn ChipSelectController,
    ) -> Result<Self> {
        Self::open_inner(config, Some(controller))
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    fn open_inner(
        config: &LinuxSpiConfig,
        controller: Option<&mut dyn ChipSelectController>,
    ) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = SpidevFile::open(&config.device).map_err(|e| LinuxSpiError::OpenFailed {
            path: config.device.clone(),
            source: e,
        })?;

        let chip_select = match (config.chip_select, controller) {
            (None, _) => {
                if let Err(errno) = file.try_lock_exclusive() {
                    discard(file, &config.device);
                    return Err(if errno == Errno::EWOULDBLOCK {
                        LinuxSpiError::DeviceBusy {
                            path: config.device.clone(),
                        }
                    } else {
                        LinuxSpiError::OpenFailed {
                            path: config.device.clone(),
                            source: errno.into(),
                        }
                    });
                }
                None
            }
            (Some(pin), Some(controller)) => {
                // Claimed deasserted; CS lines are active low
                match controller.claim_output(pin, false, true) {
                    Ok(line) => Some(line),
                    Err(e) => {
                        discard(file, &config.device);
                        return Err(e.into());
                    }
                }
            }
            (Some(pin), None) => {
                discard(file, &config.device);
                return Err(LinuxSpiError::InvalidParameter(format!(
                    "chip-select GPIO {} requires a chip-select controller",
                    pin
                )));
            }
        };

        log::info!(
            "linux_spi: Opened {} (speed={} kHz, cs={})",
            config.device,
            config.speed_hz / 1000,
            match config.chip_select {
                Some(pin) => format!("gpio{}", pin),
                None => "native".to_string(),
            }
        );

        Ok(Self::from_backend(file, config, chip_select))
    }
}

impl<B: SpidevBackend> LinuxSpi<B> {
    /// Wrap an already open backend
    ///
    /// No locking or chip-select claiming is done; `chip_select`, if given,
    /// must already be claimed and deasserted.
    pub fn from_backend(
        backend: B,
        config: &LinuxSpiConfig,
        chip_select: Option<Box<dyn OutputLine>>,
    ) -> Self {
        Self {
            backend: Some(backend),
            path: config.device.clone(),
            speed_hz: config.speed_hz,
            bits_per_word: config.bits_per_word,
            delay_usecs: config.delay_usecs,
            chip_select,
        }
    }

    /// Device path this handle was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True until [`close`](Self::close) succeeds or fails
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// True if transfers are bracketed by a software chip-select
    pub fn has_chip_select(&self) -> bool {
        self.chip_select.is_some()
    }

    /// Clock rate used for transfers
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Release the descriptor and any claimed chip-select line
    ///
    /// The device is closed afterwards even if `close(2)` reports an error.
    pub fn close(&mut self) -> Result<()> {
        let backend = self.backend.take().ok_or(LinuxSpiError::UseAfterClose)?;
        self.chip_select = None;
        backend.close().map_err(LinuxSpiError::CloseFailed)?;
        log::debug!("linux_spi: Closed {}", self.path);
        Ok(())
    }

    /// Full-duplex transfer
    ///
    /// Clocks out `send` while filling `receive`. Both buffers must be
    /// non-empty and of the same length.
    pub fn transfer(&mut self, send: &[u8], receive: &mut [u8]) -> Result<()> {
        let (send_len, receive_len) = (send.len(), receive.len());
        check_transfer_len(send_len, receive_len)?;
        let xfer = SpiIocTransfer::full_duplex(send, receive, self.params()).ok_or(
            LinuxSpiError::LengthMismatch {
                send: send_len,
                receive: receive_len,
            },
        )?;
        self.submit(&xfer)
    }

    /// Transfer that replaces the contents of `buf` with the received bytes
    pub fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        check_transfer_len(len, len)?;
        let xfer = SpiIocTransfer::in_place(buf, self.params()).ok_or_else(|| {
            LinuxSpiError::InvalidParameter(format!("transfer of {len} bytes is too long"))
        })?;
        self.submit(&xfer)
    }

    fn params(&self) -> TransferParams {
        TransferParams {
            speed_hz: self.speed_hz,
            delay_usecs: self.delay_usecs,
            bits_per_word: self.bits_per_word,
        }
    }

    fn submit(&mut self, xfer: &SpiIocTransfer<'_>) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(LinuxSpiError::UseAfterClose)?;
        let request = ioctl::spi_ioc_message(1);
        let message = IoctlArg::Message(std::slice::from_ref(xfer));

        let Some(cs) = self.chip_select.as_mut() else {
            return backend
                .ioctl(request, message)
                .map_err(|errno| LinuxSpiError::Ioctl { request, errno });
        };

        cs.write(true)?;
        let result = backend
            .ioctl(request, message)
            .map_err(|errno| LinuxSpiError::Ioctl { request, errno });
        let deassert = cs.write(false);

        match (result, deassert) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cs_err)) => {
                log::error!("linux_spi: {}: {}", self.path, cs_err);
                Err(e)
            }
        }
    }

    /// Read the SPI clock mode (0-3, plus any low device flags)
    pub fn mode(&mut self) -> Result<u8> {
        self.ioctl_u8(ioctl::SPI_IOC_RD_MODE, 0)
    }

    /// Set the SPI clock mode
    pub fn set_mode(&mut self, mode: u8) -> Result<()> {
        self.ioctl_u8(ioctl::SPI_IOC_WR_MODE, mode)?;
        log::debug!("linux_spi: Set mode to {}", mode);
        Ok(())
    }

    /// Read the full 32-bit mode field
    pub fn mode32(&mut self) -> Result<SpiModeFlags> {
        let bits = self.ioctl_u32(ioctl::SPI_IOC_RD_MODE32, 0)?;
        Ok(SpiModeFlags::from_bits_retain(bits))
    }

    /// Write the full 32-bit mode field
    pub fn set_mode32(&mut self, flags: SpiModeFlags) -> Result<()> {
        self.ioctl_u32(ioctl::SPI_IOC_WR_MODE32, flags.bits())?;
        log::debug!("linux_spi: Set mode flags to {:?}", flags);
        Ok(())
    }

    /// True if words are shifted least significant bit first
    pub fn lsb_first(&mut self) -> Result<bool> {
        Ok(self.ioctl_u8(ioctl::SPI_IOC_RD_LSB_FIRST, 0)? != 0)
    }

    /// Select LSB-first or MSB-first bit order
    pub fn set_lsb_first(&mut self, lsb_first: bool) -> Result<()> {
        self.ioctl_u8(ioctl::SPI_IOC_WR_LSB_FIRST, lsb_first as u8)?;
        Ok(())
    }

    /// Read the device word size
    pub fn bits_per_word(&mut self) -> Result<u8> {
        self.ioctl_u8(ioctl::SPI_IOC_RD_BITS_PER_WORD, 0)
    }

    /// Set the device word size (the kernel rejects unsupported sizes)
    pub fn set_bits_per_word(&mut self, bits: u8) -> Result<()> {
        self.ioctl_u8(ioctl::SPI_IOC_WR_BITS_PER_WORD, bits)?;
        Ok(())
    }

    /// Read the device's default maximum clock speed in Hz
    pub fn max_speed(&mut self) -> Result<u32> {
        self.ioctl_u32(ioctl::SPI_IOC_RD_MAX_SPEED_HZ, 0)
    }

    /// Set the maximum clock speed; later transfers run at this speed
    pub fn set_max_speed(&mut self, speed_hz: u32) -> Result<()> {
        self.ioctl_u32(ioctl::SPI_IOC_WR_MAX_SPEED_HZ, speed_hz)?;
        self.speed_hz = speed_hz;
        log::debug!("linux_spi: Set speed to {} Hz", speed_hz);
        Ok(())
    }

    /// Read from the device until `buf` is full
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(LinuxSpiError::UseAfterClose)?;
        let mut off = 0;
        while off < buf.len() {
            let n = backend
                .read(&mut buf[off..])
                .map_err(LinuxSpiError::ReadFailed)?;
            if n == 0 {
                return Err(LinuxSpiError::ShortRead {
                    read: off,
                    expected: buf.len(),
                });
            }
            off += n;
        }
        Ok(())
    }

    /// Write all of `buf` with a single `write(2)`
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(LinuxSpiError::UseAfterClose)?;
        let n = backend.write(buf).map_err(LinuxSpiError::WriteFailed)?;
        if n != buf.len() {
            return Err(LinuxSpiError::ShortWrite {
                written: n,
                expected: buf.len(),
            });
        }
        Ok(())
    }

    fn ioctl_u8(&mut self, request: RequestCode, value: u8) -> Result<u8> {
        let mut scratch = value;
        self.ioctl(request, IoctlArg::Byte(&mut scratch))?;
        Ok(scratch)
    }

    fn ioctl_u32(&mut self, request: RequestCode, value: u32) -> Result<u32> {
        let mut scratch = value;
        self.ioctl(request, IoctlArg::Word(&mut scratch))?;
        Ok(scratch)
    }

    fn ioctl(&mut self, request: RequestCode, arg: IoctlArg<'_, '_>) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(LinuxSpiError::UseAfterClose)?;
        backend
            .ioctl(request, arg)
            .map_err(|errno| LinuxSpiError::Ioctl { request, errno })
    }
}

/// Both buffers must be non-empty, equally long, and fit the `len` field
fn check_transfer_len(send: usize, receive: usize) -> Result<()> {
    if send != receive || send == 0 {
        return Err(LinuxSpiError::LengthMismatch { send, receive });
    }
    if u32::try_from(send).is_err() {
        return Err(LinuxSpiError::InvalidParameter(format!(
            "transfer of {} bytes is too long",
            send
        )));
    }
    Ok(())
}

/// Close a descriptor on a failure path; the caller's error is the one returned
fn discard(file: SpidevFile, path: &str) {
    if let Err(e) = file.close() {
        log::warn!("linux_spi: Failed to close {}: {}", path, e);
    }
}
