//! Linux spidev ioctl encoding
//!
//! Request codes and the `spi_ioc_transfer` control block from
//! `<linux/spi/spidev.h>`. Nothing in here performs I/O; the codes and
//! descriptors are handed to a [`SpidevBackend`](crate::backend::SpidevBackend).

use std::marker::PhantomData;

/// Numeric ioctl request code
pub type RequestCode = u32;

// SPI ioctl magic number
const SPI_IOC_MAGIC: u8 = b'k';

// _IOC() field layout, for decoding
const IOC_NRSHIFT: u32 = 0;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_SIZEMASK: u32 = (1 << 14) - 1;

/// Direction bits: userspace writes, kernel reads
pub const IOC_WRITE: u32 = 1;
/// Direction bits: kernel writes, userspace reads
pub const IOC_READ: u32 = 2;

// SPI ioctl type numbers
const SPI_IOC_TYPE_MESSAGE: u8 = 0;
const SPI_IOC_TYPE_MODE: u8 = 1;
const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;
const SPI_IOC_TYPE_MODE32: u8 = 5;

const fn ior<T>(nr: u8) -> RequestCode {
    nix::request_code_read!(SPI_IOC_MAGIC, nr, std::mem::size_of::<T>()) as RequestCode
}

const fn iow<T>(nr: u8) -> RequestCode {
    nix::request_code_write!(SPI_IOC_MAGIC, nr, std::mem::size_of::<T>()) as RequestCode
}

/// Read SPI clock mode (limited to 8 bits)
pub const SPI_IOC_RD_MODE: RequestCode = ior::<u8>(SPI_IOC_TYPE_MODE);
/// Write SPI clock mode (limited to 8 bits)
pub const SPI_IOC_WR_MODE: RequestCode = iow::<u8>(SPI_IOC_TYPE_MODE);

/// Read SPI bit justification
pub const SPI_IOC_RD_LSB_FIRST: RequestCode = ior::<u8>(SPI_IOC_TYPE_LSB_FIRST);
/// Write SPI bit justification
pub const SPI_IOC_WR_LSB_FIRST: RequestCode = iow::<u8>(SPI_IOC_TYPE_LSB_FIRST);

/// Read SPI device word length (1..N)
pub const SPI_IOC_RD_BITS_PER_WORD: RequestCode = ior::<u8>(SPI_IOC_TYPE_BITS_PER_WORD);
/// Write SPI device word length (1..N)
pub const SPI_IOC_WR_BITS_PER_WORD: RequestCode = iow::<u8>(SPI_IOC_TYPE_BITS_PER_WORD);

/// Read SPI device default max speed in Hz
pub const SPI_IOC_RD_MAX_SPEED_HZ: RequestCode = ior::<u32>(SPI_IOC_TYPE_MAX_SPEED_HZ);
/// Write SPI device default max speed in Hz
pub const SPI_IOC_WR_MAX_SPEED_HZ: RequestCode = iow::<u32>(SPI_IOC_TYPE_MAX_SPEED_HZ);

/// Read the full 32-bit SPI mode field
pub const SPI_IOC_RD_MODE32: RequestCode = ior::<u32>(SPI_IOC_TYPE_MODE32);
/// Write the full 32-bit SPI mode field
pub const SPI_IOC_WR_MODE32: RequestCode = iow::<u32>(SPI_IOC_TYPE_MODE32);

/// Size of `struct spi_ioc_transfer`
pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

const _: () = assert!(std::mem::size_of::<SpiIocTransfer<'static>>() == SPI_IOC_TRANSFER_SIZE);

/// Request code for `SPI_IOC_MESSAGE(n)`
///
/// `_IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])`.
/// Each extra segment adds `SPI_IOC_TRANSFER_SIZE << 16` to the base code.
pub const fn spi_ioc_message(n: u8) -> RequestCode {
    nix::request_code_write!(
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MESSAGE,
        (n as usize) * SPI_IOC_TRANSFER_SIZE
    ) as RequestCode
}

/// Direction bits of a request code ([`IOC_READ`] / [`IOC_WRITE`])
pub const fn request_dir(request: RequestCode) -> u32 {
    request >> IOC_DIRSHIFT
}

/// Command number of a request code
pub const fn request_nr(request: RequestCode) -> u8 {
    (request >> IOC_NRSHIFT) as u8
}

/// Payload size in bytes encoded in a request code
pub const fn request_size(request: RequestCode) -> usize {
    ((request >> IOC_SIZESHIFT) & IOC_SIZEMASK) as usize
}

/// Symbolic name of a spidev request code, for diagnostics
pub fn request_name(request: RequestCode) -> &'static str {
    match request {
        SPI_IOC_RD_MODE => "SPI_IOC_RD_MODE",
        SPI_IOC_WR_MODE => "SPI_IOC_WR_MODE",
        SPI_IOC_RD_LSB_FIRST => "SPI_IOC_RD_LSB_FIRST",
        SPI_IOC_WR_LSB_FIRST => "SPI_IOC_WR_LSB_FIRST",
        SPI_IOC_RD_BITS_PER_WORD => "SPI_IOC_RD_BITS_PER_WORD",
        SPI_IOC_WR_BITS_PER_WORD => "SPI_IOC_WR_BITS_PER_WORD",
        SPI_IOC_RD_MAX_SPEED_HZ => "SPI_IOC_RD_MAX_SPEED_HZ",
        SPI_IOC_WR_MAX_SPEED_HZ => "SPI_IOC_WR_MAX_SPEED_HZ",
        SPI_IOC_RD_MODE32 => "SPI_IOC_RD_MODE32",
        SPI_IOC_WR_MODE32 => "SPI_IOC_WR_MODE32",
        r if request_nr(r) == SPI_IOC_TYPE_MESSAGE && request_dir(r) == IOC_WRITE => {
            "SPI_IOC_MESSAGE"
        }
        _ => "unknown ioctl",
    }
}

/// Per-transfer parameters copied into every descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    /// Clock rate for this exchange
    pub speed_hz: u32,
    /// Delay after the last bit before chip-select changes
    pub delay_usecs: u16,
    /// Word size
    pub bits_per_word: u8,
}

/// SPI transfer structure for ioctl
///
/// This must match the kernel's `struct spi_ioc_transfer` layout. The
/// buffer addresses are borrowed from the slices the descriptor was built
/// from, so the descriptor cannot outlive them.
#[repr(C)]
#[derive(Debug)]
pub struct SpiIocTransfer<'a> {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
    _buffers: PhantomData<&'a mut [u8]>,
}

impl<'a> SpiIocTransfer<'a> {
    fn new(tx: *const u8, rx: *mut u8, len: usize, params: TransferParams) -> Self {
        Self {
            tx_buf: tx as u64,
            rx_buf: rx as u64,
            len: len as u32,
            speed_hz: params.speed_hz,
            delay_usecs: params.delay_usecs,
            bits_per_word: params.bits_per_word,
            cs_change: 0,
            tx_nbits: 0,
            rx_nbits: 0,
            word_delay_usecs: 0,
            _pad: 0,
            _buffers: PhantomData,
        }
    }

    /// Full-duplex exchange: clock out `send` while filling `receive`
    ///
    /// Returns `None` unless both slices have the same length and that
    /// length fits the 32-bit `len` field.
    pub fn full_duplex(
        send: &'a [u8],
        receive: &'a mut [u8],
        params: TransferParams,
    ) -> Option<Self> {
        if send.len() != receive.len() || u32::try_from(send.len()).is_err() {
            return None;
        }
        Some(Self::new(
            send.as_ptr(),
            receive.as_mut_ptr(),
            send.len(),
            params,
        ))
    }

    /// Exchange that overwrites `buf` with the received bytes
    ///
    /// Returns `None` if `buf` is too long for the 32-bit `len` field.
    pub fn in_place(buf: &'a mut [u8], params: TransferParams) -> Option<Self> {
        let len = buf.len();
        u32::try_from(len).ok()?;
        let ptr = buf.as_mut_ptr();
        Some(Self::new(ptr, ptr, len, params))
    }

    /// Number of bytes exchanged
    pub fn len(&self) -> u32 {
        self.len
    }

    /// True if the descriptor moves no data
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clock rate for this exchange
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Word size for this exchange
    pub fn bits_per_word(&self) -> u8 {
        self.bits_per_word
    }

    /// Delay after the exchange in microseconds
    pub fn delay_usecs(&self) -> u16 {
        self.delay_usecs
    }

    /// True if transmit and receive address the same buffer
    pub fn is_in_place(&self) -> bool {
        self.tx_buf == self.rx_buf
    }

    #[cfg(test)]
    pub(crate) fn tx_ptr(&self) -> *const u8 {
        self.tx_buf as usize as *const u8
    }

    #[cfg(test)]
    pub(crate) fn rx_ptr(&self) -> *mut u8 {
        self.rx_buf as usize as *mut u8
    }
}
