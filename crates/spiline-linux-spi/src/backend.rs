//! Device backends
//!
//! [`LinuxSpi`](crate::LinuxSpi) talks to the kernel only through the
//! [`SpidevBackend`] trait. [`SpidevFile`] is the real implementation on top
//! of an open `/dev/spidevX.Y` descriptor.

use crate::ioctl::{
    request_dir, request_size, RequestCode, SpiIocTransfer, IOC_WRITE, SPI_IOC_TRANSFER_SIZE,
};

use nix::errno::Errno;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};

/// Typed ioctl argument
///
/// Each variant is a scratch value of the width the request code expects.
/// Read requests overwrite the value in place.
#[derive(Debug)]
pub enum IoctlArg<'a, 'b> {
    /// 8-bit field (mode, LSB-first, bits per word)
    Byte(&'a mut u8),
    /// 32-bit field (max speed, 32-bit mode)
    Word(&'a mut u32),
    /// Transfer segments for `SPI_IOC_MESSAGE(n)`
    Message(&'a [SpiIocTransfer<'b>]),
}

impl IoctlArg<'_, '_> {
    /// Number of bytes the kernel may access through this argument
    pub fn size(&self) -> usize {
        match self {
            IoctlArg::Byte(_) => std::mem::size_of::<u8>(),
            IoctlArg::Word(_) => std::mem::size_of::<u32>(),
            IoctlArg::Message(transfers) => transfers.len() * SPI_IOC_TRANSFER_SIZE,
        }
    }

    /// True if `request` encodes exactly this argument's width, and never
    /// asks the kernel to write into a shared transfer list
    pub fn fits(&self, request: RequestCode) -> bool {
        if request_size(request) != self.size() {
            return false;
        }
        match self {
            IoctlArg::Message(_) => request_dir(request) == IOC_WRITE,
            _ => true,
        }
    }
}

/// Operations a spidev descriptor has to support
pub trait SpidevBackend {
    /// Issue one device-control call
    fn ioctl(&mut self, request: RequestCode, arg: IoctlArg<'_, '_>) -> Result<(), Errno>;

    /// One raw `read(2)`; returns the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// One raw `write(2)`; returns the number of bytes written
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Release the descriptor, reporting any error from `close(2)`
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// An open spidev character device
#[derive(Debug)]
pub struct SpidevFile {
    file: File,
}

impl SpidevFile {
    /// Open `path` for reading and writing
    pub fn open(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Take a non-blocking exclusive advisory lock on the descriptor
    ///
    /// Fails with `EWOULDBLOCK` if another open file description holds it.
    pub fn try_lock_exclusive(&self) -> Result<(), Errno> {
        let ret = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        Errno::result(ret).map(drop)
    }
}

impl SpidevBackend for SpidevFile {
    fn ioctl(&mut self, request: RequestCode, arg: IoctlArg<'_, '_>) -> Result<(), Errno> {
        // The kernel trusts the size encoded in the request
        if !arg.fits(request) {
            return Err(Errno::EINVAL);
        }
        let fd = self.file.as_raw_fd();
        let ret = unsafe {
            match arg {
                IoctlArg::Byte(value) => libc::ioctl(fd, request as _, value as *mut u8),
                IoctlArg::Word(value) => libc::ioctl(fd, request as _, value as *mut u32),
                IoctlArg::Message(transfers) => {
                    libc::ioctl(fd, request as _, transfers.as_ptr())
                }
            }
        };
        Errno::result(ret).map(drop)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn close(self) -> io::Result<()> {
        nix::unistd::close(self.file.into_raw_fd())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioctl::{
        spi_ioc_message, TransferParams, SPI_IOC_RD_MAX_SPEED_HZ, SPI_IOC_RD_MODE,
        SPI_IOC_WR_MODE32,
    };

    const PARAMS: TransferParams = TransferParams {
        speed_hz: 1_000_000,
        delay_usecs: 0,
        bits_per_word: 8,
    };

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir()
                .join(format!("spiline-{}-backend-{}", std::process::id(), name));
            std::fs::write(&path, b"").unwrap();
            Self { path }
        }

        fn open(&self) -> SpidevFile {
            SpidevFile::open(self.path.to_str().unwrap()).unwrap()
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    #[test]
    fn test_arg_size() {
        let mut byte = 0u8;
        let mut word = 0u32;
        let mut buf = [0u8; 4];
        let xfer = [SpiIocTransfer::in_place(&mut buf, PARAMS).unwrap()];

        assert_eq!(IoctlArg::Byte(&mut byte).size(), 1);
        assert_eq!(IoctlArg::Word(&mut word).size(), 4);
        assert_eq!(IoctlArg::Message(&xfer).size(), SPI_IOC_TRANSFER_SIZE);
    }

    #[test]
    fn test_arg_fits_request() {
        let mut byte = 0u8;
        let mut word = 0u32;
        let mut buf = [0u8; 4];
        let xfer = [SpiIocTransfer::in_place(&mut buf, PARAMS).unwrap()];

        assert!(IoctlArg::Byte(&mut byte).fits(SPI_IOC_RD_MODE));
        assert!(!IoctlArg::Byte(&mut byte).fits(SPI_IOC_RD_MAX_SPEED_HZ));
        assert!(IoctlArg::Word(&mut word).fits(SPI_IOC_WR_MODE32));
        assert!(!IoctlArg::Word(&mut word).fits(SPI_IOC_RD_MODE));
        assert!(IoctlArg::Message(&xfer).fits(spi_ioc_message(1)));
        assert!(!IoctlArg::Message(&xfer).fits(spi_ioc_message(2)));
        assert!(!IoctlArg::Message(&xfer).fits(spi_ioc_message(0)));
        // Read-direction code of the right size
        let read_message = spi_ioc_message(1) ^ (0b11 << 30);
        assert!(!IoctlArg::Message(&xfer).fits(read_message));
    }

    #[test]
    fn test_mismatched_width_never_reaches_kernel() {
        let tmp = TempFile::new("width");
        let mut file = tmp.open();

        // A regular file answers every ioctl with ENOTTY; EINVAL means the
        // call was refused before the syscall.
        let mut byte = 0u8;
        assert_eq!(
            file.ioctl(SPI_IOC_RD_MAX_SPEED_HZ, IoctlArg::Byte(&mut byte)),
            Err(Errno::EINVAL)
        );
        let mut word = 0u32;
        assert_eq!(
            file.ioctl(SPI_IOC_RD_MODE, IoctlArg::Word(&mut word)),
            Err(Errno::EINVAL)
        );

        let mut buf = [0u8; 16];
        let xfer = [SpiIocTransfer::in_place(&mut buf, PARAMS).unwrap()];
        assert_eq!(
            file.ioctl(spi_ioc_message(2), IoctlArg::Message(&xfer)),
            Err(Errno::EINVAL)
        );

        // Matching widths get through to the kernel
        assert_eq!(
            file.ioctl(SPI_IOC_RD_MODE, IoctlArg::Byte(&mut byte)),
            Err(Errno::ENOTTY)
        );
        assert_eq!(
            file.ioctl(spi_ioc_message(1), IoctlArg::Message(&xfer)),
            Err(Errno::ENOTTY)
        );

        file.close().unwrap();
    }
}
