use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use crate::address::PeripheralAddress;
use crate::error::{Result, TransportError};
use crate::traits::BusHandle;

/// `I2C_SLAVE` request from `<linux/i2c-dev.h>`.
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Path of the i2c-dev character device for bus number `bus`.
pub fn device_path(bus: u8) -> PathBuf {
    PathBuf::from(format!("/dev/i2c-{bus}"))
}

/// Linux i2c-dev bus handle.
///
/// Each `block_write`/`block_read` is a single plain I2C transaction
/// (START - ADDR - DATA - STOP) issued through `write(2)`/`read(2)` on the
/// device node. The peripheral address is selected with the `I2C_SLAVE`
/// ioctl and cached until a different address is requested.
///
/// The device file is closed when the handle is dropped.
pub struct LinuxI2cBus {
    file: File,
    path: PathBuf,
    selected: Option<PeripheralAddress>,
}

impl LinuxI2cBus {
    /// Open `/dev/i2c-{bus}`.
    pub fn open(bus: u8) -> Result<Self> {
        Self::open_path(device_path(bus))
    }

    /// Open an explicit i2c-dev device node.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        info!(?path, "opened i2c bus");

        Ok(Self {
            file,
            path,
            selected: None,
        })
    }

    /// The device node backing this handle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn select(&mut self, address: PeripheralAddress) -> Result<()> {
        if self.selected == Some(address) {
            return Ok(());
        }

        // SAFETY: the descriptor is owned by `self.file` and open for the
        // duration of the call; I2C_SLAVE takes the address by value.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(address.get()),
            )
        };
        if rc < 0 {
            self.selected = None;
            return Err(TransportError::SelectAddress {
                address,
                source: std::io::Error::last_os_error(),
            });
        }

        debug!(%address, "selected peripheral");
        self.selected = Some(address);
        Ok(())
    }
}

impl BusHandle for LinuxI2cBus {
    fn block_write(&mut self, address: PeripheralAddress, data: &[u8]) -> Result<()> {
        self.select(address)?;
        let written = self
            .file
            .write(data)
            .map_err(|err| classify_io(address, err))?;
        if written != data.len() {
            return Err(TransportError::ShortTransfer {
                expected: data.len(),
                actual: written,
            });
        }
        debug!(%address, len = written, "block write");
        Ok(())
    }

    fn block_read(&mut self, address: PeripheralAddress, len: usize) -> Result<Bytes> {
        self.select(address)?;
        let mut buf = vec![0u8; len];
        let read = self
            .file
            .read(&mut buf)
            .map_err(|err| classify_io(address, err))?;
        if read != len {
            return Err(TransportError::ShortTransfer {
                expected: len,
                actual: read,
            });
        }
        debug!(%address, len, "block read");
        Ok(Bytes::from(buf))
    }
}

impl Drop for LinuxI2cBus {
    fn drop(&mut self) {
        debug!(path = ?self.path, "closing i2c bus");
    }
}

impl std::fmt::Debug for LinuxI2cBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxI2cBus")
            .field("path", &self.path)
            .field("selected", &self.selected)
            .finish()
    }
}

/// i2c-dev reports a missing acknowledgment as `EREMOTEIO` (or `ENXIO` on
/// some adapters).
fn classify_io(address: PeripheralAddress, err: std::io::Error) -> TransportError {
    match err.raw_os_error() {
        Some(libc::EREMOTEIO) | Some(libc::ENXIO) => TransportError::Nack { address },
        _ => TransportError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_path_uses_bus_number() {
        assert_eq!(device_path(1), PathBuf::from("/dev/i2c-1"));
        assert_eq!(device_path(12), PathBuf::from("/dev/i2c-12"));
    }

    #[test]
    fn open_missing_device_reports_path() {
        let err = LinuxI2cBus::open_path("/dev/picobus-does-not-exist").unwrap_err();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, PathBuf::from("/dev/picobus-does-not-exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn remote_io_maps_to_nack() {
        let address = PeripheralAddress::new(0x42).unwrap();
        let err = classify_io(address, std::io::Error::from_raw_os_error(libc::EREMOTEIO));
        assert!(matches!(err, TransportError::Nack { .. }));

        let err = classify_io(address, std::io::Error::from_raw_os_error(libc::EIO));
        assert!(matches!(err, TransportError::Io(_)));
    }
}
