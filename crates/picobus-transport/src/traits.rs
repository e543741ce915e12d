use bytes::Bytes;

use crate::address::PeripheralAddress;
use crate::error::Result;

/// Raw block transfers against one two-wire bus.
///
/// Implementations perform each call as a single bus transaction addressed to
/// `address`. They do not retry; a failed transfer is reported as-is and the
/// caller decides what to do next.
///
/// A handle is exclusively owned: every method takes `&mut self`, and the bus
/// protocol is not safe for interleaved transactions from multiple callers.
pub trait BusHandle {
    /// Write `data` to the peripheral as one variable-length block.
    fn block_write(&mut self, address: PeripheralAddress, data: &[u8]) -> Result<()>;

    /// Read exactly `len` bytes from the peripheral as one block.
    fn block_read(&mut self, address: PeripheralAddress, len: usize) -> Result<Bytes>;
}

impl<B: BusHandle + ?Sized> BusHandle for &mut B {
    fn block_write(&mut self, address: PeripheralAddress, data: &[u8]) -> Result<()> {
        (**self).block_write(address, data)
    }

    fn block_read(&mut self, address: PeripheralAddress, len: usize) -> Result<Bytes> {
        (**self).block_read(address, len)
    }
}

impl<B: BusHandle + ?Sized> BusHandle for Box<B> {
    fn block_write(&mut self, address: PeripheralAddress, data: &[u8]) -> Result<()> {
        (**self).block_write(address, data)
    }

    fn block_read(&mut self, address: PeripheralAddress, len: usize) -> Result<Bytes> {
        (**self).block_read(address, len)
    }
}
