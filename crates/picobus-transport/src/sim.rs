//! In-memory simulated peripheral.
//!
//! Behaves like a peripheral with a fixed-size response buffer: every block
//! write is handed to a response handler, and the next block read returns the
//! handler's answer padded with the fill byte to the requested length. Faults
//! can be injected on either direction to exercise retry handling.

use bytes::Bytes;
use tracing::debug;

use crate::address::PeripheralAddress;
use crate::error::{Result, TransportError};
use crate::traits::BusHandle;

/// Computes the response buffer contents for a received command.
pub type ResponseHandler = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    Next(u32),
    Always,
}

impl Fault {
    /// Consume one scheduled failure; returns true if this transfer fails.
    fn trip(&mut self) -> bool {
        match self {
            Fault::None => false,
            Fault::Always => true,
            Fault::Next(remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    *self = Fault::None;
                }
                true
            }
        }
    }
}

/// A simulated peripheral attached to its own private bus.
pub struct SimulatedPeripheral {
    address: PeripheralAddress,
    fill: u8,
    handler: ResponseHandler,
    response: Option<Vec<u8>>,
    writes: Vec<Bytes>,
    reads: usize,
    write_fault: Fault,
    read_fault: Fault,
}

impl SimulatedPeripheral {
    /// Peripheral at `address` that echoes every command back.
    pub fn new(address: PeripheralAddress) -> Self {
        Self {
            address,
            fill: 0x00,
            handler: Box::new(|command| command.to_vec()),
            response: None,
            writes: Vec::new(),
            reads: 0,
            write_fault: Fault::None,
            read_fault: Fault::None,
        }
    }

    /// Peripheral at `address` answering like the reference Pico firmware.
    ///
    /// See [`pico_responder`].
    pub fn pico(address: PeripheralAddress) -> Self {
        Self::new(address).with_handler(pico_responder(23.5, *b"\xE6\x61\x41\x04\x03\x5B\x2A\x2C"))
    }

    /// Replace the response handler.
    pub fn with_handler(mut self, handler: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Byte used to pad responses (and returned before any command arrives).
    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    /// Fail the next `count` block writes with a missing acknowledgment.
    pub fn fail_next_writes(&mut self, count: u32) {
        self.write_fault = if count == 0 {
            Fault::None
        } else {
            Fault::Next(count)
        };
    }

    /// Fail the next `count` block reads with a missing acknowledgment.
    pub fn fail_next_reads(&mut self, count: u32) {
        self.read_fault = if count == 0 {
            Fault::None
        } else {
            Fault::Next(count)
        };
    }

    /// Fail every block write from now on.
    pub fn fail_all_writes(&mut self) {
        self.write_fault = Fault::Always;
    }

    /// Fail every block read from now on.
    pub fn fail_all_reads(&mut self) {
        self.read_fault = Fault::Always;
    }

    /// Stop injecting faults.
    pub fn clear_faults(&mut self) {
        self.write_fault = Fault::None;
        self.read_fault = Fault::None;
    }

    /// Every successfully delivered write, oldest first.
    pub fn writes(&self) -> &[Bytes] {
        &self.writes
    }

    /// Number of successful block reads.
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// The address this peripheral answers on.
    pub fn address(&self) -> PeripheralAddress {
        self.address
    }

    fn check_address(&self, address: PeripheralAddress) -> Result<()> {
        if address != self.address {
            return Err(TransportError::Nack { address });
        }
        Ok(())
    }
}

impl BusHandle for SimulatedPeripheral {
    fn block_write(&mut self, address: PeripheralAddress, data: &[u8]) -> Result<()> {
        self.check_address(address)?;
        if self.write_fault.trip() {
            debug!(%address, "simulated write fault");
            return Err(TransportError::Nack { address });
        }

        self.writes.push(Bytes::copy_from_slice(data));
        self.response = Some((self.handler)(data));
        debug!(%address, len = data.len(), "simulated block write");
        Ok(())
    }

    fn block_read(&mut self, address: PeripheralAddress, len: usize) -> Result<Bytes> {
        self.check_address(address)?;
        if self.read_fault.trip() {
            debug!(%address, "simulated read fault");
            return Err(TransportError::Nack { address });
        }

        let mut frame = vec![self.fill; len];
        if let Some(response) = &self.response {
            let n = response.len().min(len);
            frame[..n].copy_from_slice(&response[..n]);
        }
        self.reads += 1;
        debug!(%address, len, "simulated block read");
        Ok(Bytes::from(frame))
    }
}

impl std::fmt::Debug for SimulatedPeripheral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPeripheral")
            .field("address", &self.address)
            .field("fill", &self.fill)
            .field("writes", &self.writes.len())
            .field("reads", &self.reads)
            .finish()
    }
}

/// Response handler mirroring the reference peripheral firmware.
///
/// - `TEMP` answers the temperature in degrees Celsius, e.g. `23.5C`
/// - `ID` answers the unique board identifier as upper-case hex
/// - anything else answers the previous message (the first one is echoed)
pub fn pico_responder(temperature_c: f32, uid: [u8; 8]) -> impl FnMut(&[u8]) -> Vec<u8> + Send {
    let mut last: Option<Vec<u8>> = None;
    move |command: &[u8]| match command {
        b"TEMP" => format!("{temperature_c:.1}C").into_bytes(),
        b"ID" => uid.iter().map(|b| format!("{b:02X}")).collect::<String>().into_bytes(),
        other => {
            let reply = last.take().unwrap_or_else(|| other.to_vec());
            last = Some(other.to_vec());
            reply
        }
    }
}
