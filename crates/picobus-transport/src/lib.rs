//! Two-wire bus transport abstraction.
//!
//! Provides the raw block transfer capability the exchange layer drives:
//! - Linux `/dev/i2c-N` character devices
//! - An in-memory simulated peripheral for tests and dry runs
//!
//! This is the lowest layer of picobus. Everything else builds on top of
//! the [`BusHandle`] trait provided here.

pub mod address;
pub mod error;
pub mod sim;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod linux;

pub use address::{PeripheralAddress, DEFAULT_ADDRESS};
pub use error::{Result, TransportError};
pub use sim::{pico_responder, ResponseHandler, SimulatedPeripheral};
pub use traits::BusHandle;

#[cfg(target_os = "linux")]
pub use linux::{device_path, LinuxI2cBus};
