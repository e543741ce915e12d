use std::path::PathBuf;

use crate::address::PeripheralAddress;

/// Errors that can occur in bus transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the bus device node.
    #[error("failed to open bus device {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to select the peripheral address on the bus device.
    #[error("failed to select peripheral {address}: {source}")]
    SelectAddress {
        address: PeripheralAddress,
        source: std::io::Error,
    },

    /// The addressed peripheral did not acknowledge the transfer.
    #[error("no acknowledgment from peripheral {address}")]
    Nack { address: PeripheralAddress },

    /// The bus moved fewer bytes than requested.
    #[error("short transfer ({actual} of {expected} bytes)")]
    ShortTransfer { expected: usize, actual: usize },

    /// An I/O error occurred on the bus device.
    #[error("bus I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value is not a valid 7-bit peripheral address.
    #[error("invalid 7-bit peripheral address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
