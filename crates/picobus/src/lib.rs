//! Command/response exchanges with two-wire (I2C) peripherals.
//!
//! picobus sends short ASCII commands to a peripheral, waits for it to settle,
//! and reads back a fixed-size, sentinel-padded response buffer.
//!
//! # Crate Structure
//!
//! - [`transport`]: Bus handle abstraction (Linux i2c-dev, simulated peripheral)
//! - [`frame`]: Fixed-length framing and sentinel stripping
//! - [`exchange`]: Send/settle/receive sessions with bounded retry

/// Re-export transport types.
pub mod transport {
    pub use picobus_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use picobus_frame::*;
}

/// Re-export exchange types.
pub mod exchange {
    pub use picobus_exchange::*;
}
