//! Command/response exchanges with a peripheral.
//!
//! This is the "just works" layer. Open a [`Session`] over a bus handle, hand
//! it a command, and get back the classified response. Transport failures are
//! reported, never retried inside a single exchange; [`RetryPolicy`] layers a
//! bounded retry loop on top.

pub mod error;
pub mod outcome;
pub mod retry;
pub mod session;

pub use error::{ExchangeError, Result};
pub use outcome::{ExchangeOutcome, Phase, Response, TransportFailure};
pub use retry::{RetryPolicy, RetryReport, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
pub use session::{ExchangeConfig, Session, DEFAULT_SETTLE_DELAY};
