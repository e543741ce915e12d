use crate::outcome::TransportFailure;

/// Errors that can occur in exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The command could not be framed (caller contract violation).
    #[error("frame error: {0}")]
    Frame(#[from] picobus_frame::FrameError),

    /// A single bus transfer failed.
    #[error("{0}")]
    Transport(#[from] TransportFailure),

    /// Every attempt allowed by the retry policy hit a transport failure.
    #[error(
        "retries exhausted after {attempts} attempts (last: {})",
        last_failure(.failures)
    )]
    RetriesExhausted {
        attempts: u32,
        failures: Vec<TransportFailure>,
    },

    /// The session or retry configuration is unusable.
    #[error("invalid exchange config: {0}")]
    InvalidConfig(&'static str),
}

fn last_failure(failures: &[TransportFailure]) -> String {
    failures
        .last()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
