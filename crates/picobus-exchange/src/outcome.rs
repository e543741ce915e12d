use std::fmt;

use bytes::Bytes;
use picobus_transport::TransportError;

/// Which half of an exchange a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The block write carrying the command.
    Send,
    /// The fixed-length block read of the response.
    Receive,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Send => "send",
            Phase::Receive => "receive",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bus-level failure, tagged with the phase it interrupted.
#[derive(Debug, thiserror::Error)]
#[error("{phase} failed: {error}")]
pub struct TransportFailure {
    pub phase: Phase,
    #[source]
    pub error: TransportError,
}

impl TransportFailure {
    pub fn new(phase: Phase, error: TransportError) -> Self {
        Self { phase, error }
    }
}

/// A response recovered from the peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The stripped payload is valid UTF-8 text.
    Decoded(String),
    /// Nothing but filler came back.
    Empty,
    /// Payload bytes that are not valid text, kept verbatim.
    Undecodable(Bytes),
}

impl Response {
    /// Classify a payload that already had its filler stripped.
    pub fn classify(payload: &[u8]) -> Self {
        if payload.is_empty() {
            return Response::Empty;
        }
        match std::str::from_utf8(payload) {
            Ok(text) => Response::Decoded(text.to_string()),
            Err(_) => Response::Undecodable(Bytes::copy_from_slice(payload)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Response::Decoded(_) => "decoded",
            Response::Empty => "empty",
            Response::Undecodable(_) => "undecodable",
        }
    }

    /// Raw payload bytes (empty for [`Response::Empty`]).
    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Decoded(text) => text.as_bytes(),
            Response::Empty => &[],
            Response::Undecodable(raw) => raw.as_ref(),
        }
    }
}

/// Result of one full send + settle + receive cycle.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Decoded(String),
    Empty,
    Undecodable(Bytes),
    TransportError(TransportFailure),
}

impl ExchangeOutcome {
    /// Split into the response or the transport failure.
    pub fn into_result(self) -> Result<Response, TransportFailure> {
        match self {
            ExchangeOutcome::Decoded(text) => Ok(Response::Decoded(text)),
            ExchangeOutcome::Empty => Ok(Response::Empty),
            ExchangeOutcome::Undecodable(raw) => Ok(Response::Undecodable(raw)),
            ExchangeOutcome::TransportError(failure) => Err(failure),
        }
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, ExchangeOutcome::TransportError(_))
    }
}

impl From<Response> for ExchangeOutcome {
    fn from(response: Response) -> Self {
        match response {
            Response::Decoded(text) => ExchangeOutcome::Decoded(text),
            Response::Empty => ExchangeOutcome::Empty,
            Response::Undecodable(raw) => ExchangeOutcome::Undecodable(raw),
        }
    }
}

impl From<TransportFailure> for ExchangeOutcome {
    fn from(failure: TransportFailure) -> Self {
        ExchangeOutcome::TransportError(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_empty_payload() {
        assert_eq!(Response::classify(b""), Response::Empty);
    }

    #[test]
    fn classify_text_payload() {
        assert_eq!(
            Response::classify(b"23.5C"),
            Response::Decoded("23.5C".to_string())
        );
    }

    #[test]
    fn classify_invalid_utf8_keeps_raw_bytes() {
        let response = Response::classify(&[0xC3, 0x28]);
        assert_eq!(
            response,
            Response::Undecodable(Bytes::from_static(&[0xC3, 0x28]))
        );
        assert_eq!(response.payload(), &[0xC3, 0x28]);
    }

    #[test]
    fn outcome_splits_into_response_or_failure() {
        let ok = ExchangeOutcome::Decoded("hi".to_string()).into_result();
        assert_eq!(ok.unwrap(), Response::Decoded("hi".to_string()));

        let failure = TransportFailure::new(
            Phase::Receive,
            TransportError::ShortTransfer {
                expected: 32,
                actual: 0,
            },
        );
        let err = ExchangeOutcome::from(failure).into_result().unwrap_err();
        assert_eq!(err.phase, Phase::Receive);
        assert_eq!(err.to_string(), "receive failed: short transfer (0 of 32 bytes)");
    }

    #[test]
    fn only_transport_failures_report_as_transport_errors() {
        assert!(!ExchangeOutcome::Empty.is_transport_error());
        assert!(!ExchangeOutcome::Decoded("ok".to_string()).is_transport_error());
        assert!(!ExchangeOutcome::Undecodable(Bytes::from_static(&[0xFE])).is_transport_error());

        let failure = TransportFailure::new(
            Phase::Send,
            TransportError::ShortTransfer {
                expected: 4,
                actual: 1,
            },
        );
        assert!(ExchangeOutcome::from(failure).is_transport_error());
    }
}
