use std::time::Duration;

use picobus_transport::BusHandle;
use tracing::{error, warn};

use crate::error::{ExchangeError, Result};
use crate::outcome::{ExchangeOutcome, Phase, Response, TransportFailure};
use crate::session::Session;

/// Attempts per exchange before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Bounded retry for transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Fixed pause before each attempt after the first.
    pub backoff: Duration,
    /// After a failed read, only read again instead of re-sending the command.
    ///
    /// The command was already acknowledged, so re-sending it would deliver it
    /// twice. Disable for peripherals that only answer a fresh command.
    pub reread_on_receive_failure: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            reread_on_receive_failure: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ExchangeError::InvalidConfig(
                "retry max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A successful exchange and the failures it took to get there.
#[derive(Debug)]
pub struct RetryReport {
    pub response: Response,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// One entry per failed attempt, oldest first.
    pub failures: Vec<TransportFailure>,
}

impl<B: BusHandle> Session<B> {
    /// Run an exchange, retrying transport failures up to the policy budget.
    ///
    /// A failed send repeats the whole exchange. A failed receive either
    /// re-reads or repeats the whole exchange depending on
    /// [`RetryPolicy::reread_on_receive_failure`]. When the budget runs out
    /// the result is [`ExchangeError::RetriesExhausted`].
    pub fn exchange_with_retry(
        &mut self,
        message: impl AsRef<[u8]>,
        policy: &RetryPolicy,
    ) -> Result<RetryReport> {
        policy.validate()?;
        let message = message.as_ref();

        let mut failures = Vec::new();
        let mut needs_send = true;
        let mut attempts = 0u32;

        while attempts < policy.max_attempts {
            attempts += 1;
            if attempts > 1 && !policy.backoff.is_zero() {
                std::thread::sleep(policy.backoff);
            }

            let outcome = if needs_send {
                self.exchange(message)?
            } else {
                self.reread()?
            };

            match outcome.into_result() {
                Ok(response) => {
                    return Ok(RetryReport {
                        response,
                        attempts,
                        failures,
                    });
                }
                Err(failure) => {
                    warn!(
                        address = %self.address(),
                        attempt = attempts,
                        max_attempts = policy.max_attempts,
                        phase = %failure.phase,
                        error = %failure.error,
                        "transport failure"
                    );
                    needs_send =
                        !(failure.phase == Phase::Receive && policy.reread_on_receive_failure);
                    failures.push(failure);
                }
            }
        }

        error!(
            address = %self.address(),
            attempts,
            "giving up on exchange"
        );
        Err(ExchangeError::RetriesExhausted { attempts, failures })
    }

    fn reread(&mut self) -> Result<ExchangeOutcome> {
        match self.receive() {
            Ok(response) => Ok(response.into()),
            Err(ExchangeError::Transport(failure)) => Ok(failure.into()),
            Err(err) => Err(err),
        }
    }
}
