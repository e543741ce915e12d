use std::time::Duration;

use picobus_frame::{decode_frame, encode_message, FrameConfig, FrameError};
use picobus_transport::{BusHandle, PeripheralAddress};
use tracing::{debug, info};

use crate::error::{ExchangeError, Result};
use crate::outcome::{ExchangeOutcome, Phase, Response, TransportFailure};

/// Pause between the command write and the response read.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Protocol parameters for a session.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Response framing. `frame.max_len` must match the peripheral buffer.
    pub frame: FrameConfig,
    /// Time the peripheral gets to prepare its response. Default: 50 ms.
    pub settle_delay: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// An exclusive conversation with one peripheral.
///
/// The session owns the bus handle for its whole lifetime; dropping the
/// session (or calling [`Session::into_inner`]) releases it. Every call blocks
/// the calling thread until the bus transfers complete.
pub struct Session<B> {
    bus: B,
    address: PeripheralAddress,
    config: ExchangeConfig,
}

impl<B: BusHandle> Session<B> {
    /// Open a session with default protocol parameters.
    pub fn new(bus: B, address: PeripheralAddress) -> Self {
        Self::from_parts(bus, address, ExchangeConfig::default())
    }

    /// Open a session with explicit protocol parameters.
    pub fn with_config(bus: B, address: PeripheralAddress, config: ExchangeConfig) -> Result<Self> {
        config.frame.validate().map_err(|err| match err {
            FrameError::InvalidConfig(reason) => ExchangeError::InvalidConfig(reason),
            other => ExchangeError::Frame(other),
        })?;
        Ok(Self::from_parts(bus, address, config))
    }

    fn from_parts(bus: B, address: PeripheralAddress, config: ExchangeConfig) -> Self {
        info!(
            %address,
            max_len = config.frame.max_len,
            settle_ms = config.settle_delay.as_millis() as u64,
            "session opened"
        );
        Self {
            bus,
            address,
            config,
        }
    }

    /// Run one full exchange: send, settle, receive, classify.
    ///
    /// Transport failures come back as [`ExchangeOutcome::TransportError`] and
    /// are never retried here. Only framing contract violations (non-ASCII or
    /// oversized commands) return `Err`, and they do so before touching the
    /// bus.
    pub fn exchange(&mut self, message: impl AsRef<[u8]>) -> Result<ExchangeOutcome> {
        match self.send(message.as_ref()) {
            Ok(()) => {}
            Err(ExchangeError::Transport(failure)) => return Ok(failure.into()),
            Err(err) => return Err(err),
        }

        self.settle();

        match self.receive() {
            Ok(response) => Ok(response.into()),
            Err(ExchangeError::Transport(failure)) => Ok(failure.into()),
            Err(err) => Err(err),
        }
    }

    /// Encode and write a command without reading a response.
    pub fn send(&mut self, message: &[u8]) -> Result<()> {
        let encoded = encode_message(message, &self.config.frame)?;
        self.bus
            .block_write(self.address, &encoded)
            .map_err(|err| TransportFailure::new(Phase::Send, err))?;
        debug!(address = %self.address, len = encoded.len(), "command sent");
        Ok(())
    }

    /// Read one fixed-length frame and classify its payload.
    pub fn receive(&mut self) -> Result<Response> {
        let frame = self
            .bus
            .block_read(self.address, self.config.frame.max_len)
            .map_err(|err| TransportFailure::new(Phase::Receive, err))?;
        let payload = decode_frame(&frame, self.config.frame.strip);
        let response = Response::classify(payload);
        debug!(
            address = %self.address,
            frame_len = frame.len(),
            payload_len = payload.len(),
            kind = response.kind(),
            "response received"
        );
        Ok(response)
    }

    /// Block for the configured settle delay.
    pub fn settle(&self) {
        if !self.config.settle_delay.is_zero() {
            std::thread::sleep(self.config.settle_delay);
        }
    }

    /// The peripheral this session talks to.
    pub fn address(&self) -> PeripheralAddress {
        self.address
    }

    /// Current protocol parameters.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Borrow the underlying bus handle.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus handle.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// End the session and return the bus handle.
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use picobus_frame::{StripPolicy, MAX_FRAME_LEN, PAD_SENTINEL};
    use picobus_transport::{SimulatedPeripheral, TransportError};

    use super::*;

    fn addr() -> PeripheralAddress {
        PeripheralAddress::new(0x42).unwrap()
    }

    fn fast_config() -> ExchangeConfig {
        ExchangeConfig {
            settle_delay: Duration::ZERO,
            ..ExchangeConfig::default()
        }
    }

    fn session(sim: SimulatedPeripheral) -> Session<SimulatedPeripheral> {
        Session::with_config(sim, addr(), fast_config()).unwrap()
    }

    #[test]
    fn temp_command_decodes_padded_reply() {
        let sim = SimulatedPeripheral::new(addr())
            .with_fill(PAD_SENTINEL)
            .with_handler(|_| b"23.5C".to_vec());
        let mut session = session(sim);

        let outcome = session.exchange("TEMP").unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Decoded(ref text) if text == "23.5C"));
        assert_eq!(session.bus().writes()[0].as_ref(), b"TEMP");
    }

    #[test]
    fn write_length_is_message_length() {
        let mut session = session(SimulatedPeripheral::new(addr()));
        session.exchange("ID").unwrap();
        assert_eq!(session.bus().writes()[0].len(), 2);
    }

    #[test]
    fn all_idle_reply_is_empty() {
        let sim = SimulatedPeripheral::new(addr())
            .with_fill(0xFF)
            .with_handler(|_| Vec::new());
        let mut session = session(sim);
        assert!(matches!(session.exchange("X").unwrap(), ExchangeOutcome::Empty));
    }

    #[test]
    fn binary_reply_is_undecodable_with_raw_bytes() {
        let sim = SimulatedPeripheral::new(addr()).with_handler(|_| vec![0xC3, 0x28, 0x01]);
        let mut session = session(sim);
        match session.exchange("BIN").unwrap() {
            ExchangeOutcome::Undecodable(raw) => assert_eq!(raw.as_ref(), &[0xC3, 0x28, 0x01]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn pad_only_policy_keeps_idle_bytes() {
        let sim = SimulatedPeripheral::new(addr())
            .with_fill(0xFF)
            .with_handler(|_| b"HI".to_vec());
        let mut config = fast_config();
        config.frame.strip = StripPolicy::PadOnly;
        config.frame.max_len = 4;
        let mut session = Session::with_config(sim, addr(), config).unwrap();
        match session.exchange("HI").unwrap() {
            ExchangeOutcome::Undecodable(raw) => assert_eq!(raw.as_ref(), &[b'H', b'I', 0xFF, 0xFF]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn send_failure_skips_receive() {
        let mut sim = SimulatedPeripheral::new(addr());
        sim.fail_next_writes(1);
        let mut session = session(sim);

        match session.exchange("TEMP").unwrap() {
            ExchangeOutcome::TransportError(failure) => {
                assert_eq!(failure.phase, Phase::Send);
                assert!(matches!(failure.error, TransportError::Nack { .. }));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.bus().read_count(), 0);
    }

    #[test]
    fn receive_failure_is_reported_after_send() {
        let mut sim = SimulatedPeripheral::new(addr());
        sim.fail_next_reads(1);
        let mut session = session(sim);

        match session.exchange("TEMP").unwrap() {
            ExchangeOutcome::TransportError(failure) => assert_eq!(failure.phase, Phase::Receive),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.bus().writes().len(), 1);
    }

    #[test]
    fn non_ascii_command_never_reaches_the_bus() {
        let mut session = session(SimulatedPeripheral::new(addr()));
        let err = session.exchange("t\u{e9}mp").unwrap_err();
        assert!(matches!(err, ExchangeError::Frame(FrameError::NonAscii { .. })));
        assert!(session.bus().writes().is_empty());
    }

    #[test]
    fn oversized_command_is_rejected() {
        let mut session = session(SimulatedPeripheral::new(addr()));
        let err = session.exchange([b'A'; 40]).unwrap_err();
        assert!(matches!(err, ExchangeError::Frame(FrameError::MessageTooLong { .. })));
    }

    #[test]
    fn zero_max_len_is_rejected() {
        let mut config = fast_config();
        config.frame.max_len = 0;
        let err = Session::with_config(SimulatedPeripheral::new(addr()), addr(), config).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidConfig(_)));
    }

    #[test]
    fn max_len_beyond_driver_limit_is_rejected() {
        let mut config = fast_config();
        config.frame.max_len = usize::MAX;
        let err = Session::with_config(SimulatedPeripheral::new(addr()), addr(), config).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidConfig(_)));

        let mut config = fast_config();
        config.frame.max_len = MAX_FRAME_LEN + 1;
        assert!(Session::with_config(SimulatedPeripheral::new(addr()), addr(), config).is_err());
    }

    #[test]
    fn settle_delay_separates_write_and_read() {
        let config = ExchangeConfig {
            settle_delay: Duration::from_millis(30),
            ..ExchangeConfig::default()
        };
        let mut session = Session::with_config(SimulatedPeripheral::new(addr()), addr(), config).unwrap();

        let start = Instant::now();
        let outcome = session.exchange("TEMP").unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(matches!(outcome, ExchangeOutcome::Decoded(ref t) if t == "TEMP"));
    }

    #[test]
    fn send_failure_skips_settle_delay() {
        let mut sim = SimulatedPeripheral::new(addr());
        sim.fail_next_writes(1);
        let config = ExchangeConfig {
            settle_delay: Duration::from_secs(5),
            ..ExchangeConfig::default()
        };
        let mut session = Session::with_config(sim, addr(), config).unwrap();

        let start = Instant::now();
        assert!(session.exchange("TEMP").unwrap().is_transport_error());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn new_session_uses_default_protocol_parameters() {
        let mut session = Session::new(SimulatedPeripheral::new(addr()), addr());
        assert_eq!(session.config().settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(session.config().frame.max_len, 32);
        assert_eq!(session.address(), addr());

        let start = Instant::now();
        session.exchange("ID").unwrap();
        assert!(start.elapsed() >= DEFAULT_SETTLE_DELAY);
    }

    #[test]
    fn bus_mut_reaches_the_owned_handle() {
        let mut session = session(SimulatedPeripheral::new(addr()));
        assert!(!session.exchange("ok").unwrap().is_transport_error());

        session.bus_mut().fail_next_reads(1);
        let outcome = session.exchange("again").unwrap();
        assert!(outcome.is_transport_error());
        assert_eq!(session.bus().writes().len(), 2);
    }

    #[test]
    fn exchanges_are_independent() {
        let mut session = session(SimulatedPeripheral::new(addr()));
        assert!(matches!(session.exchange("one").unwrap(), ExchangeOutcome::Decoded(ref t) if t == "one"));
        assert!(matches!(session.exchange("two").unwrap(), ExchangeOutcome::Decoded(ref t) if t == "two"));
        let sim = session.into_inner();
        assert_eq!(sim.writes().len(), 2);
        assert_eq!(sim.read_count(), 2);
    }
}
