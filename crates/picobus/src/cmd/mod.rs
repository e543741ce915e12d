use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use picobus_exchange::{ExchangeConfig, RetryPolicy, Session};
use picobus_frame::{FrameConfig, StripPolicy, DEFAULT_MAX_LEN};
use picobus_transport::{BusHandle, PeripheralAddress, SimulatedPeripheral};

use crate::exit::{exchange_error, CliResult};
use crate::output::OutputFormat;

pub mod doctor;
pub mod poll;
pub mod repl;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one command and print the response.
    Send(SendArgs),
    /// Read commands from stdin and exchange them one by one.
    Repl(ReplArgs),
    /// Repeat a write/read cycle on a fixed interval.
    Poll(PollArgs),
    /// Check that the bus device is usable.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, bus: &BusArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, bus, format),
        Command::Repl(args) => repl::run(args, bus, format),
        Command::Poll(args) => poll::run(args, bus, format),
        Command::Doctor(args) => doctor::run(args, bus, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StripArg {
    /// Strip trailing 0xFF, then trailing 0x00.
    IdleThenPad,
    /// Strip trailing 0x00 only.
    PadOnly,
}

impl From<StripArg> for StripPolicy {
    fn from(arg: StripArg) -> Self {
        match arg {
            StripArg::IdleThenPad => StripPolicy::IdleThenPad,
            StripArg::PadOnly => StripPolicy::PadOnly,
        }
    }
}

/// Bus and protocol settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct BusArgs {
    /// I2C bus number (/dev/i2c-N).
    #[arg(long, env = "PICOBUS_BUS", default_value_t = 1, global = true)]
    pub bus: u8,
    /// 7-bit peripheral address (hex with 0x prefix, or decimal).
    #[arg(long, env = "PICOBUS_ADDRESS", default_value = "0x42", global = true)]
    pub address: PeripheralAddress,
    /// Response buffer size; must match the peripheral.
    #[arg(long, env = "PICOBUS_MAX_LEN", default_value_t = DEFAULT_MAX_LEN, global = true)]
    pub max_len: usize,
    /// Delay between command write and response read (e.g. 50ms, 1s).
    #[arg(long, env = "PICOBUS_SETTLE", default_value = "50ms", value_parser = parse_duration, global = true)]
    pub settle: Duration,
    /// Trailing filler handling for responses.
    #[arg(long, value_enum, default_value = "idle-then-pad", global = true)]
    pub strip: StripArg,
    /// Attempts per exchange before giving up.
    #[arg(long, env = "PICOBUS_RETRIES", default_value_t = 3, global = true)]
    pub retries: u32,
    /// Pause between attempts (e.g. 100ms).
    #[arg(long, default_value = "100ms", value_parser = parse_duration, global = true)]
    pub retry_backoff: Duration,
    /// Re-send the command after a failed read instead of only reading again.
    #[arg(long, global = true)]
    pub resend_on_read_failure: bool,
    /// Talk to a built-in simulated peripheral instead of hardware.
    #[arg(long, global = true)]
    pub simulate: bool,
}

impl BusArgs {
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            frame: FrameConfig {
                max_len: self.max_len,
                strip: self.strip.into(),
            },
            settle_delay: self.settle,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries,
            backoff: self.retry_backoff,
            reread_on_receive_failure: !self.resend_on_read_failure,
        }
    }
}

pub type CliSession = Session<Box<dyn BusHandle>>;

/// Acquire the bus and open a session on it.
pub fn open_session(args: &BusArgs) -> CliResult<CliSession> {
    let bus: Box<dyn BusHandle> = if args.simulate {
        tracing::info!(address = %args.address, "using simulated peripheral");
        Box::new(SimulatedPeripheral::pico(args.address))
    } else {
        open_hardware_bus(args.bus)?
    };

    Session::with_config(bus, args.address, args.exchange_config())
        .map_err(|err| exchange_error("session setup failed", err))
}

#[cfg(target_os = "linux")]
fn open_hardware_bus(bus: u8) -> CliResult<Box<dyn BusHandle>> {
    let handle = picobus_transport::LinuxI2cBus::open(bus)
        .map_err(|err| crate::exit::transport_error("open failed", err))?;
    Ok(Box::new(handle))
}

#[cfg(not(target_os = "linux"))]
fn open_hardware_bus(bus: u8) -> CliResult<Box<dyn BusHandle>> {
    Err(crate::exit::CliError::new(
        crate::exit::FAILURE,
        format!("i2c bus {bus} unavailable: i2c-dev requires Linux (use --simulate)"),
    ))
}

/// Parse `150ms`, `2s`, or a bare number of seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command text (ASCII), e.g. TEMP or ID.
    pub command: String,
}

#[derive(Args, Debug, Default)]
pub struct ReplArgs {}

#[derive(Args, Debug)]
pub struct PollArgs {
    /// Message written on every cycle.
    pub message: String,
    /// Pause between cycles (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub interval: Duration,
    /// Exit after N cycles.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
