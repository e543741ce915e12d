//! Query a simulated peripheral the way a controller talks to real hardware.
//!
//! Run with: cargo run --example query

use picobus::exchange::{ExchangeConfig, Response, RetryPolicy, Session};
use picobus::transport::{SimulatedPeripheral, DEFAULT_ADDRESS};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut peripheral = SimulatedPeripheral::pico(DEFAULT_ADDRESS);
    // First write is dropped, like a peripheral that is still booting.
    peripheral.fail_next_writes(1);

    let mut session = Session::with_config(peripheral, DEFAULT_ADDRESS, ExchangeConfig::default())?;
    let policy = RetryPolicy::default();

    for command in ["TEMP", "ID", "hello", "again"] {
        let report = session.exchange_with_retry(command, &policy)?;
        match report.response {
            Response::Decoded(text) => println!("{command} -> {text} ({} attempts)", report.attempts),
            Response::Empty => println!("{command} -> <empty>"),
            Response::Undecodable(raw) => println!("{command} -> (raw) {raw:?}"),
        }
    }

    Ok(())
}
