use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cmd::{open_session, BusArgs, PollArgs};
use crate::exit::{exchange_error, loop_exit_code, CliError, CliResult, USAGE};
use crate::output::{print_response, OutputFormat};

/// Granularity of the interruptible wait between cycles.
const WAIT_SLICE: Duration = Duration::from_millis(50);

pub fn run(args: PollArgs, bus: &BusArgs, format: OutputFormat) -> CliResult<i32> {
    if args.interval.is_zero() {
        return Err(CliError::new(USAGE, "interval must be greater than zero"));
    }

    let mut session = open_session(bus)?;
    let policy = bus.retry_policy();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut cycles = 0usize;
    let mut failed = 0usize;

    while running.load(Ordering::SeqCst) {
        match session.exchange_with_retry(args.message.as_bytes(), &policy) {
            Ok(report) => print_response(&args.message, &report, session.address(), format),
            Err(err) => {
                let err = exchange_error("exchange failed", err);
                tracing::error!(cycle = cycles, code = err.code, "{err}");
                failed = failed.saturating_add(1);
            }
        }
        cycles = cycles.saturating_add(1);

        if let Some(count) = args.count {
            if cycles >= count {
                break;
            }
        }

        wait_interval(args.interval, &running);
    }

    tracing::info!(cycles, failed, "poll finished");
    Ok(loop_exit_code(failed))
}

/// Sleep for `interval`, returning early once `running` is cleared.
fn wait_interval(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(WAIT_SLICE.min(deadline - now));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
