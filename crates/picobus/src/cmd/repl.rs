use std::io::{BufRead, IsTerminal, Write};

use picobus_exchange::{RetryPolicy, RetryReport, Session};
use picobus_transport::BusHandle;

use crate::cmd::{open_session, BusArgs, ReplArgs};
use crate::exit::{exchange_error, io_error, loop_exit_code, CliResult};
use crate::output::{print_response, OutputFormat};

const PROMPT: &str = "CMD (TEMP, ID, or text; Q to quit): ";

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplSummary {
    exchanged: usize,
    failed: usize,
}

impl ReplSummary {
    fn exit_code(&self) -> i32 {
        loop_exit_code(self.failed)
    }
}

pub fn run(_args: ReplArgs, bus: &BusArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = open_session(bus)?;
    let address = session.address();
    let stdin = std::io::stdin();
    let prompt = stdin.is_terminal();

    let summary = run_loop(
        stdin.lock(),
        &mut session,
        &bus.retry_policy(),
        prompt,
        |command, report| print_response(command, report, address, format),
    )?;

    tracing::info!(
        exchanged = summary.exchanged,
        failed = summary.failed,
        "repl finished"
    );
    Ok(summary.exit_code())
}

/// Exchange each non-blank input line until EOF or a quit word.
///
/// A failed exchange is logged and the loop moves on to the next line.
fn run_loop<R: BufRead, B: BusHandle>(
    mut input: R,
    session: &mut Session<B>,
    policy: &RetryPolicy,
    prompt: bool,
    mut emit: impl FnMut(&str, &RetryReport),
) -> CliResult<ReplSummary> {
    let mut summary = ReplSummary::default();
    let mut line = String::new();

    loop {
        if prompt {
            let mut err = std::io::stderr();
            let _ = write!(err, "{PROMPT}");
            let _ = err.flush();
        }

        line.clear();
        let read = input
            .read_line(&mut line)
            .map_err(|err| io_error("stdin read failed", err))?;
        if read == 0 {
            break;
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if is_quit(command) {
            break;
        }

        tracing::debug!(command, "sending");
        match session.exchange_with_retry(command, policy) {
            Ok(report) => {
                emit(command, &report);
                summary.exchanged += 1;
            }
            Err(err) => {
                let err = exchange_error("exchange failed", err);
                tracing::error!(code = err.code, "{err}");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn is_quit(command: &str) -> bool {
    ["Q", "QUIT", "EXIT"]
        .iter()
        .any(|word| command.eq_ignore_ascii_case(word))
}
