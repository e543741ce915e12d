use crate::cmd::{open_session, BusArgs, SendArgs};
use crate::exit::{exchange_error, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, bus: &BusArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = open_session(bus)?;
    let report = session
        .exchange_with_retry(args.command.as_bytes(), &bus.retry_policy())
        .map_err(|err| exchange_error("exchange failed", err))?;

    print_response(&args.command, &report, session.address(), format);
    Ok(SUCCESS)
}
