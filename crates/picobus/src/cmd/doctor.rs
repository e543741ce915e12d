use serde::Serialize;

use crate::cmd::{BusArgs, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, bus: &BusArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_backend_check(),
        bus_device_check(bus),
        bus_access_check(bus),
        protocol_config_check(bus),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput { checks, overall };
    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("picobus doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn check(name: &str, status: CheckStatus, detail: impl Into<String>) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        status,
        detail: detail.into(),
    }
}

fn platform_backend_check() -> CheckResult {
    if cfg!(target_os = "linux") {
        check("platform_backend", CheckStatus::Pass, "i2c-dev backend available")
    } else {
        check(
            "platform_backend",
            CheckStatus::Warn,
            "i2c-dev backend requires Linux; only --simulate is usable",
        )
    }
}

#[cfg(target_os = "linux")]
fn bus_device_check(bus: &BusArgs) -> CheckResult {
    use std::os::unix::fs::FileTypeExt;

    if bus.simulate {
        return check("bus_device", CheckStatus::Skip, "simulated peripheral selected");
    }

    let path = picobus_transport::device_path(bus.bus);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.file_type().is_char_device() => check(
            "bus_device",
            CheckStatus::Pass,
            format!("{} present", path.display()),
        ),
        Ok(_) => check(
            "bus_device",
            CheckStatus::Fail,
            format!("{} is not a character device", path.display()),
        ),
        Err(err) => check(
            "bus_device",
            CheckStatus::Fail,
            format!("{}: {err} (is the I2C interface enabled?)", path.display()),
        ),
    }
}

#[cfg(not(target_os = "linux"))]
fn bus_device_check(_bus: &BusArgs) -> CheckResult {
    check("bus_device", CheckStatus::Skip, "not implemented on this platform")
}

#[cfg(target_os = "linux")]
fn bus_access_check(bus: &BusArgs) -> CheckResult {
    if bus.simulate {
        return check("bus_access", CheckStatus::Skip, "simulated peripheral selected");
    }

    match picobus_transport::LinuxI2cBus::open(bus.bus) {
        Ok(handle) => check(
            "bus_access",
            CheckStatus::Pass,
            format!("{} opened read/write", handle.path().display()),
        ),
        Err(err) => check("bus_access", CheckStatus::Fail, err.to_string()),
    }
}

#[cfg(not(target_os = "linux"))]
fn bus_access_check(_bus: &BusArgs) -> CheckResult {
    check("bus_access", CheckStatus::Skip, "not implemented on this platform")
}

fn protocol_config_check(bus: &BusArgs) -> CheckResult {
    let detail = format!(
        "address={} max_len={} settle={:?} retries={}",
        bus.address, bus.max_len, bus.settle, bus.retries
    );
    if bus.max_len == 0 || bus.retries == 0 {
        return check("protocol_config", CheckStatus::Fail, detail);
    }
    check("protocol_config", CheckStatus::Info, detail)
}
