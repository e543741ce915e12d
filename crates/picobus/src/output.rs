use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use picobus_exchange::{Response, RetryReport};
use picobus_transport::PeripheralAddress;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    address: String,
    command: &'a str,
    outcome: &'static str,
    text: Option<&'a str>,
    raw_hex: String,
    payload_size: usize,
    attempts: u32,
    transport_failures: usize,
    timestamp: String,
}

pub fn print_response(
    command: &str,
    report: &RetryReport,
    address: PeripheralAddress,
    format: OutputFormat,
) {
    let response = &report.response;
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                address: address.to_string(),
                command,
                outcome: response.kind(),
                text: match response {
                    Response::Decoded(text) => Some(text.as_str()),
                    _ => None,
                },
                raw_hex: hex(response.payload()),
                payload_size: response.payload().len(),
                attempts: report.attempts,
                transport_failures: report.failures.len(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "COMMAND", "OUTCOME", "ATTEMPTS", "RESPONSE"])
                .add_row(vec![
                    address.to_string(),
                    command.to_string(),
                    response.kind().to_string(),
                    report.attempts.to_string(),
                    response_preview(response),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match response {
            Response::Decoded(text) => println!("\u{2190} {text}"),
            Response::Empty => println!("\u{2190} (empty)"),
            Response::Undecodable(raw) => println!("\u{2190} (raw) {}", hex(raw)),
        },
        OutputFormat::Raw => {
            print_raw(response.payload());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn response_preview(response: &Response) -> String {
    match response {
        Response::Decoded(text) => text.clone(),
        Response::Empty => "<empty>".to_string(),
        Response::Undecodable(raw) => format!("<binary {} bytes: {}>", raw.len(), hex(raw)),
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_pairs() {
        assert_eq!(hex(&[0x00, 0xAB, 0x7F]), "00ab7f");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn preview_marks_binary_payloads() {
        let response = Response::classify(&[0xC3, 0x28]);
        assert_eq!(response_preview(&response), "<binary 2 bytes: c328>");
        assert_eq!(response_preview(&Response::Empty), "<empty>");
    }
}
