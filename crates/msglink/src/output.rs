use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msglink_frame::{encode_frame, Frame};
use serde::Serialize;

use crate::hexdump;

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
struct FrameOutput {
    id: u8,
    payload_size: usize,
    payload: String,
    payload_hex: String,
    wire_size: usize,
    timestamp: String,
}

impl FrameOutput {
    fn new(frame: &Frame) -> Self {
        Self {
            id: frame.id,
            payload_size: frame.payload.len(),
            payload: payload_preview(frame.payload.as_ref()),
            payload_hex: hexdump::encode(frame.payload.as_ref()),
            wire_size: frame.wire_size(),
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print one received or decoded message.
pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&FrameOutput::new(frame)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "SIZE", "WIRE", "PAYLOAD"])
                .add_row(vec![
                    frame.id.to_string(),
                    frame.payload.len().to_string(),
                    frame.wire_size().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} size={} payload={}",
                frame.id,
                frame.payload.len(),
                payload_preview(frame.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    id: u8,
    payload_size: usize,
    wire_size: usize,
    wire_hex: String,
}

/// Print the on-wire encoding of `frame`.
pub fn print_encoded(frame: &Frame, format: OutputFormat) {
    let mut wire = bytes::BytesMut::with_capacity(frame.wire_size());
    encode_frame(frame.id, frame.payload.as_ref(), &mut wire);

    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                id: frame.id,
                payload_size: frame.payload.len(),
                wire_size: wire.len(),
                wire_hex: hexdump::encode(&wire),
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
                .set_header(vec!["ID", "SIZE", "WIRE", "BYTES"])
                .add_row(vec![
                    frame.id.to_string(),
                    frame.payload.len().to_string(),
                    wire.len().to_string(),
                    hexdump::encode(&wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", hexdump::encode(&wire)),
        OutputFormat::Raw => print_raw(&wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
