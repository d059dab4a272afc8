use clap::{Args, Subcommand};
use std::path::PathBuf;

use msglink_dispatch::HANDLER_COUNT;
use msglink_frame::MSG_CAP;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message into its wire bytes.
    Encode(EncodeArgs),
    /// Decode wire bytes into messages.
    Decode(DecodeArgs),
    /// Listen on a socket and print received messages.
    Listen(ListenArgs),
    /// Send a single message.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where a message payload comes from.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex payload (e.g. "01 02 03").
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message type id.
    #[arg(long, short = 'i')]
    pub id: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex wire bytes. Reads stdin as raw bytes when omitted.
    pub input: Option<String>,
    /// Message buffer capacity (type id plus payload).
    #[arg(long, default_value_t = MSG_CAP)]
    pub max_message: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Only handle these type ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u8>>,
    /// Number of handler slots.
    #[arg(long, default_value_t = HANDLER_COUNT)]
    pub slots: usize,
    /// Message buffer capacity (type id plus payload).
    #[arg(long, default_value_t = MSG_CAP)]
    pub max_message: usize,
    /// Send every handled message back to the peer.
    #[arg(long)]
    pub echo: bool,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Message type id.
    #[arg(long, short = 'i')]
    pub id: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Wait for one response message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for a response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
