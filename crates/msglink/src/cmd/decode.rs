use std::io::Read;

use msglink_frame::{decode_frames, FrameConfig};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::hexdump;
use crate::logging;
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_message == 0 {
        return Err(CliError::new(USAGE, "--max-message must be greater than zero"));
    }

    let raw = match &args.input {
        Some(text) => hexdump::decode(text)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    let config = FrameConfig {
        max_message_size: args.max_message,
        ..FrameConfig::default()
    };

    let mut decoded = 0usize;
    let mut events = 0usize;
    for item in decode_frames(&raw, &config) {
        match item {
            Ok(frame) => {
                print_frame(&frame, format);
                decoded += 1;
            }
            Err(event) => {
                logging::report("decode", &event);
                events += 1;
            }
        }
    }

    if decoded == 0 && events > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no messages decoded ({events} protocol conditions)"),
        ));
    }
    Ok(SUCCESS)
}
