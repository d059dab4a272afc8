use std::fs;

use msglink_frame::Frame;

use crate::cmd::{EncodeArgs, PayloadArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::hexdump;
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args.payload)?;
    print_encoded(&Frame::new(args.id, payload), format);
    Ok(SUCCESS)
}

pub(crate) fn resolve_payload(args: &PayloadArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(text) = &args.hex {
        return hexdump::decode(text);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
