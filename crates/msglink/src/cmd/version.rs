use msglink_dispatch::HANDLER_COUNT;
use msglink_frame::{END, ESCAPE, MSG_CAP, READ_CAP, START};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("msglink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: msglink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("MSGLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("markers: start=0x{START:02x} end=0x{END:02x} escape=0x{ESCAPE:02x}");
    println!("msg_cap: {MSG_CAP}");
    println!("read_cap: {READ_CAP}");
    println!("handler_count: {HANDLER_COUNT}");

    Ok(SUCCESS)
}
