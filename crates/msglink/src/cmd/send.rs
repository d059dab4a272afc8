use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use msglink_dispatch::Endpoint;
use msglink_frame::Frame;
use msglink_transport::{ByteStream, TransportError, UnixDomainSocket};

use crate::cmd::encode::resolve_payload;
use crate::cmd::SendArgs;
use crate::exit::{dispatch_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = resolve_payload(&args.payload)?;

    let link = UnixDomainSocket::connect(&args.path)
        .map_err(|err| transport_error("connect failed", err))?;
    let mut endpoint = Endpoint::new(link);

    let response = if args.wait {
        Some(capture_response(&mut endpoint)?)
    } else {
        None
    };

    endpoint
        .send_payload(args.id, &payload)
        .map_err(|err| dispatch_error("send failed", err))?;

    if let Some(slot) = response {
        let frame = wait_for_response(&mut endpoint, &slot, wait_timeout)?.ok_or_else(|| {
            CliError::new(
                TIMEOUT,
                format!("no response within {}ms", wait_timeout.as_millis()),
            )
        })?;
        print_frame(&frame, format);
    }

    Ok(SUCCESS)
}

type ResponseSlot = Rc<RefCell<Option<Frame>>>;

/// Install a handler on every slot that keeps the first message received.
fn capture_response<S: ByteStream + 'static>(endpoint: &mut Endpoint<S>) -> CliResult<ResponseSlot> {
    let slot = ResponseSlot::default();
    let slots = endpoint.config().handler_slots.min(256);
    for id in (0..slots).filter_map(|id| u8::try_from(id).ok()) {
        let slot = Rc::clone(&slot);
        endpoint
            .register_handler(id, move |msg| {
                let mut slot = slot.borrow_mut();
                if slot.is_none() {
                    *slot = Some(Frame::new(msg.id(), Bytes::copy_from_slice(msg.payload())));
                }
            })
            .map_err(|err| dispatch_error("register failed", err))?;
    }
    Ok(slot)
}

fn wait_for_response<S: ByteStream>(
    endpoint: &mut Endpoint<S>,
    slot: &ResponseSlot,
    timeout: Duration,
) -> CliResult<Option<Frame>> {
    let deadline = Instant::now() + timeout;
    loop {
        endpoint
            .poll_once()
            .map_err(|err| dispatch_error("receive failed", err))?;
        if let Some(frame) = slot.borrow_mut().take() {
            return Ok(Some(frame));
        }
        if endpoint.get_ref().is_closed() {
            return Err(transport_error("receive failed", TransportError::Closed));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
