use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use msglink_dispatch::{Endpoint, EndpointConfig};
use msglink_frame::{Frame, FrameConfig};
use msglink_transport::{ByteStream, UnixDomainSocket};
use tracing::{info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{dispatch_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::logging::protocol_sink;
use crate::output::{print_frame, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

type Inbox = Rc<RefCell<Vec<Frame>>>;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_message == 0 {
        return Err(CliError::new(USAGE, "--max-message must be greater than zero"));
    }
    let config = EndpointConfig {
        frame: FrameConfig {
            max_message_size: args.max_message,
            ..FrameConfig::default()
        },
        handler_slots: args.slots,
    };

    let listener =
        UnixDomainSocket::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %listener.path().display(), "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let link = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;

        let inbox = Inbox::default();
        let mut endpoint =
            Endpoint::with_config(link, config.clone()).with_debug_sink(protocol_sink("listen"));
        register_handlers(&mut endpoint, &args, &inbox)?;

        while running.load(Ordering::SeqCst) {
            let handled = endpoint
                .poll_once()
                .map_err(|err| dispatch_error("receive failed", err))?;

            for frame in inbox.borrow_mut().drain(..) {
                print_frame(&frame, format);
                printed = printed.saturating_add(1);

                if let Some(count) = args.count {
                    if printed >= count {
                        return Ok(SUCCESS);
                    }
                }
            }

            if endpoint.get_ref().is_closed() {
                info!("peer disconnected");
                break;
            }
            if handled == 0 {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    Ok(SUCCESS)
}

fn register_handlers<S: ByteStream + 'static>(
    endpoint: &mut Endpoint<S>,
    args: &ListenArgs,
    inbox: &Inbox,
) -> CliResult<()> {
    let slots = endpoint.config().handler_slots.min(256);
    let ids: Vec<u8> = match &args.ids {
        Some(ids) => ids.clone(),
        None => (0..slots).filter_map(|id| u8::try_from(id).ok()).collect(),
    };

    for id in ids {
        let inbox = Rc::clone(inbox);
        let echo = args.echo;
        endpoint
            .register_handler(id, move |msg| {
                let id = msg.id();
                let payload = Bytes::copy_from_slice(msg.payload());
                if echo {
                    if let Err(err) = msg.reply().send_payload(id, &payload) {
                        warn!(%err, id, "echo failed");
                    }
                }
                inbox.borrow_mut().push(Frame::new(id, payload));
            })
            .map_err(|err| dispatch_error("register failed", err))?;
    }
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
