//! Two endpoints wired back to back in memory.
//!
//! The "device" sums the bytes of every type-5 message and answers with a
//! type-6 message carrying the sum; the "host" prints the answers.
//!
//! Run with: `cargo run -p msglink --example loopback`

use std::cell::RefCell;
use std::rc::Rc;

use msglink::dispatch::Endpoint;
use msglink::frame::ProtocolEvent;
use msglink::transport::MemoryStream;

const REQUEST_SUM: u8 = 5;
const REPLY_SUM: u8 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host_link, device_link) = MemoryStream::pair();

    let mut device = Endpoint::new(device_link)
        .with_debug_sink(|event: &ProtocolEvent| eprintln!("device: {event}"));
    device.register_handler(REQUEST_SUM, |msg| {
        let sum: u32 = msg.cursor().map(u32::from).sum();
        if let Err(err) = msg.reply().send_payload(REPLY_SUM, &sum.to_le_bytes()) {
            eprintln!("device: reply failed: {err}");
        }
    })?;

    let answers = Rc::new(RefCell::new(Vec::new()));
    let mut host = Endpoint::new(host_link);
    let sink = Rc::clone(&answers);
    host.register_handler(REPLY_SUM, move |msg| {
        let mut bytes = [0u8; 4];
        for slot in bytes.iter_mut() {
            *slot = msg.next_byte();
        }
        sink.borrow_mut().push(u32::from_le_bytes(bytes));
    })?;

    // Payloads include marker values; the link escapes them.
    for payload in [&[1u8, 2, 3][..], &[0x02, 0x03, 0x10], &[]] {
        host.send_payload(REQUEST_SUM, payload)?;
    }
    // No handler for type 7 on the device: reported, then ignored.
    host.send(7)?;

    device.poll_once()?;
    host.poll_once()?;

    for sum in answers.borrow().iter() {
        println!("sum = {sum}");
    }
    Ok(())
}
