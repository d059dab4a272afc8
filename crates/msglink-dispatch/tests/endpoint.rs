use std::cell::RefCell;
use std::rc::Rc;

use bytes::BytesMut;
use msglink_dispatch::{DispatchError, Endpoint, EndpointConfig};
use msglink_frame::{
    encode_frame, FrameConfig, FrameError, ParserState, ProtocolEvent, END, ESCAPE, MSG_CAP, START,
};
use msglink_transport::MemoryStream;

type Log<T> = Rc<RefCell<Vec<T>>>;

struct Harness {
    endpoint: Endpoint<MemoryStream>,
    wire: MemoryStream,
    events: Log<ProtocolEvent>,
    received: Log<(u8, Vec<u8>)>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(EndpointConfig::default())
    }

    fn with_config(config: EndpointConfig) -> Self {
        let wire = MemoryStream::new();
        let events: Log<ProtocolEvent> = Rc::default();
        let received: Log<(u8, Vec<u8>)> = Rc::default();

        let sink = Rc::clone(&events);
        let mut endpoint = Endpoint::with_config(wire.clone(), config)
            .with_debug_sink(move |e: &ProtocolEvent| sink.borrow_mut().push(e.clone()));

        let slots = endpoint.config().handler_slots;
        for id in 0..slots as u8 {
            let received = Rc::clone(&received);
            endpoint
                .register_handler(id, move |msg| {
                    let mut payload = Vec::new();
                    while msg.has_next() {
                        payload.push(msg.next_byte());
                    }
                    received.borrow_mut().push((msg.id(), payload));
                })
                .expect("id within table");
        }

        Self {
            endpoint,
            wire,
            events,
            received,
        }
    }

    fn deliver(&mut self, bytes: &[u8]) -> usize {
        self.wire.push_incoming(bytes);
        self.endpoint.poll_once().expect("memory link never fails")
    }
}

fn encode(id: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(id, payload, &mut buf);
    buf.to_vec()
}

#[test]
fn roundtrip_through_a_loopback_link() {
    let (left, right) = MemoryStream::pair();
    let mut sender = Endpoint::new(left);
    let mut receiver = Endpoint::new(right);
    let received: Log<(u8, Vec<u8>)> = Rc::default();
    for id in 0..8u8 {
        let received = Rc::clone(&received);
        receiver
            .register_handler(id, move |msg| {
                received
                    .borrow_mut()
                    .push((msg.id(), msg.payload().to_vec()))
            })
            .unwrap();
    }

    let payloads: Vec<Vec<u8>> = vec![
        vec![],
        vec![START],
        vec![END, ESCAPE, START],
        vec![ESCAPE; 20],
        (0..=255u8).collect(),
        b"plain text".to_vec(),
    ];
    let ids = [0u8, START, END, 4, 5, 7];
    for (id, payload) in ids.iter().zip(&payloads) {
        sender.send_payload(*id, payload).unwrap();
    }

    assert_eq!(receiver.poll_once().unwrap(), payloads.len());
    let expected: Vec<(u8, Vec<u8>)> = ids.iter().copied().zip(payloads).collect();
    assert_eq!(*received.borrow(), expected);
}

#[test]
fn resync_drops_partial_message() {
    let mut h = Harness::new();

    let dispatched = h.deliver(&[START, 0x41, 0x42, START, 3, 0x58, END]);

    assert_eq!(dispatched, 1);
    assert_eq!(*h.received.borrow(), vec![(3, vec![0x58])]);
    assert_eq!(
        *h.events.borrow(),
        vec![ProtocolEvent::UnexpectedResync { discarded: 2 }]
    );
}

#[test]
fn oversized_message_overflows_once_and_recovers() {
    let mut h = Harness::new();

    let oversized = vec![0x55; MSG_CAP + 10];
    let mut wire = encode(1, &oversized);
    wire.extend(encode(2, b"next"));

    assert_eq!(h.deliver(&wire), 1);
    assert_eq!(
        *h.events.borrow(),
        vec![ProtocolEvent::BufferOverflow { capacity: MSG_CAP }]
    );
    assert_eq!(*h.received.borrow(), vec![(2, b"next".to_vec())]);
    assert_eq!(h.endpoint.parser_state(), ParserState::Idle);
}

#[test]
fn escaped_start_in_overflowed_payload_is_not_dispatched() {
    let mut h = Harness::new();

    let mut oversized = vec![0x55; MSG_CAP + 10];
    oversized.extend([START, 3, 0x99]);
    let mut wire = encode(1, &oversized);
    wire.extend(encode(2, b"next"));

    assert_eq!(h.deliver(&wire), 1);
    assert_eq!(
        *h.events.borrow(),
        vec![ProtocolEvent::BufferOverflow { capacity: MSG_CAP }]
    );
    assert_eq!(*h.received.borrow(), vec![(2, b"next".to_vec())]);
}

#[test]
fn largest_message_that_fits() {
    let mut h = Harness::new();
    let payload = vec![0x11; MSG_CAP - 1];

    assert_eq!(h.deliver(&encode(1, &payload)), 1);
    assert!(h.events.borrow().is_empty());
    assert_eq!(h.received.borrow()[0].1.len(), MSG_CAP - 1);
}

#[test]
fn custom_capacity_is_honoured() {
    let mut h = Harness::with_config(EndpointConfig {
        frame: FrameConfig {
            max_message_size: 8,
            ..FrameConfig::default()
        },
        ..EndpointConfig::default()
    });

    h.deliver(&encode(1, &[0; 8]));
    assert_eq!(
        *h.events.borrow(),
        vec![ProtocolEvent::BufferOverflow { capacity: 8 }]
    );
    assert!(h.received.borrow().is_empty());
}

#[test]
fn unhandled_type_reported_exactly_once() {
    let mut h = Harness::with_config(EndpointConfig {
        handler_slots: 4,
        ..EndpointConfig::default()
    });

    assert_eq!(h.deliver(&encode(6, b"ignored")), 0);
    assert_eq!(
        *h.events.borrow(),
        vec![ProtocolEvent::UnhandledType { id: 6 }]
    );

    assert_eq!(h.deliver(&encode(1, b"ok")), 1);
    assert_eq!(h.events.borrow().len(), 1);
}

#[test]
fn empty_frame_is_malformed_but_id_only_is_valid() {
    let mut h = Harness::new();

    assert_eq!(h.deliver(&[START, END, START, 7, END]), 1);
    assert_eq!(*h.events.borrow(), vec![ProtocolEvent::EmptyMessage]);
    assert_eq!(*h.received.borrow(), vec![(7, vec![])]);
}

#[test]
fn noise_before_first_start_is_ignored() {
    let mut h = Harness::new();

    assert_eq!(h.deliver(&[0xFF, 0x00, END, ESCAPE, START, 1, 2, END]), 1);
    assert!(h.events.borrow().is_empty());
    assert_eq!(*h.received.borrow(), vec![(1, vec![2])]);
}

#[test]
fn send_sequencing_errors_write_nothing() {
    let wire = MemoryStream::new();
    let mut endpoint = Endpoint::new(wire.clone());

    assert!(matches!(
        endpoint.send_byte(1),
        Err(DispatchError::Frame(FrameError::SendNotOpen))
    ));
    assert!(matches!(
        endpoint.end_send(),
        Err(DispatchError::Frame(FrameError::SendNotOpen))
    ));
    assert!(wire.written().is_empty());

    endpoint.begin_send(1).unwrap();
    let opened = wire.written();
    assert!(matches!(
        endpoint.begin_send(1),
        Err(DispatchError::Frame(FrameError::SendAlreadyOpen))
    ));
    assert!(matches!(
        endpoint.send_with(1, b"abc", 0, 3),
        Err(DispatchError::Frame(FrameError::SendAlreadyOpen))
    ));
    assert_eq!(wire.written(), opened);
}

#[test]
fn escaped_start_byte_on_the_wire() {
    let wire = MemoryStream::new();
    let mut endpoint = Endpoint::new(wire.clone());

    endpoint.send_payload(5, &[START]).unwrap();
    let bytes = wire.take_written();
    assert_eq!(bytes, vec![START, 5, ESCAPE, START, END]);

    let mut h = Harness::new();
    h.deliver(&bytes);
    assert_eq!(*h.received.borrow(), vec![(5, vec![START])]);
}

#[test]
fn handler_counts_payload_bytes() {
    let wire = MemoryStream::new();
    let mut endpoint = Endpoint::new(wire.clone());
    let observed: Log<(bool, u8)> = Rc::default();
    let overruns: Log<ProtocolEvent> = Rc::default();
    let sink = Rc::clone(&overruns);
    endpoint.set_debug_sink(move |e: &ProtocolEvent| sink.borrow_mut().push(e.clone()));

    let log = Rc::clone(&observed);
    endpoint
        .register_handler(5, move |msg| {
            while msg.has_next() {
                let byte = msg.next_byte();
                log.borrow_mut().push((true, byte));
            }
            log.borrow_mut().push((msg.has_next(), 0));
        })
        .unwrap();

    wire.push_incoming(&[START, 5, 0x01, 0x02, 0x03, END]);
    assert_eq!(endpoint.poll_once().unwrap(), 1);

    assert_eq!(
        *observed.borrow(),
        vec![(true, 0x01), (true, 0x02), (true, 0x03), (false, 0)]
    );
    assert!(overruns.borrow().is_empty());
}

#[test]
fn reading_past_payload_reports_overrun() {
    let wire = MemoryStream::new();
    let events: Log<ProtocolEvent> = Rc::default();
    let sink = Rc::clone(&events);
    let mut endpoint = Endpoint::new(wire.clone())
        .with_debug_sink(move |e: &ProtocolEvent| sink.borrow_mut().push(e.clone()));
    let reads: Log<u8> = Rc::default();
    let log = Rc::clone(&reads);
    endpoint
        .register_handler(2, move |msg| {
            for _ in 0..3 {
                log.borrow_mut().push(msg.next_byte());
            }
        })
        .unwrap();

    wire.push_incoming(&[START, 2, 0x7F, END, START, 2, 0x01, 0x02, END]);
    endpoint.poll_once().unwrap();

    assert_eq!(*reads.borrow(), vec![0x7F, 0, 0, 0x01, 0x02, 0]);
    assert_eq!(
        *events.borrow(),
        vec![
            ProtocolEvent::CursorOverrun { id: 2 },
            ProtocolEvent::CursorOverrun { id: 2 },
            ProtocolEvent::CursorOverrun { id: 2 },
        ]
    );
}
