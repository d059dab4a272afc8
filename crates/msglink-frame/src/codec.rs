use bytes::{BufMut, Bytes, BytesMut};

use crate::assembler::Assembler;
use crate::error::ProtocolEvent;

/// Start-of-frame marker (ASCII STX).
pub const START: u8 = 0x02;

/// End-of-frame marker (ASCII ETX).
pub const END: u8 = 0x03;

/// Escape marker (ASCII DLE). The byte after it is always literal data.
pub const ESCAPE: u8 = 0x10;

/// Default message buffer capacity: type id plus payload, decoded.
pub const MSG_CAP: usize = 512;

/// Default number of raw bytes drained from the link per batch.
pub const READ_CAP: usize = 256;

/// A decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message type id.
    pub id: u8,
    /// The message payload, without the id byte.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// The number of bytes this frame occupies on the wire.
    pub fn wire_size(&self) -> usize {
        encoded_len(self.id, &self.payload)
    }
}

/// Returns true if `byte` collides with a framing marker and must be escaped.
pub fn is_reserved(byte: u8) -> bool {
    matches!(byte, START | END | ESCAPE)
}

/// Append `byte` to `dst`, escaped if needed.
pub fn escape_into(byte: u8, dst: &mut BytesMut) {
    if is_reserved(byte) {
        dst.put_u8(ESCAPE);
    }
    dst.put_u8(byte);
}

/// Encode a complete frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬─────────┬──────────────┬─────┐
/// │ START │ id'     │ payload'...  │ END │
/// │ 0x02  │ 1-2 B   │ 1-2 B each   │ 0x03│
/// └───────┴─────────┴──────────────┴─────┘
/// ' = preceded by ESCAPE (0x10) when equal to 0x02, 0x03 or 0x10
/// ```
pub fn encode_frame(id: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(encoded_len(id, payload));
    dst.put_u8(START);
    escape_into(id, dst);
    for &byte in payload {
        escape_into(byte, dst);
    }
    dst.put_u8(END);
}

/// The exact wire size of `(id, payload)` once framed and escaped.
pub fn encoded_len(id: u8, payload: &[u8]) -> usize {
    let escaped = |b: u8| if is_reserved(b) { 2 } else { 1 };
    2 + escaped(id) + payload.iter().map(|&b| escaped(b)).sum::<usize>()
}

/// Decode every frame in a raw byte buffer.
///
/// Protocol conditions met along the way are returned in stream order next
/// to the frames. A trailing partial frame is ignored.
pub fn decode_frames(
    raw: &[u8],
    config: &FrameConfig,
) -> Vec<std::result::Result<Frame, ProtocolEvent>> {
    let mut assembler = Assembler::with_capacity(config.max_message_size);
    let mut out = Vec::new();
    for &byte in raw {
        match assembler.feed(byte) {
            Ok(Some(done)) => out.push(Ok(Frame::new(
                done.id,
                Bytes::copy_from_slice(assembler.payload(&done)),
            ))),
            Ok(None) => {}
            Err(event) => out.push(Err(event)),
        }
    }
    out
}

/// Configuration for the framing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Message buffer capacity (type id + decoded payload). Default: 512.
    pub max_message_size: usize,
    /// Raw bytes drained from the link per batch. Default: 256.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: MSG_CAP,
            read_chunk_size: READ_CAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(id: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(id, payload, &mut buf);
        buf.to_vec()
    }

    fn decode_one(raw: &[u8]) -> Frame {
        let mut decoded = decode_frames(raw, &FrameConfig::default());
        assert_eq!(decoded.len(), 1, "expected exactly one frame: {decoded:?}");
        decoded.remove(0).unwrap()
    }

    #[test]
    fn plain_payload_is_not_escaped() {
        assert_eq!(encode(5, &[0x01, 0x81]), vec![START, 5, 0x01, 0x81, END]);
    }

    #[test]
    fn start_byte_in_payload_is_escaped() {
        let wire = encode(5, &[START]);
        assert_eq!(wire, vec![START, 5, ESCAPE, START, END]);

        let frame = decode_one(&wire);
        assert_eq!(frame.id, 5);
        assert_eq!(frame.payload.as_ref(), &[START]);
    }

    #[test]
    fn reserved_id_is_escaped() {
        let wire = encode(END, b"x");
        assert_eq!(wire, vec![START, ESCAPE, END, b'x', END]);
        assert_eq!(decode_one(&wire), Frame::new(END, &b"x"[..]));
    }

    #[test]
    fn roundtrip_with_every_reserved_byte() {
        let payload = [ESCAPE, START, END, 0x00, 0xFF, ESCAPE, ESCAPE];
        for id in [0u8, 1, START, END, ESCAPE, 7, 0xFF] {
            let frame = decode_one(&encode(id, &payload));
            assert_eq!(frame.id, id);
            assert_eq!(frame.payload.as_ref(), &payload);
        }
    }

    #[test]
    fn roundtrip_empty_payload() {
        let wire = encode(3, &[]);
        assert_eq!(wire.len(), 3);
        let frame = decode_one(&wire);
        assert_eq!(frame.id, 3);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn roundtrip_every_byte_value() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let frame = decode_one(&encode(1, &payload));
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn encoded_len_matches_encoding() {
        let payload = [START, 1, 2, ESCAPE, END];
        assert_eq!(encoded_len(ESCAPE, &payload), encode(ESCAPE, &payload).len());
        assert_eq!(Frame::new(ESCAPE, payload.to_vec()).wire_size(), 12);
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut wire = encode(1, b"first");
        wire.extend(encode(2, b"second"));

        let frames: Vec<Frame> = decode_frames(&wire, &FrameConfig::default())
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].id, frames[0].payload.as_ref()), (1, b"first".as_ref()));
        assert_eq!((frames[1].id, frames[1].payload.as_ref()), (2, b"second".as_ref()));
    }

    #[test]
    fn decode_reports_conditions_in_order() {
        let mut wire = vec![START, END];
        wire.extend(encode(4, b"ok"));

        let decoded = decode_frames(&wire, &FrameConfig::default());
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], Err(ProtocolEvent::EmptyMessage));
        assert_eq!(decoded[1], Ok(Frame::new(4, &b"ok"[..])));
    }

    #[test]
    fn trailing_partial_frame_is_ignored() {
        let mut wire = encode(1, b"done");
        wire.extend([START, 9, 9]);
        let decoded = decode_frames(&wire, &FrameConfig::default());
        assert_eq!(decoded.len(), 1);
    }
}
