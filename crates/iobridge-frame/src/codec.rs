use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Host-assigned 32-bit handle correlating a request with its data push.
pub type Serial = u32;

/// Request opcode unit: read from a named stream.
pub const TAG_READ: u16 = b'R' as u16;
/// Request opcode unit: write to a named stream.
pub const TAG_WRITE: u16 = b'W' as u16;
/// Acknowledgment tag unit: serial granted.
pub const TAG_SUCCESS: u16 = b'S' as u16;
/// Acknowledgment tag unit: request rejected.
pub const TAG_ERROR: u16 = b'E' as u16;
/// Push opcode unit: data for a pending serial.
pub const TAG_DATA: u16 = b'D' as u16;

/// Maximum kind length in UTF-16 units. The length prefix occupies a full
/// unit on the wire but the protocol caps it at one byte's worth.
pub const MAX_KIND_UNITS: usize = 255;

/// Maximum payload length in UTF-16 units.
pub const MAX_PAYLOAD_UNITS: usize = u32::MAX as usize;

/// Exact wire size of a success acknowledgment: tag unit + u32 serial.
pub const ACK_SUCCESS_SIZE: usize = 6;

/// Wire size of a data push header: tag unit + u32 serial.
pub const PUSH_HEADER_SIZE: usize = 6;

/// Request operation, decoded once at the frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

impl Op {
    /// The wire tag unit for this operation.
    pub fn tag(self) -> u16 {
        match self {
            Op::Read => TAG_READ,
            Op::Write => TAG_WRITE,
        }
    }

    /// Decode a wire tag unit, if it names a known operation.
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            TAG_READ => Some(Op::Read),
            TAG_WRITE => Some(Op::Write),
            _ => None,
        }
    }
}

/// A decoded request frame (host side of the exchange).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub op: Op,
    /// Name of the target stream, e.g. "stdin".
    pub kind: String,
    /// The value to write, or an opaque selector for reads.
    pub payload: String,
}

/// The synchronous reply to a request call.
///
/// `Empty` is produced by the transport when the host returns no frame at
/// all; `decode_ack` never yields it — a zero-length ack buffer is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Serial granted; data will arrive later under this handle.
    Success { serial: Serial },
    /// The request was rejected synchronously.
    Error { message: String },
    /// No immediate frame (writes that expect no streamed reply).
    Empty,
}

/// An asynchronous data push for a pending serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub serial: Serial,
    /// Opaque payload bytes; interpretation belongs to the caller.
    pub payload: Bytes,
}

/// Encode a request frame.
///
/// Wire format (units are little-endian u16 UTF-16 code units):
/// ```text
/// ┌───────────────┬────────────────┬───────────────┬──────────────────┐
/// │ Opcode (1u)   │ Kind len (1u)  │ Kind (N u)    │ Payload (M u)    │
/// │ 'R' or 'W'    │ N ≤ 255        │               │                  │
/// └───────────────┴────────────────┴───────────────┴──────────────────┘
/// ```
///
/// Fails with [`FrameError::KindTooLong`] before anything is written if the
/// kind exceeds the one-byte length prefix.
pub fn encode_request(op: Op, kind: &str, payload: &str) -> Result<Bytes> {
    let kind_units = kind.encode_utf16().count();
    if kind_units > MAX_KIND_UNITS {
        return Err(FrameError::KindTooLong { units: kind_units });
    }
    let payload_units = payload.encode_utf16().count();
    if payload_units > MAX_PAYLOAD_UNITS {
        return Err(FrameError::PayloadTooLarge {
            units: payload_units,
        });
    }

    let mut buf = BytesMut::with_capacity(2 * (2 + kind_units + payload_units));
    buf.put_u16_le(op.tag());
    buf.put_u16_le(kind_units as u16);
    put_utf16(&mut buf, kind);
    put_utf16(&mut buf, payload);

    tracing::trace!(?op, kind, frame_bytes = buf.len(), "encoded request");
    Ok(buf.freeze())
}

/// Decode a request frame. Used by host implementations and tests.
pub fn decode_request(src: &[u8]) -> Result<RequestFrame> {
    if src.len() % 2 != 0 {
        return Err(FrameError::OddLength { len: src.len() });
    }
    let mut buf = src;
    if buf.remaining() < 4 {
        return Err(FrameError::Truncated {
            needed: 4,
            got: src.len(),
        });
    }

    let tag = buf.get_u16_le();
    let op = Op::from_tag(tag).ok_or(FrameError::UnknownTag { tag })?;
    let kind_units = buf.get_u16_le() as usize;
    if kind_units > MAX_KIND_UNITS {
        return Err(FrameError::KindTooLong { units: kind_units });
    }
    if buf.remaining() < kind_units * 2 {
        return Err(FrameError::Truncated {
            needed: 4 + kind_units * 2,
            got: src.len(),
        });
    }

    let (kind_bytes, payload_bytes) = buf.split_at(kind_units * 2);
    Ok(RequestFrame {
        op,
        kind: decode_utf16(kind_bytes)?,
        payload: decode_utf16(payload_bytes)?,
    })
}

/// Encode an acknowledgment frame. `Ack::Empty` has no wire representation.
pub fn encode_ack(ack: &Ack) -> Option<Bytes> {
    match ack {
        Ack::Success { serial } => {
            let mut buf = BytesMut::with_capacity(ACK_SUCCESS_SIZE);
            buf.put_u16_le(TAG_SUCCESS);
            buf.put_u32_le(*serial);
            Some(buf.freeze())
        }
        Ack::Error { message } => {
            let mut buf = BytesMut::with_capacity(2 + message.len() * 2);
            buf.put_u16_le(TAG_ERROR);
            put_utf16(&mut buf, message);
            Some(buf.freeze())
        }
        Ack::Empty => None,
    }
}

/// Decode the synchronous acknowledgment to a request.
///
/// Layouts:
/// ```text
/// Success: [ 'S' (1u) ][ serial (u32 LE) ]          — exactly 6 bytes
/// Error:   [ 'E' (1u) ][ message (UTF-16LE units) ]
/// ```
///
/// A zero-length buffer, an unrecognized tag, or a malformed layout is always
/// a decode error — never a silent default.
pub fn decode_ack(src: &[u8]) -> Result<Ack> {
    if src.is_empty() {
        return Err(FrameError::EmptyFrame);
    }
    let mut buf = src;
    if buf.remaining() < 2 {
        return Err(FrameError::Truncated {
            needed: 2,
            got: src.len(),
        });
    }

    match buf.get_u16_le() {
        TAG_SUCCESS => {
            if src.len() != ACK_SUCCESS_SIZE {
                return Err(FrameError::BadAckLength { got: src.len() });
            }
            Ok(Ack::Success {
                serial: buf.get_u32_le(),
            })
        }
        TAG_ERROR => Ok(Ack::Error {
            message: decode_utf16(buf)?,
        }),
        tag => Err(FrameError::UnknownTag { tag }),
    }
}

/// Encode a data push for a pending serial. Host side of the exchange.
pub fn encode_push(serial: Serial, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(PUSH_HEADER_SIZE + payload.len());
    buf.put_u16_le(TAG_DATA);
    buf.put_u32_le(serial);
    buf.put_slice(payload);
    buf.freeze()
}

/// Decode an asynchronous data push.
///
/// ```text
/// [ 'D' (1u) ][ serial (u32 LE) ][ payload bytes... ]
/// ```
///
/// The payload is opaque bytes, not code units; text payloads are decoded by
/// the caller with [`decode_utf16`].
pub fn decode_push(src: &[u8]) -> Result<DataFrame> {
    if src.is_empty() {
        return Err(FrameError::EmptyFrame);
    }
    let mut buf = src;
    if buf.remaining() < PUSH_HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: PUSH_HEADER_SIZE,
            got: src.len(),
        });
    }

    let tag = buf.get_u16_le();
    if tag != TAG_DATA {
        return Err(FrameError::UnknownTag { tag });
    }
    let serial = buf.get_u32_le();
    Ok(DataFrame {
        serial,
        payload: Bytes::copy_from_slice(buf),
    })
}

/// Encode a string as little-endian UTF-16 code units.
pub fn encode_utf16(s: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(s.len() * 2);
    put_utf16(&mut buf, s);
    buf.freeze()
}

/// Decode a buffer of little-endian UTF-16 code units as a string.
///
/// This is the one string-decoding convention for the whole protocol: strict
/// validation, unpaired surrogates are an error.
pub fn decode_utf16(src: &[u8]) -> Result<String> {
    if src.len() % 2 != 0 {
        return Err(FrameError::OddLength { len: src.len() });
    }
    let units: Vec<u16> = src
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| FrameError::InvalidUtf16)
}

fn put_utf16(buf: &mut BytesMut, s: &str) {
    for unit in s.encode_utf16() {
        buf.put_u16_le(unit);
    }
}
