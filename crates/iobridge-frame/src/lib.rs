//! Wire codec for the iobridge host I/O protocol.
//!
//! Every exchange with the host is one self-contained binary frame. String
//! fields are little-endian UTF-16 code units; integers are little-endian.
//!
//! - Request: `['R'|'W' (1u)] [kind len (1u)] [kind (N u)] [payload (M u)]`
//! - Success ack: `['S' (1u)] [serial (u32 LE)]`
//! - Error ack: `['E' (1u)] [message units...]`
//! - Data push: `['D' (1u)] [serial (u32 LE)] [payload bytes...]`
//!
//! Both sides share no schema negotiation, so byte order and field widths
//! are fixed. Malformed frames always decode to a typed error, never to a
//! silent default.

pub mod codec;
pub mod error;
pub mod kind;

pub use codec::{
    decode_ack, decode_push, decode_request, decode_utf16, encode_ack, encode_push,
    encode_request, encode_utf16, Ack, DataFrame, Op, RequestFrame, Serial, ACK_SUCCESS_SIZE,
    MAX_KIND_UNITS, PUSH_HEADER_SIZE,
};
pub use error::{FrameError, Result};
