/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The kind string does not fit the one-byte length prefix.
    #[error("kind is {units} UTF-16 units, max 255")]
    KindTooLong { units: usize },

    /// The payload exceeds the addressable offset range of the encoding.
    #[error("payload is {units} UTF-16 units, exceeds addressable range")]
    PayloadTooLarge { units: usize },

    /// A zero-length buffer where a frame was expected.
    #[error("empty frame")]
    EmptyFrame,

    /// The buffer ends before the fixed-layout fields do.
    #[error("truncated frame ({got} bytes, need at least {needed})")]
    Truncated { needed: usize, got: usize },

    /// A success acknowledgment with the wrong total length.
    #[error("success acknowledgment is {got} bytes, expected 6")]
    BadAckLength { got: usize },

    /// A string field whose byte length is not a whole number of code units.
    #[error("string field is {len} bytes, not a whole number of UTF-16 units")]
    OddLength { len: usize },

    /// The frame starts with a tag unit this protocol does not define.
    #[error("unknown frame tag 0x{tag:04x}")]
    UnknownTag { tag: u16 },

    /// A string field containing unpaired surrogates.
    #[error("invalid UTF-16 in string field")]
    InvalidUtf16,
}

pub type Result<T> = std::result::Result<T, FrameError>;
