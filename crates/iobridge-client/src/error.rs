use iobridge_frame::Serial;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Frame-level encode/decode error.
    #[error("frame error: {0}")]
    Frame(#[from] iobridge_frame::FrameError),

    /// The underlying channel failed.
    #[error("channel error: {0}")]
    Channel(#[from] std::io::Error),

    /// The host rejected the request with an explicit error message.
    #[error("host error: {0}")]
    Host(String),

    /// The host granted a serial that is already pending. Protocol
    /// invariant breach on the host side.
    #[error("serial {0} is already pending")]
    DuplicateSerial(Serial),

    /// A read request was acknowledged with no serial to wait on.
    #[error("read request acknowledged without a serial")]
    MissingSerial,

    /// A write was acknowledged with a serial; writes expect no reply.
    #[error("write acknowledged with serial {0}, expected no reply")]
    UnexpectedWriteAck(Serial),

    /// The channel was closed while the request was still pending.
    #[error("channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ClientError>;
