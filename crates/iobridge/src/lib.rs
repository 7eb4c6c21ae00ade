//! Named-stream I/O between a script context and its host process.
//!
//! iobridge is the client side of a small binary protocol: read and write
//! requests for named data streams ("stdin", "stdout", ...) go out over a
//! single bidirectional channel, the host acknowledges each synchronously,
//! and read data arrives later as pushes correlated by serial number.
//!
//! # Crate Structure
//!
//! - [`frame`] — wire codec: request, acknowledgment, and data-push frames
//! - [`client`] — protocol engine: host channel, pending-request registry,
//!   response futures, and the client facade

/// Re-export frame types.
pub mod frame {
    pub use iobridge_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use iobridge_client::*;
}
