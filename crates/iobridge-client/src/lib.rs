//! Client-side protocol engine for iobridge host stream I/O.
//!
//! A script-execution context issues read and write requests for named data
//! streams to its host over a single bidirectional channel. Requests are
//! acknowledged synchronously; read data arrives later as pushes correlated
//! by a host-assigned serial.
//!
//! Everything here runs on one logical thread under cooperative scheduling:
//! the synchronous [`HostChannel::call`] blocks until the host's immediate
//! reply, and pushes are dispatched whenever the host driver invokes the
//! [`Dispatcher`]. The registry therefore needs no locking, but stays safe
//! to re-enter from within a delivery callback.
//!
//! - [`channel`] — the synchronous send primitive the host environment provides
//! - [`registry`] — pending requests keyed by serial, resolved at most once
//! - [`response`] — single-resolution futures for granted serials
//! - [`client`] — the facade collaborators actually use

pub mod channel;
pub mod client;
pub mod error;
pub mod registry;
pub mod response;

pub use channel::HostChannel;
pub use client::{Dispatcher, IoClient};
pub use error::{ClientError, Result};
pub use registry::PendingRequests;
pub use response::{Response, StringResponse};
