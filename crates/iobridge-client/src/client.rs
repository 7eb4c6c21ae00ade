use std::cell::RefCell;
use std::rc::Rc;

use iobridge_frame::{decode_ack, decode_push, encode_request, Ack, Op};

use crate::channel::HostChannel;
use crate::error::{ClientError, Result};
use crate::registry::PendingRequests;
use crate::response::{Response, StringResponse};

/// Client facade for host stream I/O.
///
/// Owns the channel and the pending-request registry; collaborators see
/// only named-stream reads and writes, never codec or registry details.
///
/// Request lifecycle: the request frame goes out in one synchronous channel
/// call. An `Error` acknowledgment fails the call immediately without
/// registering anything. A `Success` acknowledgment grants a serial, and the
/// returned future resolves when the host later pushes data under it via
/// [`IoClient::deliver`].
pub struct IoClient<C> {
    channel: RefCell<C>,
    pending: Rc<PendingRequests>,
}

impl<C: HostChannel> IoClient<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel: RefCell::new(channel),
            pending: Rc::new(PendingRequests::new()),
        }
    }

    /// Request the bytes of a named stream.
    ///
    /// `selector` is an opaque string the host interprets for the given
    /// kind. Returns a future for the eventual payload.
    pub fn read_bytes(&self, kind: &str, selector: &str) -> Result<Response> {
        let frame = encode_request(Op::Read, kind, selector)?;
        match self.call(&frame)? {
            Ack::Success { serial } => {
                tracing::trace!(serial, kind, "read request granted");
                Response::new(Rc::clone(&self.pending), serial)
            }
            Ack::Error { message } => Err(ClientError::Host(message)),
            Ack::Empty => Err(ClientError::MissingSerial),
        }
    }

    /// Request a named stream and decode the eventual payload as text.
    pub fn read_string(&self, kind: &str, selector: &str) -> Result<StringResponse> {
        Ok(StringResponse::new(self.read_bytes(kind, selector)?))
    }

    /// Write a string value to a named sink.
    ///
    /// Writes are fire-and-forget: the only correct synchronous reply is no
    /// frame at all. A host that acknowledges a write with a serial has
    /// broken the protocol contract, and that is reported loudly rather
    /// than ignored.
    pub fn write_string(&self, kind: &str, value: &str) -> Result<()> {
        let frame = encode_request(Op::Write, kind, value)?;
        match self.call(&frame)? {
            Ack::Empty => Ok(()),
            Ack::Error { message } => Err(ClientError::Host(message)),
            Ack::Success { serial } => Err(ClientError::UnexpectedWriteAck(serial)),
        }
    }

    /// Feed one inbound push frame from the host into the delivery path.
    ///
    /// Equivalent to `self.dispatcher().dispatch(frame)`.
    pub fn deliver(&self, frame: &[u8]) -> Result<()> {
        Dispatcher {
            pending: Rc::clone(&self.pending),
        }
        .dispatch(frame)
    }

    /// A handle for the host driver to deliver pushes without borrowing the
    /// client. All dispatchers for one client share the same registry.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            pending: Rc::clone(&self.pending),
        }
    }

    /// Number of reads still awaiting a data push.
    pub fn pending_reads(&self) -> usize {
        self.pending.len()
    }

    /// Fail every pending request; call when the channel is gone for good.
    pub fn disconnect(&self) {
        let pending = self.pending.len();
        if pending > 0 {
            tracing::warn!(pending, "channel closed with requests pending");
        }
        self.pending.fail_all(|| ClientError::ChannelClosed);
    }

    fn call(&self, frame: &[u8]) -> Result<Ack> {
        let reply = self.channel.borrow_mut().call(frame)?;
        match reply {
            Some(bytes) => Ok(decode_ack(&bytes)?),
            None => Ok(Ack::Empty),
        }
    }
}

/// The receive hook: decodes inbound pushes and resolves pending requests.
///
/// The handler must not block the host's delivery path — dispatch is decode,
/// lookup, callback, return. A push for a serial with no pending consumer is
/// dropped by design, not an error.
#[derive(Clone)]
pub struct Dispatcher {
    pending: Rc<PendingRequests>,
}

impl Dispatcher {
    /// Handle one inbound frame pushed by the host.
    pub fn dispatch(&self, frame: &[u8]) -> Result<()> {
        let push = decode_push(frame)?;
        if self.pending.resolve(push.serial, push.payload) {
            tracing::trace!(serial = push.serial, "push resolved a pending read");
        } else {
            tracing::debug!(serial = push.serial, "dropping push for unknown serial");
        }
        Ok(())
    }
}
