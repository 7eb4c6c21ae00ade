use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use iobridge_frame::{decode_utf16, Serial};

use crate::error::{ClientError, Result};
use crate::registry::PendingRequests;

enum SlotState {
    Waiting,
    Ready(Bytes),
    Failed(ClientError),
    Taken,
}

/// One-shot slot shared between the future and the registry callbacks.
struct Slot {
    state: RefCell<SlotState>,
    waker: RefCell<Option<Waker>>,
}

impl Slot {
    fn complete(&self, next: SlotState) {
        *self.state.borrow_mut() = next;
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// A single-resolution future for the data push matching one granted serial.
///
/// Constructing it registers the fulfill/fail pair in the registry; the
/// one-shot transition to resolved or failed happens when the delivery path
/// invokes one of them. Dropping an unresolved `Response` discards the
/// registry entry — the request is abandoned and a late push for its serial
/// is silently dropped.
pub struct Response {
    slot: Rc<Slot>,
    pending: Rc<PendingRequests>,
    serial: Serial,
}

impl Response {
    /// Register a pending entry for `serial` and return the future that
    /// resolves when the host pushes data under it.
    pub(crate) fn new(pending: Rc<PendingRequests>, serial: Serial) -> Result<Self> {
        let slot = Rc::new(Slot {
            state: RefCell::new(SlotState::Waiting),
            waker: RefCell::new(None),
        });

        let fulfill = {
            let slot = Rc::clone(&slot);
            Box::new(move |payload: Bytes| slot.complete(SlotState::Ready(payload)))
        };
        let fail = {
            let slot = Rc::clone(&slot);
            Box::new(move |error: ClientError| slot.complete(SlotState::Failed(error)))
        };
        pending.register(serial, fulfill, fail)?;

        Ok(Self {
            slot,
            pending,
            serial,
        })
    }

    /// The serial this future is waiting on.
    pub fn serial(&self) -> Serial {
        self.serial
    }
}

impl Future for Response {
    type Output = Result<Bytes>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.slot.state.borrow_mut();
        match mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(payload) => Poll::Ready(Ok(payload)),
            SlotState::Failed(error) => Poll::Ready(Err(error)),
            SlotState::Waiting => {
                *state = SlotState::Waiting;
                drop(state);
                *self.slot.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
            SlotState::Taken => panic!("Response polled after completion"),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        if matches!(*self.slot.state.borrow(), SlotState::Waiting)
            && self.pending.discard(self.serial)
        {
            tracing::trace!(serial = self.serial, "abandoned pending read");
        }
    }
}

/// A [`Response`] that decodes its payload as UTF-16 text at resolution.
#[derive(Debug)]
pub struct StringResponse {
    inner: Response,
}

impl StringResponse {
    pub(crate) fn new(inner: Response) -> Self {
        Self { inner }
    }

    /// The serial this future is waiting on.
    pub fn serial(&self) -> Serial {
        self.inner.serial()
    }
}

impl Future for StringResponse {
    type Output = Result<String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().inner)
            .poll(cx)
            .map(|result| result.and_then(|payload| Ok(decode_utf16(&payload)?)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    use futures_util::task::noop_waker;

    use super::*;

    fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        Pin::new(fut).poll(&mut cx)
    }

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn resolves_when_registry_fulfills() {
        let pending = Rc::new(PendingRequests::new());
        let mut response = Response::new(Rc::clone(&pending), 7).unwrap();

        assert!(poll_once(&mut response).is_pending());
        assert!(pending.resolve(7, Bytes::from_static(b"bar")));

        match poll_once(&mut response) {
            Poll::Ready(Ok(payload)) => assert_eq!(payload.as_ref(), b"bar"),
            other => panic!("expected resolved payload, got {other:?}"),
        }
    }

    #[test]
    fn fails_when_registry_fails() {
        let pending = Rc::new(PendingRequests::new());
        let mut response = Response::new(Rc::clone(&pending), 7).unwrap();

        assert!(pending.fail(7, ClientError::ChannelClosed));
        assert!(matches!(
            poll_once(&mut response),
            Poll::Ready(Err(ClientError::ChannelClosed))
        ));
    }

    #[test]
    fn resolution_wakes_the_registered_waker() {
        let pending = Rc::new(PendingRequests::new());
        let mut response = Response::new(Rc::clone(&pending), 7).unwrap();

        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);
        assert!(Pin::new(&mut response).poll(&mut cx).is_pending());

        pending.resolve(7, Bytes::new());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(poll_once(&mut response).is_ready());
    }

    #[test]
    fn drop_discards_the_pending_entry() {
        let pending = Rc::new(PendingRequests::new());
        let response = Response::new(Rc::clone(&pending), 7).unwrap();
        assert_eq!(pending.len(), 1);

        drop(response);
        assert!(pending.is_empty());
        assert!(!pending.resolve(7, Bytes::new()));
    }

    #[test]
    fn resolved_response_does_not_discard_on_drop() {
        let pending = Rc::new(PendingRequests::new());
        let mut response = Response::new(Rc::clone(&pending), 7).unwrap();
        pending.resolve(7, Bytes::new());
        assert!(poll_once(&mut response).is_ready());

        // The serial may be reused once resolved; dropping the old future
        // must not touch a newer entry under the same serial.
        let _newer = Response::new(Rc::clone(&pending), 7).unwrap();
        drop(response);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn string_response_decodes_utf16() {
        let pending = Rc::new(PendingRequests::new());
        let inner = Response::new(Rc::clone(&pending), 7).unwrap();
        let mut response = StringResponse::new(inner);

        pending.resolve(7, Bytes::from(iobridge_frame::encode_utf16("bar")));
        match poll_once(&mut response) {
            Poll::Ready(Ok(text)) => assert_eq!(text, "bar"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn string_response_rejects_malformed_text() {
        let pending = Rc::new(PendingRequests::new());
        let inner = Response::new(Rc::clone(&pending), 7).unwrap();
        let mut response = StringResponse::new(inner);

        pending.resolve(7, Bytes::from_static(&[0x61]));
        assert!(matches!(
            poll_once(&mut response),
            Poll::Ready(Err(ClientError::Frame(_)))
        ));
    }
}
