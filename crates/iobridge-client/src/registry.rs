use std::cell::RefCell;
use std::collections::hash_map::{Entry, HashMap};

use bytes::Bytes;
use iobridge_frame::Serial;

use crate::error::{ClientError, Result};

/// Callback invoked with the payload when the host pushes data.
pub type Fulfill = Box<dyn FnOnce(Bytes)>;

/// Callback invoked when the request fails after being granted a serial.
pub type Fail = Box<dyn FnOnce(ClientError)>;

struct PendingEntry {
    fulfill: Fulfill,
    fail: Fail,
}

/// Table of read requests awaiting a data push, keyed by serial.
///
/// All mutation happens on one logical thread, but the two entry points
/// (issuing a request, receiving a push) interleave freely. The map borrow
/// is always released before a callback runs, so callbacks may re-enter the
/// registry — a resolved caller can immediately issue a new request.
///
/// Exactly one of fulfill/fail runs per entry, and the entry is removed
/// atomically with that invocation: at-most-one fulfillment per serial,
/// and a no-op rather than a fault on an unknown serial.
#[derive(Default)]
pub struct PendingRequests {
    entries: RefCell<HashMap<Serial, PendingEntry>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests currently awaiting a push.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Insert an entry for a freshly granted serial.
    ///
    /// A serial that is already pending is a protocol invariant breach on
    /// the host side and fails with [`ClientError::DuplicateSerial`].
    pub fn register(&self, serial: Serial, fulfill: Fulfill, fail: Fail) -> Result<()> {
        match self.entries.borrow_mut().entry(serial) {
            Entry::Occupied(_) => {
                tracing::error!(serial, "host granted a serial that is already pending");
                Err(ClientError::DuplicateSerial(serial))
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry { fulfill, fail });
                Ok(())
            }
        }
    }

    /// Remove the entry for `serial` and invoke its fulfill callback.
    ///
    /// Returns false without touching anything else if the serial is not
    /// pending — the host may push for a serial nobody waits on anymore.
    pub fn resolve(&self, serial: Serial, payload: Bytes) -> bool {
        let entry = self.entries.borrow_mut().remove(&serial);
        match entry {
            Some(entry) => {
                (entry.fulfill)(payload);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `serial` and invoke its fail callback.
    pub fn fail(&self, serial: Serial, error: ClientError) -> bool {
        let entry = self.entries.borrow_mut().remove(&serial);
        match entry {
            Some(entry) => {
                (entry.fail)(error);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `serial` without invoking either callback.
    ///
    /// Used when the caller abandons the request; a later push for the
    /// serial is then dropped like any other unmatched push.
    pub fn discard(&self, serial: Serial) -> bool {
        self.entries.borrow_mut().remove(&serial).is_some()
    }

    /// Fail every pending entry. Used on channel teardown.
    pub fn fail_all(&self, mut make_error: impl FnMut() -> ClientError) {
        let drained: Vec<PendingEntry> = {
            let mut entries = self.entries.borrow_mut();
            entries.drain().map(|(_, entry)| entry).collect()
        };
        for entry in drained {
            (entry.fail)(make_error());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counting_fulfill(count: &Rc<Cell<u32>>) -> Fulfill {
        let count = Rc::clone(count);
        Box::new(move |_| count.set(count.get() + 1))
    }

    fn panicking_fail() -> Fail {
        Box::new(|err| panic!("fail callback ran: {err}"))
    }

    #[test]
    fn fulfill_runs_exactly_once() {
        let registry = PendingRequests::new();
        let count = Rc::new(Cell::new(0));
        registry
            .register(7, counting_fulfill(&count), panicking_fail())
            .unwrap();

        assert!(registry.resolve(7, Bytes::from_static(b"x")));
        assert!(!registry.resolve(7, Bytes::from_static(b"x")));
        assert_eq!(count.get(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_serial_is_a_noop() {
        let registry = PendingRequests::new();
        let count = Rc::new(Cell::new(0));
        registry
            .register(7, counting_fulfill(&count), panicking_fail())
            .unwrap();

        assert!(!registry.resolve(8, Bytes::new()));
        assert!(!registry.fail(9, ClientError::ChannelClosed));
        assert_eq!(registry.len(), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn duplicate_serial_is_rejected() {
        let registry = PendingRequests::new();
        let count = Rc::new(Cell::new(0));
        registry
            .register(7, counting_fulfill(&count), panicking_fail())
            .unwrap();

        let err = registry
            .register(7, counting_fulfill(&count), panicking_fail())
            .unwrap_err();
        assert!(matches!(err, ClientError::DuplicateSerial(7)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn fail_runs_fail_callback() {
        let registry = PendingRequests::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        registry
            .register(
                3,
                Box::new(|_| panic!("fulfill ran")),
                Box::new(move |err| *sink.borrow_mut() = Some(err)),
            )
            .unwrap();

        assert!(registry.fail(3, ClientError::ChannelClosed));
        assert!(matches!(
            *seen.borrow(),
            Some(ClientError::ChannelClosed)
        ));
    }

    #[test]
    fn discard_removes_without_invoking() {
        let registry = PendingRequests::new();
        let count = Rc::new(Cell::new(0));
        registry
            .register(5, counting_fulfill(&count), panicking_fail())
            .unwrap();

        assert!(registry.discard(5));
        assert!(!registry.discard(5));
        assert_eq!(count.get(), 0);
        assert!(!registry.resolve(5, Bytes::new()));
    }

    #[test]
    fn fail_all_drains_every_entry() {
        let registry = PendingRequests::new();
        let count = Rc::new(Cell::new(0));
        for serial in 1..=3 {
            let count = Rc::clone(&count);
            registry
                .register(
                    serial,
                    Box::new(|_| panic!("fulfill ran")),
                    Box::new(move |_| count.set(count.get() + 1)),
                )
                .unwrap();
        }

        registry.fail_all(|| ClientError::ChannelClosed);
        assert_eq!(count.get(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn callbacks_may_reenter_the_registry() {
        let registry = Rc::new(PendingRequests::new());
        let count = Rc::new(Cell::new(0));

        let reentrant = {
            let registry = Rc::clone(&registry);
            let count = Rc::clone(&count);
            Box::new(move |_: Bytes| {
                registry
                    .register(8, counting_fulfill(&count), panicking_fail())
                    .unwrap();
            })
        };
        registry.register(7, reentrant, panicking_fail()).unwrap();

        assert!(registry.resolve(7, Bytes::new()));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(8, Bytes::new()));
        assert_eq!(count.get(), 1);
    }
}
