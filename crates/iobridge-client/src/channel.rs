use std::io;

use bytes::Bytes;

/// The synchronous send primitive provided by the host environment.
///
/// One `call` is exactly one host round trip over the shared channel: the
/// host answers immediately with an acknowledgment frame, or with nothing
/// (`None`) for requests that expect no streamed reply. The call blocks the
/// execution context until that reply arrives.
///
/// No retries happen at this layer; a transport failure is surfaced upward
/// as-is.
pub trait HostChannel {
    /// Send one request frame and return the host's immediate reply, if any.
    fn call(&mut self, frame: &[u8]) -> io::Result<Option<Bytes>>;
}

impl<F> HostChannel for F
where
    F: FnMut(&[u8]) -> io::Result<Option<Bytes>>,
{
    fn call(&mut self, frame: &[u8]) -> io::Result<Option<Bytes>> {
        self(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_channels() {
        let mut seen = Vec::new();
        let mut channel = |frame: &[u8]| {
            seen.push(frame.len());
            Ok(None)
        };

        let reply = HostChannel::call(&mut channel, b"abcd").unwrap();
        assert!(reply.is_none());
        assert_eq!(seen, vec![4]);
    }
}
