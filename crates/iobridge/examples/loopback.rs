//! Loopback demo: an in-memory host serving "stdin" and "stdout".
//!
//! The host grants a serial for each stdin read and queues the matching data
//! push; a small pump loop plays the host driver and delivers the queue.
//!
//! Run with: `cargo run --example loopback`

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use bytes::Bytes;
use iobridge::client::IoClient;
use iobridge::frame::{
    decode_request, encode_ack, encode_push, encode_utf16, kind, Ack, Op, Serial,
};

/// Serves stdin reads and stdout writes from memory.
struct LoopbackHost {
    next_serial: Serial,
    queued_pushes: VecDeque<Vec<u8>>,
}

impl LoopbackHost {
    fn new() -> Self {
        Self {
            next_serial: 1,
            queued_pushes: VecDeque::new(),
        }
    }

    fn handle(&mut self, frame: &[u8]) -> io::Result<Option<Bytes>> {
        let request =
            decode_request(frame).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        match (request.op, request.kind.as_str()) {
            (Op::Read, kind::STDIN) => {
                let serial = self.next_serial;
                self.next_serial += 1;

                let line = format!("host data for selector {:?}", request.payload);
                self.queued_pushes
                    .push_back(encode_push(serial, &encode_utf16(&line)).to_vec());

                tracing::debug!(serial, selector = %request.payload, "granted stdin read");
                Ok(encode_ack(&Ack::Success { serial }))
            }
            (Op::Write, kind::STDOUT) => {
                println!("[host stdout] {}", request.payload);
                Ok(None)
            }
            _ => Ok(encode_ack(&Ack::Error {
                message: format!("no such stream: {}", request.kind),
            })),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .init();

    let host = Rc::new(RefCell::new(LoopbackHost::new()));
    let channel = {
        let host = Rc::clone(&host);
        move |frame: &[u8]| host.borrow_mut().handle(frame)
    };
    let client = IoClient::new(channel);

    client.write_string(kind::STDOUT, "script starting")?;
    let response = client.read_string(kind::STDIN, "greeting")?;

    // Play the host driver: deliver every queued push.
    let dispatcher = client.dispatcher();
    let pushes: Vec<Vec<u8>> = host.borrow_mut().queued_pushes.drain(..).collect();
    for push in pushes {
        dispatcher.dispatch(&push)?;
    }

    let line = futures::executor::block_on(response)?;
    client.write_string(kind::STDOUT, &format!("script read: {line}"))?;

    match client.read_string("clipboard", "primary") {
        Err(err) => tracing::warn!(%err, "unknown stream rejected as expected"),
        Ok(_) => unreachable!("loopback host only serves stdin"),
    }

    Ok(())
}
