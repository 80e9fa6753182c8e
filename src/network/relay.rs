// src/network/relay.rs

//! Stream relay: the connected pair of byte-stream endpoints that exposes a
//! backend connection as ordinary socket I/O.
//!
//! The two ends are created atomically as an `AF_UNIX` socketpair. Ownership
//! splits exactly once, via [`StreamRelay::into_ends`]: the transport end
//! passes to the backend connection, the consumer end passes to the host
//! inside the dial success payload. If pair creation fails the caller must
//! close the connection and report a dial failure; a connection without a
//! transport is unusable and must not linger.

use std::os::unix::net::UnixStream;

pub struct StreamRelay {
    transport: UnixStream,
    consumer: UnixStream,
}

impl StreamRelay {
    /// Create the connected pair.
    pub fn pair() -> std::io::Result<Self> {
        let (transport, consumer) = UnixStream::pair()?;
        Ok(Self {
            transport,
            consumer,
        })
    }

    /// Split into `(transport end, consumer end)`.
    pub fn into_ends(self) -> (UnixStream, UnixStream) {
        (self.transport, self.consumer)
    }
}
