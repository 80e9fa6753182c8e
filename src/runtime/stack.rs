//! The seam to the overlay protocol implementation.
//!
//! Everything protocol-specific (routing, encryption, the controller channel)
//! lives behind [`OverlayStack`]; connections obtained from a dial are
//! manipulated only through [`Connection`]. Backends run their own event-loop
//! thread(s) and invoke the completion callbacks from there, never from the
//! host thread.

use std::os::unix::net::UnixStream;

use crate::identity::IdentityConfig;
use crate::network::catalog::Protocol;
use crate::status::{Failure, Status};

/// Options carried by a dial. `stream` selects byte-stream semantics and is
/// always set by the request layer; datagram dials are not part of this
/// surface.
#[derive(Debug, Clone, Default)]
pub struct DialOptions {
    /// Optional terminator identity: narrows which backend instance of the
    /// named service is addressed.
    pub terminator: Option<String>,
    pub stream: bool,
}

/// Completion of a dial. The backend hands the connection back together with
/// the settled status so the request layer can attach a transport or close it.
pub type DialComplete = Box<dyn FnOnce(Box<dyn Connection>, Status) + Send + 'static>;

/// Completion of an enrollment.
pub type EnrollComplete = Box<dyn FnOnce(Result<IdentityConfig, Failure>) + Send + 'static>;

/// An SDK connection object, opaque to the host. The request layer closes it
/// exactly once on every terminal path except a successful transport
/// attachment, after which the backend owns its lifetime.
pub trait Connection: Send {
    /// Hand `transport` to the backend as this connection's byte-stream
    /// endpoint. On success the backend owns the stream.
    fn attach_transport(&mut self, transport: UnixStream) -> Result<(), Status>;

    /// Close the connection. Called at most once by the request layer.
    fn close(&mut self);
}

pub trait OverlayStack: Send + Sync {
    /// Open a connection and dial `service`. A synchronous `Err` means the
    /// dial could not be initiated and no completion will follow; after an
    /// `Ok` return the completion is invoked exactly once from a backend
    /// thread.
    fn dial(
        &self,
        service: &str,
        options: DialOptions,
        on_complete: DialComplete,
    ) -> Result<(), Status>;

    /// Begin enrollment with a one-time token (file path or token text).
    /// Same initiation/completion contract as `dial`.
    fn enroll(&self, token: &str, on_complete: EnrollComplete) -> Result<(), Status>;

    /// Synchronous service-table lookup for an intercepted address. Absence
    /// is a normal outcome.
    fn service_for_address(&self, protocol: Protocol, host: &str, port: u16) -> Option<String>;

    /// Ask the backend to refresh its service table. Fire and forget; the
    /// effect is not observable synchronously.
    fn refresh_services(&self, force: bool);

    /// Backend SDK version string.
    fn version(&self) -> String;
}
