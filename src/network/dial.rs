// src/network/dial.rs

//! Dial requests: connect to a named overlay service and hand the host a
//! live byte-stream endpoint.

use std::os::unix::net::UnixStream;
use std::sync::Arc;

use crate::bridge::{CallbackHandle, Completion, CompletionBridge, DialOutcome};
use crate::events::model::LogLevel;
use crate::network::events::emit_dial_event;
use crate::network::relay::StreamRelay;
use crate::runtime::stack::{Connection, DialOptions, OverlayStack};
use crate::status::{Failure, Status};

/// Dial request lifecycle. Validation happens before a request exists, so
/// the machine starts at `Opening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialState {
    Opening,
    Dialing,
    Bridging,
    Connected,
    Failed,
}

/// One in-flight dial. Owned by the request layer until the native call is
/// issued, then moved into the completion closure; every terminal transition
/// fires the bridge handle exactly once.
struct DialRequest {
    service: String,
    terminator: Option<String>,
    state: DialState,
    handle: CallbackHandle,
    bridge: CompletionBridge,
}

/// Issue a dial. Validation and initiation failures surface synchronously
/// and no completion is owed; once the backend accepts the dial, exactly one
/// completion reaches `on_complete` through the bridge, carrying either the
/// consumer-side socket or the failure.
pub(crate) fn connect<F>(
    stack: &Arc<dyn OverlayStack>,
    bridge: &CompletionBridge,
    service: &str,
    terminator: Option<&str>,
    on_complete: F,
) -> Result<(), Status>
where
    F: FnOnce(Result<UnixStream, Failure>) + Send + 'static,
{
    if service.trim().is_empty() {
        return Err(Status::InvalidArgument);
    }

    let handle = bridge.register(Box::new(move |completion| {
        if let Completion::Dial(outcome) = completion {
            on_complete(outcome.into_result());
        }
    }));

    let mut request = DialRequest {
        service: service.to_string(),
        terminator: terminator.map(str::to_string),
        state: DialState::Opening,
        handle,
        bridge: bridge.clone(),
    };
    emit_dial_event(
        LogLevel::Info,
        "dial_start",
        &request.service,
        request.terminator.as_deref(),
        None,
        None,
    );

    let options = DialOptions {
        terminator: request.terminator.clone(),
        stream: true,
    };
    request.state = DialState::Dialing;
    let initiated = stack.dial(
        service,
        options,
        Box::new(move |conn, status| request.complete(conn, status)),
    );

    if let Err(status) = initiated {
        // The completion will never run: retire the handle unfired and
        // report synchronously.
        bridge.release(handle);
        emit_dial_event(
            LogLevel::Error,
            "dial_initiate_failed",
            service,
            terminator,
            Some(status),
            None,
        );
        return Err(status);
    }
    Ok(())
}

impl DialRequest {
    /// Runs on a backend thread once the native dial settles.
    fn complete(mut self, mut conn: Box<dyn Connection>, status: Status) {
        if !status.is_ok() {
            self.fail(conn.as_mut(), "dial_failed", status, None);
            return;
        }

        self.state = DialState::Bridging;
        let relay = match StreamRelay::pair() {
            Ok(relay) => relay,
            Err(err) => {
                // A connection without a transport is unusable; report the
                // pairing error as the dial failure rather than dropping it.
                self.fail(
                    conn.as_mut(),
                    "relay_failed",
                    Status::TransportFailed,
                    Some(err.to_string()),
                );
                return;
            }
        };

        let (transport, consumer) = relay.into_ends();
        if let Err(status) = conn.attach_transport(transport) {
            self.fail(conn.as_mut(), "relay_attach_failed", status, None);
            return;
        }

        // Transport attached: the backend owns the connection from here on.
        self.state = DialState::Connected;
        emit_dial_event(
            LogLevel::Info,
            "dial_connected",
            &self.service,
            self.terminator.as_deref(),
            Some(Status::Ok),
            None,
        );
        self.bridge
            .fire(self.handle, Completion::Dial(DialOutcome::success(consumer)));
    }

    fn fail(&mut self, conn: &mut dyn Connection, action: &str, status: Status, detail: Option<String>) {
        let stage = self.state;
        self.state = DialState::Failed;
        conn.close();
        emit_dial_event(
            LogLevel::Error,
            action,
            &self.service,
            self.terminator.as_deref(),
            Some(status),
            Some(match detail {
                Some(detail) => format!("stage={:?} {}", stage, detail),
                None => format!("stage={:?}", stage),
            }),
        );
        self.bridge
            .fire(self.handle, Completion::Dial(DialOutcome::failure(status)));
    }
}
