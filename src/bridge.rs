//! Completion bridge: the single legal crossing point between backend worker
//! threads and the host thread.
//!
//! Registering a handler yields a [`CallbackHandle`] token. A backend thread
//! fires the token with a payload; the payload is queued and the handler runs
//! when the host pumps its [`HostMailbox`]. Delivery removes the handler, so
//! a token delivers at most once. Firing a released token, firing twice, or
//! firing after the mailbox is gone all degrade to dropping the payload, and
//! payloads release their resources in `Drop` (a dropped dial success closes
//! its socket, which winds the backend relay pump down).

use std::collections::HashMap;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::status::{Failure, Status};

/// Capability token for a registered completion handler. Consumed by at most
/// one delivery; `release` retires it without firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u64);

/// Payload delivered through the bridge.
#[derive(Debug)]
pub enum Completion {
    Dial(DialOutcome),
    Enroll(EnrollOutcome),
}

/// Outcome of a dial: a live consumer-side stream, or a failure status.
#[derive(Debug)]
pub struct DialOutcome {
    status: Status,
    socket: Option<UnixStream>,
}

impl DialOutcome {
    pub fn success(socket: UnixStream) -> Self {
        Self {
            status: Status::Ok,
            socket: Some(socket),
        }
    }

    pub fn failure(status: Status) -> Self {
        debug_assert!(!status.is_ok());
        Self {
            status,
            socket: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn into_result(self) -> Result<UnixStream, Failure> {
        match self.socket {
            Some(socket) if self.status.is_ok() => Ok(socket),
            _ => Err(Failure::from(self.status)),
        }
    }
}

/// Outcome of an enrollment. Exactly one of config text / error message is
/// present, enforced by the constructors.
#[derive(Debug)]
pub struct EnrollOutcome {
    status: Status,
    config: Option<String>,
    error: Option<String>,
}

impl EnrollOutcome {
    pub fn success(config: String) -> Self {
        debug_assert!(!config.is_empty());
        Self {
            status: Status::Ok,
            config: Some(config),
            error: None,
        }
    }

    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        debug_assert!(!status.is_ok());
        let failure = Failure::new(status, message);
        Self {
            status: failure.status,
            config: None,
            error: Some(failure.message),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn into_result(self) -> Result<String, Failure> {
        match (self.config, self.error) {
            (Some(config), None) if self.status.is_ok() => Ok(config),
            (_, Some(error)) => Err(Failure::new(self.status, error)),
            _ => Err(Failure::from(Status::Internal)),
        }
    }
}

pub type CompletionHandler = Box<dyn FnOnce(Completion) + Send + 'static>;

struct Firing {
    token: u64,
    payload: Completion,
}

struct BridgeShared {
    handlers: Mutex<HashMap<u64, CompletionHandler>>,
    next_token: AtomicU64,
    tx: SyncSender<Firing>,
}

/// Thread-safe sender half of the bridge. Clones are captured by backend
/// completion closures.
#[derive(Clone)]
pub struct CompletionBridge {
    shared: Arc<BridgeShared>,
}

/// Host-side receiver half. Owned by the single host thread; dropping it
/// turns every later firing into a silent no-op.
pub struct HostMailbox {
    shared: Arc<BridgeShared>,
    rx: Receiver<Firing>,
}

/// Create a connected bridge with a bounded queue of `capacity` completions.
pub fn completion_bridge(capacity: usize) -> (CompletionBridge, HostMailbox) {
    let (tx, rx) = std::sync::mpsc::sync_channel(capacity.max(1));
    let shared = Arc::new(BridgeShared {
        handlers: Mutex::new(HashMap::new()),
        next_token: AtomicU64::new(1),
        tx,
    });
    (
        CompletionBridge {
            shared: shared.clone(),
        },
        HostMailbox { shared, rx },
    )
}

impl CompletionBridge {
    pub fn register(&self, handler: CompletionHandler) -> CallbackHandle {
        let token = self.shared.next_token.fetch_add(1, Ordering::Relaxed);
        self.shared.handlers.lock().insert(token, handler);
        CallbackHandle(token)
    }

    /// Queue `payload` for delivery on the host thread. Callable from any
    /// thread; blocks the caller while the bounded queue is full. When the
    /// mailbox is gone the payload is dropped here, together with the
    /// handler, so neither side leaks.
    pub fn fire(&self, handle: CallbackHandle, payload: Completion) {
        if self
            .shared
            .tx
            .send(Firing {
                token: handle.0,
                payload,
            })
            .is_err()
        {
            drop(self.shared.handlers.lock().remove(&handle.0));
        }
    }

    /// Retire `handle` without firing. A later firing of the same token
    /// delivers nothing.
    pub fn release(&self, handle: CallbackHandle) {
        self.shared.handlers.lock().remove(&handle.0);
    }

    /// Retire every registered handler without firing. Session teardown.
    pub fn retire_all(&self) {
        self.shared.handlers.lock().clear();
    }

    /// Handlers currently registered and not yet fired or released.
    pub fn pending_handlers(&self) -> usize {
        self.shared.handlers.lock().len()
    }
}

impl HostMailbox {
    /// Deliver the next queued completion, waiting up to `timeout`. Returns
    /// false on timeout or once every sender is gone.
    pub fn process_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(firing) => {
                self.deliver(firing);
                true
            }
            Err(_) => false,
        }
    }

    /// Deliver everything already queued without waiting; returns the count.
    pub fn drain_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(firing) = self.rx.try_recv() {
            self.deliver(firing);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, firing: Firing) {
        // remove() is what makes delivery single-shot: a token that was
        // released or already fired has no handler left, and the payload
        // drops with its cleanup.
        let handler = self.shared.handlers.lock().remove(&firing.token);
        match handler {
            Some(handler) => handler(firing.payload),
            None => drop(firing.payload),
        }
    }
}
