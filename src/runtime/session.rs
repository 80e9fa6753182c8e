//! The process-scoped overlay session.
//!
//! One `Session` is established per process (or per test) and owns the only
//! shared resources: the backend stack handle, the completion bridge, and
//! the host mailbox. Requests never block the host beyond scheduling; every
//! host-visible transition happens when the owner pumps the mailbox from its
//! single thread.

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{completion_bridge, CompletionBridge, HostMailbox};
use crate::config::Config;
use crate::events::{
    dispatcher,
    model::{LogEvent, LogLevel, SystemEvent},
};
use crate::network::catalog::{Protocol, ServiceCatalog};
use crate::network::{dial, enroll};
use crate::runtime::stack::OverlayStack;
use crate::status::{Failure, Status};

pub struct Session {
    stack: Arc<dyn OverlayStack>,
    bridge: CompletionBridge,
    mailbox: HostMailbox,
    catalog: ServiceCatalog,
}

impl Session {
    /// Establish the process-scoped context. Fails synchronously when the
    /// configured identity document does not exist; nothing is allocated in
    /// that case.
    pub fn init(stack: Arc<dyn OverlayStack>, config: &Config) -> Result<Self, Status> {
        if let Some(identity) = config.identity.as_deref() {
            if !Path::new(identity).is_file() {
                return Err(Status::ConfigNotFound);
            }
        }
        let capacity = config.completion_queue_capacity();
        let (bridge, mailbox) = completion_bridge(capacity);
        let catalog = ServiceCatalog::new(stack.clone());
        let session = Self {
            stack,
            bridge,
            mailbox,
            catalog,
        };
        session.emit_system(
            "session_init",
            Some(format!("queue_capacity={}", capacity)),
        );
        if config
            .services
            .as_ref()
            .and_then(|s| s.refresh_on_init)
            .unwrap_or(false)
        {
            session.stack.refresh_services(true);
        }
        Ok(session)
    }

    /// Dial `service` and deliver either the consumer-side socket or a
    /// failure to `on_complete`, exactly once, when the mailbox is pumped.
    /// Validation and initiation failures return synchronously instead.
    pub fn connect<F>(
        &self,
        service: &str,
        terminator: Option<&str>,
        on_complete: F,
    ) -> Result<(), Status>
    where
        F: FnOnce(Result<UnixStream, Failure>) + Send + 'static,
    {
        dial::connect(&self.stack, &self.bridge, service, terminator, on_complete)
    }

    /// Enroll with a one-time token (file path or token text) and deliver
    /// either the identity document's canonical JSON or a failure to
    /// `on_complete`, exactly once.
    pub fn enroll<F>(&self, token: &str, on_complete: F) -> Result<(), Status>
    where
        F: FnOnce(Result<String, Failure>) + Send + 'static,
    {
        enroll::enroll(&self.stack, &self.bridge, token, on_complete)
    }

    /// Name of the service intercepting `protocol://host:port`, if any.
    pub fn service_for_address(&self, protocol: Protocol, host: &str, port: u16) -> Option<String> {
        self.catalog.service_for_address(protocol, host, port)
    }

    /// Trigger a service-table refresh. Always reports `Ok`.
    pub fn refresh_services(&self) -> Status {
        self.catalog.refresh_services()
    }

    /// Backend SDK version string.
    pub fn sdk_version(&self) -> String {
        self.stack.version()
    }

    /// Deliver the next queued completion, waiting up to `timeout`. Returns
    /// false when nothing arrived in time.
    pub fn process_next(&self, timeout: Duration) -> bool {
        self.mailbox.process_next(timeout)
    }

    /// Deliver everything already queued without waiting; returns the count.
    pub fn drain_pending(&self) -> usize {
        self.mailbox.drain_pending()
    }

    /// Tear the session down. Handlers that never fired are released without
    /// running; completions still in flight on backend threads are dropped
    /// with their resource cleanup once they reach the closed mailbox.
    pub fn shutdown(self) {
        self.emit_system("session_shutdown", None);
        self.bridge.retire_all();
        // The mailbox drops with `self`; late firings become silent no-ops.
    }

    fn emit_system(&self, action: &str, detail: Option<String>) {
        let mut meta = dispatcher::meta("session", LogLevel::Info);
        meta.corr_id = Some(dispatcher::correlation_id());
        dispatcher::emit(LogEvent::System(SystemEvent {
            meta,
            action: action.into(),
            detail,
        }));
    }
}
