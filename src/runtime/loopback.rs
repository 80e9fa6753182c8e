//! Loopback overlay backend.
//!
//! An in-memory [`OverlayStack`] that runs on its own event-loop thread,
//! used by the CLI front-ends and the integration tests. Registered services
//! echo bytes back to the caller; enrollment evaluates JWT-shaped tokens and
//! mints self-signed identity material. Connection accounting is exposed so
//! callers can assert the close-on-every-terminal-path invariant.

use std::collections::HashMap;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::constants;
use crate::identity::{IdentityConfig, IdentityMaterial};
use crate::network::catalog::Protocol;
use crate::runtime::stack::{
    Connection, DialComplete, DialOptions, EnrollComplete, OverlayStack,
};
use crate::status::{Failure, Status};

/// How a loopback service treats an attached transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceBehavior {
    /// Echo every byte back until the peer closes.
    Echo,
    /// Accept the dial but fail transport attachment. Exercises the
    /// relay-failure path after a successful dial.
    FailAttach,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    refreshes: AtomicUsize,
}

pub struct LoopbackStack {
    runtime: Runtime,
    services: RwLock<HashMap<String, ServiceBehavior>>,
    intercepts: RwLock<HashMap<(Protocol, String, u16), String>>,
    counters: Arc<Counters>,
    /// Controller endpoint stamped into enrolled identity documents when the
    /// token does not carry an issuer.
    controller: String,
}

impl LoopbackStack {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("overlink-sdk")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            services: RwLock::new(HashMap::new()),
            intercepts: RwLock::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
            controller: "https://overlink.local:1280".to_string(),
        })
    }

    /// Register a named echo service.
    pub fn register_echo_service(&self, name: &str) {
        self.services
            .write()
            .insert(name.to_string(), ServiceBehavior::Echo);
    }

    /// Register a service whose transport attachment always fails.
    pub fn register_attach_fault(&self, name: &str) {
        self.services
            .write()
            .insert(name.to_string(), ServiceBehavior::FailAttach);
    }

    /// Map an intercepted address onto a service name for catalog lookups.
    pub fn register_intercept(&self, protocol: Protocol, host: &str, port: u16, service: &str) {
        self.intercepts
            .write()
            .insert((protocol, host.to_string(), port), service.to_string());
    }

    /// Connections opened minus connections settled. A connection that
    /// reached a transport counts as settled once its relay pump winds down.
    pub fn live_connections(&self) -> usize {
        let opened = self.counters.opened.load(Ordering::SeqCst);
        let closed = self.counters.closed.load(Ordering::SeqCst);
        opened.saturating_sub(closed)
    }

    /// Number of refresh triggers received.
    pub fn refresh_count(&self) -> usize {
        self.counters.refreshes.load(Ordering::SeqCst)
    }
}

impl OverlayStack for LoopbackStack {
    fn dial(
        &self,
        service: &str,
        options: DialOptions,
        on_complete: DialComplete,
    ) -> Result<(), Status> {
        if !options.stream {
            // Datagram dials are not part of this surface.
            return Err(Status::InvalidArgument);
        }
        let behavior = self.services.read().get(service).copied();
        let status = match behavior {
            Some(_) => Status::Ok,
            None => Status::ServiceUnavailable,
        };
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let conn: Box<dyn Connection> = Box::new(LoopbackConn {
            behavior,
            handle: self.runtime.handle().clone(),
            counters: self.counters.clone(),
            settled: false,
        });
        // Settle from the event-loop thread after a scheduling hop so the
        // completion is always observed after this call returns.
        self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            on_complete(conn, status);
        });
        Ok(())
    }

    fn enroll(&self, token: &str, on_complete: EnrollComplete) -> Result<(), Status> {
        let token = token.to_string();
        let controller = self.controller.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            on_complete(evaluate_token(&controller, &token));
        });
        Ok(())
    }

    fn service_for_address(&self, protocol: Protocol, host: &str, port: u16) -> Option<String> {
        self.intercepts
            .read()
            .get(&(protocol, host.to_string(), port))
            .cloned()
    }

    fn refresh_services(&self, _force: bool) {
        self.counters.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn version(&self) -> String {
        constants::full_version()
    }
}

struct LoopbackConn {
    behavior: Option<ServiceBehavior>,
    handle: Handle,
    counters: Arc<Counters>,
    settled: bool,
}

impl Connection for LoopbackConn {
    fn attach_transport(&mut self, transport: StdUnixStream) -> Result<(), Status> {
        match self.behavior {
            Some(ServiceBehavior::Echo) => {}
            Some(ServiceBehavior::FailAttach) => return Err(Status::TransportFailed),
            None => return Err(Status::ConnectionClosed),
        }
        if transport.set_nonblocking(true).is_err() {
            return Err(Status::TransportFailed);
        }
        // Ownership of the transport passes to the pump; the connection is
        // settled once the pump finishes.
        self.settled = true;
        let counters = self.counters.clone();
        self.handle.spawn(async move {
            let result = async {
                let stream = tokio::net::UnixStream::from_std(transport)?;
                echo_pump(stream).await
            }
            .await;
            let _ = result;
            counters.closed.fetch_add(1, Ordering::SeqCst);
        });
        Ok(())
    }

    fn close(&mut self) {
        if !self.settled {
            self.settled = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn echo_pump(stream: tokio::net::UnixStream) -> std::io::Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
    }
    Ok(())
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Evaluate a JWT-shaped enrollment token. The argument may be a path to the
/// token file or the token text itself. Enforces the `exp` claim; mints a
/// self-signed certificate for the subject on success.
fn evaluate_token(default_controller: &str, token: &str) -> Result<IdentityConfig, Failure> {
    let raw = match std::fs::read_to_string(token) {
        Ok(contents) => contents,
        Err(_) => token.to_string(),
    };
    let raw = raw.trim();

    let mut segments = raw.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Failure::from(Status::EnrollmentInvalid));
    };
    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Failure::from(Status::EnrollmentInvalid))?;
    let claims: serde_json::Value =
        serde_json::from_slice(&decoded).map_err(|_| Failure::from(Status::EnrollmentInvalid))?;

    if let Some(exp) = claims.get("exp").and_then(|v| v.as_u64()) {
        if exp <= now_unix() {
            return Err(Failure::from(Status::EnrollmentExpired));
        }
    }

    let subject = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .unwrap_or("overlink-identity");
    let controller = claims
        .get("iss")
        .and_then(|v| v.as_str())
        .unwrap_or(default_controller)
        .to_string();

    let issued = rcgen::generate_simple_self_signed(vec![format!("{}.overlink", subject)])
        .map_err(|e| Failure::new(Status::Internal, e.to_string()))?;
    let cert_pem = issued.cert.pem();
    Ok(IdentityConfig {
        controller,
        id: IdentityMaterial {
            cert: cert_pem.clone(),
            key: issued.key_pair.serialize_pem(),
            // Self-signed: the certificate is its own trust anchor.
            ca: cert_pem,
        },
    })
}
