//! # Overlink Core Library
//!
//! Zero-trust overlay-network host SDK. Overlink exposes dial-a-service,
//! enroll-an-identity, and service lookup/refresh operations to a
//! single-threaded host runtime that communicates only through
//! callback-style completions, while the overlay backend runs its network
//! state machine on its own event-loop thread.
//!
//! ## Design Principles
//! * One crossing point: completions travel from backend worker threads to
//!   the host thread only through the completion bridge, which fires each
//!   registered handler at most once.
//! * Sockets, not wrappers: a dialed service surfaces as an ordinary
//!   connected byte-stream socket the host can read and write like any
//!   local connection.
//! * Narrow seams: the overlay protocol itself (routing, encryption, the
//!   controller channel) stays behind the `OverlayStack` trait.
//! * Nothing dangles: every connection and every bridge handle is released
//!   on every exit path, including teardown while completions are in flight.
//!
//! ## Key Modules
//! * `bridge` – single-fire, thread-safe completion handoff.
//! * `network` – dial/enroll request flows, the stream relay, catalog access.
//! * `runtime` – the `OverlayStack` seam, the process-scoped `Session`, and
//!   the in-memory loopback backend.
//! * `identity` – enrollment output documents.
//! * `config` – runtime configuration (TOML).
//! * `events` – structured logging/events dispatcher.
//! * `status` – stable status codes and failure values.
//!
//! ## Status
//! Pre-initial public release. APIs may change without notice until version
//! 0.1.0 is tagged.

pub mod bridge;
pub mod config;
pub mod constants;
pub mod events;
pub mod identity;
pub mod network;
pub mod prelude; // curated stable-intent re-exports
pub mod runtime;
pub mod status;
