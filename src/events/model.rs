use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    pub ts: SystemTime,
    pub level: LogLevel,
    pub corr_id: Option<String>,
    pub session_id: String,
    pub component: &'static str,
}

/// Dial lifecycle event (`dial_start`, `dial_failed`, `relay_failed`,
/// `dial_connected`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct DialEvent {
    pub meta: EventMeta,
    pub action: String,
    pub service: String,
    pub terminator: Option<String>,
    /// Stable machine code of the settled status, once known
    pub status: Option<i32>,
    pub detail: Option<String>,
}

/// Enrollment lifecycle event. Carries a fingerprint of the token, never the
/// token itself.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollEvent {
    pub meta: EventMeta,
    pub action: String,
    pub token_fingerprint: Option<String>,
    pub status: Option<i32>,
    pub detail: Option<String>,
}

/// Service catalog event (lookups, refresh triggers).
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEvent {
    pub meta: EventMeta,
    pub action: String,
    pub service: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemEvent {
    pub meta: EventMeta,
    pub action: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    Dial(DialEvent),
    Enroll(EnrollEvent),
    Service(ServiceEvent),
    System(SystemEvent),
}
