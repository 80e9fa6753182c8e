//! Status codes shared across the host-facing API surface.
//!
//! Every failure that reaches the host carries a stable machine code plus a
//! human-readable string. `Status` covers the fixed vocabulary; `Failure`
//! additionally carries the backend's message where it supplies one (e.g.
//! enrollment rejections).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    ConfigNotFound,
    InvalidArgument,
    ServiceUnavailable,
    ConnectionClosed,
    TransportFailed,
    EnrollmentExpired,
    EnrollmentInvalid,
    Internal,
}

impl Status {
    /// Stable machine code: 0 for success, negative otherwise.
    pub fn code(&self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::ConfigNotFound => -1,
            Status::InvalidArgument => -2,
            Status::ServiceUnavailable => -3,
            Status::ConnectionClosed => -4,
            Status::TransportFailed => -5,
            Status::EnrollmentExpired => -6,
            Status::EnrollmentInvalid => -7,
            Status::Internal => -8,
        }
    }

    /// Human-readable string associated with the code.
    pub fn message(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::ConfigNotFound => "configuration not found",
            Status::InvalidArgument => "invalid argument",
            Status::ServiceUnavailable => "service not available",
            Status::ConnectionClosed => "connection is closed",
            Status::TransportFailed => "transport relay failed",
            Status::EnrollmentExpired => "enrollment token expired",
            Status::EnrollmentInvalid => "enrollment token invalid",
            Status::Internal => "internal error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Status {}

/// A failed asynchronous operation as delivered to a completion handler.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: Status,
    pub message: String,
}

impl Failure {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        let message = message.into();
        // Handlers rely on a non-empty message; fall back to the fixed string.
        let message = if message.is_empty() {
            status.message().to_string()
        } else {
            message
        };
        Self { status, message }
    }
}

impl From<Status> for Failure {
    fn from(status: Status) -> Self {
        Self {
            status,
            message: status.message().to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}
