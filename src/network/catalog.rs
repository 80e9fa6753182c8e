// src/network/catalog.rs

//! Service catalog access: synchronous lookups against the backend's service
//! table and the fire-and-forget refresh trigger.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::model::LogLevel;
use crate::network::events::emit_service_event;
use crate::runtime::stack::OverlayStack;
use crate::status::Status;

/// Intercepted-address protocols the catalog indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        })
    }
}

impl FromStr for Protocol {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(Status::InvalidArgument),
        }
    }
}

/// Host-facing wrapper over the backend's service table.
pub struct ServiceCatalog {
    stack: Arc<dyn OverlayStack>,
}

impl ServiceCatalog {
    pub(crate) fn new(stack: Arc<dyn OverlayStack>) -> Self {
        Self { stack }
    }

    /// Name of the service intercepting `protocol://host:port`, if any.
    /// Absence is a normal outcome, never an error. Safe to call from the
    /// host thread; the lookup is a synchronous table read.
    pub fn service_for_address(&self, protocol: Protocol, host: &str, port: u16) -> Option<String> {
        let found = self.stack.service_for_address(protocol, host, port);
        emit_service_event(
            LogLevel::Debug,
            "service_lookup",
            found.clone(),
            Some(format!("{}://{}:{}", protocol, host, port)),
        );
        found
    }

    /// Trigger a forced service-table refresh. The effect is asynchronous
    /// and the reported status is always `Ok`, regardless of outcome.
    pub fn refresh_services(&self) -> Status {
        self.stack.refresh_services(true);
        emit_service_event(LogLevel::Info, "services_refresh", None, None);
        Status::Ok
    }
}
