use crate::events::{
    dispatcher,
    model::{DialEvent, EnrollEvent, LogEvent, LogLevel, ServiceEvent},
};
use crate::status::Status;

/// Emit a structured dial lifecycle event.
pub(crate) fn emit_dial_event(
    level: LogLevel,
    action: &str,
    service: &str,
    terminator: Option<&str>,
    status: Option<Status>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta("dial", level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Dial(DialEvent {
        meta,
        action: action.to_string(),
        service: service.to_string(),
        terminator: terminator.map(str::to_string),
        status: status.map(|s| s.code()),
        detail,
    }));
}

/// Emit a structured enrollment lifecycle event.
pub(crate) fn emit_enroll_event(
    level: LogLevel,
    action: &str,
    token_fingerprint: Option<String>,
    status: Option<Status>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta("enroll", level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Enroll(EnrollEvent {
        meta,
        action: action.to_string(),
        token_fingerprint,
        status: status.map(|s| s.code()),
        detail,
    }));
}

/// Emit a structured service catalog event.
pub(crate) fn emit_service_event(
    level: LogLevel,
    action: &str,
    service: Option<String>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta("service", level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Service(ServiceEvent {
        meta,
        action: action.to_string(),
        service,
        detail,
    }));
}
