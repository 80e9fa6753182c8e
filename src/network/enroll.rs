// src/network/enroll.rs

//! Enrollment requests: exchange a one-time token for an identity
//! configuration document.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::bridge::{Completion, CompletionBridge, EnrollOutcome};
use crate::events::model::LogLevel;
use crate::network::events::emit_enroll_event;
use crate::runtime::stack::OverlayStack;
use crate::status::{Failure, Status};

/// SHA-256 fingerprint of an enrollment token, for event correlation. The
/// token itself never reaches the logs.
pub(crate) fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    base16ct::lower::encode_string(&digest)
}

/// Issue an enrollment. Validation and initiation failures surface
/// synchronously; once the backend accepts the request, exactly one
/// completion reaches `on_complete`, carrying either the canonical JSON form
/// of the identity document or the failure. Document and error are mutually
/// exclusive by construction of the payload.
pub(crate) fn enroll<F>(
    stack: &Arc<dyn OverlayStack>,
    bridge: &CompletionBridge,
    token: &str,
    on_complete: F,
) -> Result<(), Status>
where
    F: FnOnce(Result<String, Failure>) + Send + 'static,
{
    if token.trim().is_empty() {
        return Err(Status::InvalidArgument);
    }

    let handle = bridge.register(Box::new(move |completion| {
        if let Completion::Enroll(outcome) = completion {
            on_complete(outcome.into_result());
        }
    }));

    let fingerprint = token_fingerprint(token);
    emit_enroll_event(
        LogLevel::Info,
        "enroll_start",
        Some(fingerprint.clone()),
        None,
        None,
    );

    let bridge_for_completion = bridge.clone();
    let initiated = stack.enroll(
        token,
        Box::new(move |result| {
            let outcome = match result {
                Ok(config) => match config.to_canonical_json() {
                    Ok(json) => {
                        emit_enroll_event(
                            LogLevel::Info,
                            "enroll_done",
                            Some(fingerprint),
                            Some(Status::Ok),
                            None,
                        );
                        EnrollOutcome::success(json)
                    }
                    Err(err) => {
                        emit_enroll_event(
                            LogLevel::Error,
                            "enroll_serialize_failed",
                            Some(fingerprint),
                            Some(Status::Internal),
                            Some(err.to_string()),
                        );
                        EnrollOutcome::failure(Status::Internal, "")
                    }
                },
                Err(failure) => {
                    emit_enroll_event(
                        LogLevel::Error,
                        "enroll_failed",
                        Some(fingerprint),
                        Some(failure.status),
                        Some(failure.message.clone()),
                    );
                    EnrollOutcome::failure(failure.status, failure.message)
                }
            };
            bridge_for_completion.fire(handle, Completion::Enroll(outcome));
        }),
    );

    if let Err(status) = initiated {
        bridge.release(handle);
        emit_enroll_event(
            LogLevel::Error,
            "enroll_initiate_failed",
            Some(token_fingerprint(token)),
            Some(status),
            None,
        );
        return Err(status);
    }
    Ok(())
}
