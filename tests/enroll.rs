use std::fs;
use std::sync::{mpsc, Arc};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use overlink::config::Config;
use overlink::identity::IdentityConfig;
use overlink::runtime::{LoopbackStack, Session};
use overlink::status::Status;

fn pump_until<T>(session: &Session, rx: &mpsc::Receiver<T>) -> T {
    for _ in 0..200 {
        session.process_next(Duration::from_millis(25));
        if let Ok(value) = rx.try_recv() {
            return value;
        }
    }
    panic!("completion did not arrive");
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn make_token(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "exp": exp,
            "sub": "tester",
            "iss": "https://ctrl.test:1280",
        })
        .to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

fn session() -> Session {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    Session::init(stack, &Config::default()).unwrap()
}

#[test]
fn enroll_valid_token_yields_identity_document() {
    let session = session();
    let (tx, rx) = mpsc::channel();
    session
        .enroll(&make_token(now_unix() + 3600), move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let json = pump_until(&session, &rx).expect("enrollment should succeed");
    assert!(!json.is_empty());

    let doc = IdentityConfig::from_json(&json).expect("canonical document should parse");
    assert_eq!(doc.controller, "https://ctrl.test:1280");
    assert!(doc.id.cert.contains("BEGIN CERTIFICATE"));
    assert!(doc.id.key.contains("PRIVATE KEY"));
    assert!(doc.id.ca.contains("BEGIN CERTIFICATE"));
}

#[test]
fn enroll_expired_token_reports_error_without_config() {
    let session = session();
    let (tx, rx) = mpsc::channel();
    session
        .enroll(&make_token(1), move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let failure = pump_until(&session, &rx).expect_err("expired token should fail");
    assert_eq!(failure.status, Status::EnrollmentExpired);
    assert_eq!(failure.message, "enrollment token expired");
}

#[test]
fn enroll_accepts_a_token_file_path() {
    let base = "data/test-enroll";
    fs::create_dir_all(base).unwrap();
    let path = format!("{}/token.jwt", base);
    fs::write(&path, make_token(now_unix() + 3600)).unwrap();

    let session = session();
    let (tx, rx) = mpsc::channel();
    session
        .enroll(&path, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    assert!(pump_until(&session, &rx).is_ok());

    // Cleanup
    let _ = fs::remove_file(&path);
    let _ = fs::remove_dir_all(base);
}

#[test]
fn enroll_malformed_token_is_invalid() {
    let session = session();
    let (tx, rx) = mpsc::channel();
    session
        .enroll("not-a-jwt", move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let failure = pump_until(&session, &rx).expect_err("malformed token should fail");
    assert_eq!(failure.status, Status::EnrollmentInvalid);
    assert_eq!(failure.message, "enrollment token invalid");
}

#[test]
fn enroll_empty_token_fails_synchronously() {
    let session = session();
    let err = session
        .enroll("", |_| panic!("no completion owed"))
        .unwrap_err();
    assert_eq!(err, Status::InvalidArgument);
    assert_eq!(session.drain_pending(), 0);
}
