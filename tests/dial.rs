use std::io::{Read, Write};
use std::net::Shutdown;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use overlink::config::Config;
use overlink::runtime::{LoopbackStack, Session};
use overlink::status::Status;

fn session_with(stack: Arc<LoopbackStack>) -> Session {
    Session::init(stack, &Config::default()).expect("session init")
}

fn pump_until<T>(session: &Session, rx: &mpsc::Receiver<T>) -> T {
    for _ in 0..200 {
        session.process_next(Duration::from_millis(25));
        if let Ok(value) = rx.try_recv() {
            return value;
        }
    }
    panic!("completion did not arrive");
}

#[test]
fn dial_echo_service_roundtrips_bytes() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_echo_service("echo");
    let session = session_with(stack);

    let (tx, rx) = mpsc::channel();
    session
        .connect("echo", None, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let mut socket = pump_until(&session, &rx).expect("dial should succeed");
    socket.write_all(b"ping-123").unwrap();
    socket.shutdown(Shutdown::Write).unwrap();
    let mut echoed = Vec::new();
    socket.read_to_end(&mut echoed).unwrap();
    assert_eq!(echoed, b"ping-123");
}

#[test]
fn dial_unknown_service_reports_native_error_string() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    let session = session_with(stack);

    let (tx, rx) = mpsc::channel();
    session
        .connect("nonexistent-service", None, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let failure = pump_until(&session, &rx).expect_err("dial should fail");
    assert_eq!(failure.status, Status::ServiceUnavailable);
    assert_eq!(failure.message, "service not available");
}

#[test]
fn dial_empty_service_fails_synchronously() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    let session = session_with(stack);

    let err = session
        .connect("", None, |_| panic!("no completion owed"))
        .unwrap_err();
    assert_eq!(err, Status::InvalidArgument);
    // Nothing was registered or queued.
    assert_eq!(session.drain_pending(), 0);
}

#[test]
fn dial_completion_fires_exactly_once() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_echo_service("echo");
    let session = session_with(stack);

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_handler = fired.clone();
    let (tx, rx) = mpsc::channel();
    session
        .connect("echo", None, move |result| {
            fired_in_handler.fetch_add(1, Ordering::SeqCst);
            tx.send(result).unwrap();
        })
        .unwrap();

    let _socket = pump_until(&session, &rx).expect("dial should succeed");
    // Keep pumping well past delivery; the handler must not run again.
    for _ in 0..10 {
        session.process_next(Duration::from_millis(10));
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn dial_with_terminator_reaches_the_service() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_echo_service("billing");
    let session = session_with(stack);

    let (tx, rx) = mpsc::channel();
    session
        .connect("billing", Some("instance-b"), move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    assert!(pump_until(&session, &rx).is_ok());
}
