use std::sync::{mpsc, Arc};
use std::time::Duration;

use overlink::config::Config;
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

/// Wait for the backend to settle its connection accounting.
fn wait_for_live(stack: &LoopbackStack, expected: usize) {
    for _ in 0..100 {
        if stack.live_connections() == expected {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!(
        "live connections stuck at {} (expected {})",
        stack.live_connections(),
        expected
    );
}

#[test]
fn failed_dial_closes_the_connection() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    let session = Session::init(stack.clone(), &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    session
        .connect("missing", None, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    pump_until(&session, &rx).expect_err("dial should fail");
    wait_for_live(&stack, 0);
}

#[test]
fn attach_fault_closes_connection_and_reports_error() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_attach_fault("flaky");
    let session = Session::init(stack.clone(), &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    session
        .connect("flaky", None, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    // The dial itself succeeds; the failure happens while bridging the
    // transport. It must still surface as a completion error, with the
    // connection closed rather than left dangling.
    let failure = pump_until(&session, &rx).expect_err("attach fault should fail the dial");
    assert_eq!(failure.status, Status::TransportFailed);
    assert_eq!(failure.message, "transport relay failed");
    wait_for_live(&stack, 0);
}

#[test]
fn connected_stream_winds_down_when_the_host_drops_it() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_echo_service("echo");
    let session = Session::init(stack.clone(), &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    session
        .connect("echo", None, move |result| {
            tx.send(result).unwrap();
        })
        .unwrap();

    let socket = pump_until(&session, &rx).expect("dial should succeed");
    assert_eq!(stack.live_connections(), 1);

    drop(socket);
    wait_for_live(&stack, 0);
}
