use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use overlink::bridge::{completion_bridge, Completion, DialOutcome};
use overlink::config::Config;
use overlink::runtime::{LoopbackStack, Session};
use overlink::status::Status;

#[test]
fn init_with_missing_identity_fails_synchronously() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    let config = Config {
        identity: Some("data/test-session-missing/identity.json".to_string()),
        ..Config::default()
    };
    let err = match Session::init(stack, &config) {
        Ok(_) => panic!("init should fail"),
        Err(err) => err,
    };
    assert_eq!(err, Status::ConfigNotFound);
    assert_eq!(err.message(), "configuration not found");
}

#[test]
fn init_with_existing_identity_succeeds() {
    let base = "data/test-session";
    fs::create_dir_all(base).unwrap();
    let path = format!("{}/identity.json", base);
    fs::write(&path, "{}").unwrap();

    let stack = Arc::new(LoopbackStack::new().unwrap());
    let config = Config {
        identity: Some(path.clone()),
        ..Config::default()
    };
    assert!(Session::init(stack, &config).is_ok());

    // Cleanup
    let _ = fs::remove_file(&path);
    let _ = fs::remove_dir_all(base);
}

#[test]
fn shutdown_drops_inflight_completions_without_leaking() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    stack.register_echo_service("echo");
    let session = Session::init(stack.clone(), &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    session
        .connect("echo", None, move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    // Tear down before pumping: the completion settles on the backend
    // thread, finds the mailbox gone, and must clean up silently.
    session.shutdown();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());

    // The dropped success payload closes the consumer socket, which winds
    // the backend pump (and its connection accounting) down.
    for _ in 0..100 {
        if stack.live_connections() == 0 {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("connection leaked across shutdown");
}

#[test]
fn released_handle_never_delivers() {
    let (bridge, mailbox) = completion_bridge(4);
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_handler = fired.clone();

    let handle = bridge.register(Box::new(move |_| {
        fired_in_handler.fetch_add(1, Ordering::SeqCst);
    }));
    bridge.release(handle);
    bridge.fire(
        handle,
        Completion::Dial(DialOutcome::failure(Status::ServiceUnavailable)),
    );

    mailbox.drain_pending();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.pending_handlers(), 0);
}

#[test]
fn duplicate_firing_delivers_once() {
    let (bridge, mailbox) = completion_bridge(4);
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_handler = fired.clone();

    let handle = bridge.register(Box::new(move |_| {
        fired_in_handler.fetch_add(1, Ordering::SeqCst);
    }));
    // A misbehaving backend firing twice must still deliver at most once.
    bridge.fire(
        handle,
        Completion::Dial(DialOutcome::failure(Status::ServiceUnavailable)),
    );
    bridge.fire(
        handle,
        Completion::Dial(DialOutcome::failure(Status::ServiceUnavailable)),
    );

    assert_eq!(mailbox.drain_pending(), 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.pending_handlers(), 0);
}

#[test]
fn firing_into_a_dropped_mailbox_is_a_silent_no_op() {
    let (bridge, mailbox) = completion_bridge(4);
    let handle = bridge.register(Box::new(|_| panic!("must not run")));
    drop(mailbox);
    bridge.fire(
        handle,
        Completion::Dial(DialOutcome::failure(Status::ServiceUnavailable)),
    );
    assert_eq!(bridge.pending_handlers(), 0);
}
