use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::Shutdown;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use overlink::config::Config;
use overlink::runtime::{LoopbackStack, Session};

/// N independent dials must yield N independent completions, each bound to
/// its own request: handlers for registered services see sockets, handlers
/// for unknown services see errors, and every socket carries its own bytes.
#[test]
fn concurrent_dials_complete_independently() {
    let stack = Arc::new(LoopbackStack::new().unwrap());
    for i in 0..4 {
        stack.register_echo_service(&format!("svc-{}", i));
    }
    let session = Session::init(stack, &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    for i in 0..4 {
        let tx = tx.clone();
        session
            .connect(&format!("svc-{}", i), None, move |result| {
                tx.send((i, true, result)).unwrap();
            })
            .unwrap();
    }
    for i in 0..4 {
        let tx = tx.clone();
        session
            .connect(&format!("missing-{}", i), None, move |result| {
                tx.send((i, false, result)).unwrap();
            })
            .unwrap();
    }
    drop(tx);

    let mut outcomes = Vec::new();
    for _ in 0..400 {
        session.process_next(Duration::from_millis(25));
        while let Ok(outcome) = rx.try_recv() {
            outcomes.push(outcome);
        }
        if outcomes.len() == 8 {
            break;
        }
    }
    assert_eq!(outcomes.len(), 8, "every dial must complete exactly once");

    let mut sockets = HashMap::new();
    let mut seen = HashMap::new();
    for (i, expect_ok, result) in outcomes {
        *seen.entry((i, expect_ok)).or_insert(0usize) += 1;
        if expect_ok {
            sockets.insert(i, result.expect("registered service should connect"));
        } else {
            result.expect_err("unknown service should fail");
        }
    }
    assert!(seen.values().all(|&count| count == 1), "no duplicate completions");

    // Each socket must carry its own request's bytes, not a sibling's.
    for (i, socket) in sockets.iter_mut() {
        let payload = format!("payload-{}", i);
        socket.write_all(payload.as_bytes()).unwrap();
        socket.shutdown(Shutdown::Write).unwrap();
        let mut echoed = String::new();
        socket.read_to_string(&mut echoed).unwrap();
        assert_eq!(echoed, payload);
    }
}
