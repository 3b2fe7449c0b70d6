use bytes::Bytes;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tether_session::{MediaFrameQueue, Orchestrator, Shutdown, StopReason};

use crate::integration::{chat_config, create_session, init_tracing};
use crate::utils::{MockTransport, TransportCall, WAIT_TIMEOUT_MS, wait_until};

#[test]
fn test_shutdown_unblocks_pending_send() {
    init_tracing();

    // Handshake completes but "#chat" never opens
    let transport = MockTransport::with_handshake("A");
    let session = create_session(
        chat_config().with_connection_timeout(Duration::from_millis(WAIT_TIMEOUT_MS)),
        &transport,
    );
    let shutdown = Shutdown::new();
    let orchestrator = Orchestrator::new(session.clone(), shutdown.clone());

    let outbox = Arc::new(MediaFrameQueue::new());
    assert!(outbox.push(Bytes::from_static(b"never delivered")));

    let run = {
        let outbox = Arc::clone(&outbox);
        thread::spawn(move || orchestrator.run_messaging("#chat", &outbox))
    };

    assert!(wait_until(WAIT_TIMEOUT_MS, || session.is_connected()));
    thread::sleep(Duration::from_millis(100));
    assert!(!run.is_finished(), "send must wait for the channel");

    let triggered_at = Instant::now();
    shutdown.trigger();

    assert!(
        wait_until(WAIT_TIMEOUT_MS, || run.is_finished()),
        "pending send was not released by shutdown"
    );
    assert!(triggered_at.elapsed() < Duration::from_secs(1));
    let outcome = run.join().expect("run panicked").expect("run failed");

    assert_eq!(outcome.stop, StopReason::Interrupted);
    assert_eq!(outcome.messages_sent, 0);
    assert!(transport.sent_on("#chat").is_empty());
    assert_eq!(transport.count(&TransportCall::Disconnect), 1);
    assert!(session.is_closed());
}

#[test]
fn test_shutdown_unblocks_connect() {
    init_tracing();

    let transport = MockTransport::silent();
    let session = create_session(
        chat_config().with_connection_timeout(Duration::from_millis(WAIT_TIMEOUT_MS)),
        &transport,
    );
    let shutdown = Shutdown::new();
    let orchestrator = Orchestrator::new(session.clone(), shutdown.clone());

    let run = thread::spawn(move || orchestrator.run_until_closed());

    assert!(wait_until(WAIT_TIMEOUT_MS, || {
        transport.count(&TransportCall::Connect) == 1
    }));
    thread::sleep(Duration::from_millis(50));

    let triggered_at = Instant::now();
    shutdown.trigger();

    assert!(
        wait_until(WAIT_TIMEOUT_MS, || run.is_finished()),
        "connect was not released by shutdown"
    );
    assert!(triggered_at.elapsed() < Duration::from_secs(1));
    let outcome = run.join().expect("run panicked").expect("run failed");

    assert_eq!(outcome.stop, StopReason::Interrupted);
    assert_eq!(transport.count(&TransportCall::Disconnect), 1);
    assert!(session.is_closed());
    assert!(!session.disconnect());
}
