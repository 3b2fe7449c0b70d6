use std::thread;
use std::time::{Duration, Instant};

use tether_core::SessionError;

use crate::integration::{chat_config, connected_session, init_tracing};
use crate::utils::STILL_BLOCKED_MS;

#[test]
fn test_send_fails_when_session_closes() {
    init_tracing();

    let (session, transport) = connected_session(chat_config(), "A");

    let sender = {
        let session = session.clone();
        thread::spawn(move || session.send("#chat", "never"))
    };

    thread::sleep(Duration::from_millis(STILL_BLOCKED_MS));
    let closed_at = Instant::now();
    transport.events().on_disconnect(1, "bye");

    let err = sender
        .join()
        .expect("sender panicked")
        .expect_err("send must not succeed after close");
    assert!(matches!(err, SessionError::ChannelNeverReady { ref label } if label == "#chat"));
    assert!(closed_at.elapsed() < Duration::from_secs(1));
    assert!(transport.sent_on("#chat").is_empty());

    // Opening after close does not resurrect the channel
    transport.events().on_data_channel("#chat");
    assert!(!session.is_sendable("#chat"));
}
