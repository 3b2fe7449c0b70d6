use std::time::Duration;

use tether_session::Popped;

use crate::integration::{chat_config, connected_session, init_tracing};

#[test]
fn test_inbound_messages_are_queued() {
    init_tracing();

    let (session, transport) = connected_session(chat_config(), "A");
    let messages = session.messages();
    let events = transport.events();

    events.on_message("#chat", "first");
    events.on_message("#chat", &b"second"[..]);

    let texts: Vec<String> = (0..2)
        .filter_map(|_| messages.pop(Duration::from_millis(100)).into_frame())
        .map(|frame| frame.payload.text_lossy())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(matches!(messages.pop(Duration::from_millis(10)), Popped::Empty));

    session.disconnect();
    assert!(matches!(messages.pop(Duration::from_secs(1)), Popped::Closed));
}
