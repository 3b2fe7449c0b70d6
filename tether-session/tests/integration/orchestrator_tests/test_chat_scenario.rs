use std::time::Duration;

use tether_core::{ConnectionState, SignalingEvent};

use crate::integration::{chat_config, create_session, init_tracing};
use crate::utils::{MockTransport, TransportCall, WAIT_TIMEOUT_MS, created_json, offer_json, wait_until};

#[test]
fn test_chat_scenario() {
    init_tracing();

    let transport = MockTransport::silent();
    let session = create_session(
        chat_config().with_connection_timeout(Duration::from_millis(WAIT_TIMEOUT_MS)),
        &transport,
    );
    let events = transport.events();

    let connecting = {
        let session = session.clone();
        std::thread::spawn(move || session.connect())
    };
    assert!(wait_until(WAIT_TIMEOUT_MS, || session.state() == ConnectionState::Connecting));

    events.on_set_offer(&offer_json("A"));
    events.on_notify(&created_json("A"));

    connecting
        .join()
        .expect("connect thread panicked")
        .expect("connect should succeed");
    assert!(session.is_connected());

    events.dispatch(SignalingEvent::DataChannelOpened {
        label: "#chat".into(),
    });
    assert!(session.is_sendable("#chat"));

    session.send("#chat", b"hi").expect("send should not block");
    assert_eq!(transport.sent_on("#chat"), vec![b"hi".to_vec()]);

    events.dispatch(SignalingEvent::DisconnectNotice {
        error_code: 1,
        message: "bye".into(),
    });
    assert!(session.is_closed());

    assert!(!session.disconnect());
    assert!(!session.disconnect());
    assert_eq!(transport.count(&TransportCall::Disconnect), 0);
}
