use std::thread;
use std::time::Duration;

use tether_core::{ConnectionState, DisconnectReason, SessionError};

use crate::integration::{chat_config, create_session, init_tracing};
use crate::utils::{MockTransport, TransportCall, WAIT_TIMEOUT_MS, offer_json, wait_until};

#[test]
fn test_disconnect_notice_during_connect() {
    init_tracing();

    let transport = MockTransport::silent();
    let session = create_session(
        chat_config().with_connection_timeout(Duration::from_millis(WAIT_TIMEOUT_MS)),
        &transport,
    );

    let connecting = {
        let session = session.clone();
        thread::spawn(move || session.connect())
    };

    assert!(wait_until(WAIT_TIMEOUT_MS, || session.state() == ConnectionState::Connecting));
    let events = transport.events();
    events.on_set_offer(&offer_json("A"));
    events.on_disconnect(3, "rejected");

    let err = connecting
        .join()
        .expect("connect thread panicked")
        .expect_err("connect should fail");
    assert!(matches!(
        err,
        SessionError::TransportDisconnect { error_code: 3, ref message } if message == "rejected"
    ));
    assert_eq!(
        session.disconnect_reason(),
        Some(DisconnectReason {
            error_code: 3,
            message: "rejected".into()
        })
    );

    // Transport already closed itself
    assert!(!session.disconnect());
    assert_eq!(transport.count(&TransportCall::Disconnect), 0);
}
