use tether_core::ConnectionState;

use crate::integration::{chat_config, connected_session, init_tracing};
use crate::utils::TransportCall;

#[test]
fn test_connects_on_own_notification() {
    init_tracing();

    // Handshake also announces an unrelated peer before ours
    let (session, transport) = connected_session(chat_config(), "A");

    assert!(session.is_connected());
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(session.connection_id().map(|id| id.0), Some("A".to_owned()));
    assert_eq!(transport.calls(), vec![TransportCall::Connect]);

    // Late notifications for the same id change nothing
    transport
        .events()
        .on_notify(&crate::utils::created_json("A"));
    assert!(session.is_connected());

    assert!(session.disconnect());
    assert_eq!(transport.count(&TransportCall::Disconnect), 1);
}
