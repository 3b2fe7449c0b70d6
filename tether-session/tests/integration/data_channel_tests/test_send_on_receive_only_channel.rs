use tether_core::{DataChannelSpec, Direction, SessionConfig, SessionError};

use crate::integration::{connected_session, init_tracing, signaling_urls};

#[test]
fn test_send_on_receive_only_channel() {
    init_tracing();

    let config = SessionConfig::messaging(
        signaling_urls(),
        "sora",
        vec![
            DataChannelSpec::new("#in", Direction::Recvonly),
            DataChannelSpec::new("#out", Direction::Sendonly),
        ],
    );
    let (session, transport) = connected_session(config, "A");
    let events = transport.events();
    events.on_data_channel("#in");
    events.on_data_channel("#out");
    events.on_data_channel("#unknown");

    assert!(!session.is_sendable("#in"));
    assert!(session.is_sendable("#out"));
    assert_eq!(session.sendable_labels(), vec!["#out".to_owned()]);

    let err = session.send("#in", "x").expect_err("recvonly channel");
    assert!(matches!(err, SessionError::ChannelNotSendable { .. }));
    let err = session.send("#unknown", "x").expect_err("unconfigured channel");
    assert!(matches!(err, SessionError::ChannelNotSendable { .. }));

    session.send("#out", "ok").expect("sendonly channel");
    assert_eq!(transport.sent_on("#out"), vec![b"ok".to_vec()]);
}
