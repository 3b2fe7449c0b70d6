use tether_core::{SessionError, TransportError};

use crate::integration::{chat_config, create_session, init_tracing};
use crate::utils::{MockTransport, TransportCall};

#[test]
fn test_connect_fails_fast() {
    init_tracing();

    let transport = MockTransport::failing_connect();
    let session = create_session(chat_config(), &transport);

    let err = session.connect().expect_err("connect should fail");

    assert!(matches!(
        err,
        SessionError::Transport(TransportError::ConnectFailed { .. })
    ));
    assert!(session.is_closed());

    // Nothing was opened, nothing to tear down
    assert!(!session.disconnect());
    assert_eq!(transport.count(&TransportCall::Disconnect), 0);

    // A failed session cannot be reconnected
    let err = session.connect().expect_err("second connect");
    assert!(matches!(err, SessionError::InvalidState { operation: "connect", .. }));
}
