mod test_inbound_messages_are_queued;
mod test_send_fails_when_session_closes;
mod test_send_on_receive_only_channel;
