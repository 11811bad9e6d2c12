//! Cursor management and delivery behavior of the chat sync poller against
//! a real (loopback) feed endpoint.

mod common;

use chatplug_core::{ChatSyncPoller, FeedClient};
use common::CannedFeedServer;

fn poller(server: &CannedFeedServer) -> ChatSyncPoller {
    ChatSyncPoller::new(FeedClient::new(&server.base_url()).expect("feed client"))
}

#[test]
fn poll_advances_cursor_and_delivers_in_feed_order() {
    let server = CannedFeedServer::start(vec![(
        200,
        r#"{"messages":[{"nickname":"a","message":"hi","createdAt":100}]}"#.to_string(),
    )]);
    let mut poller = poller(&server);

    let delivered = poller.poll();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].nickname, "a");
    assert_eq!(delivered[0].message, "hi");
    assert_eq!(delivered[0].created_at, 100);
    assert_eq!(poller.cursor(), 100);

    let bodies = server.finish();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&bodies[0]).unwrap(),
        serde_json::json!({"fromTimestamp": 0})
    );
}

#[test]
fn cursor_tracks_the_newest_timestamp_across_reads() {
    let server = CannedFeedServer::start(vec![
        (
            200,
            r#"{"messages":[
                {"nickname":"a","message":"one","createdAt":100},
                {"nickname":"b","message":"two","createdAt":150}
            ]}"#
            .to_string(),
        ),
        (
            200,
            r#"{"messages":[{"nickname":"c","message":"three","createdAt":200}]}"#.to_string(),
        ),
    ]);
    let mut poller = poller(&server);

    assert_eq!(poller.poll().len(), 2);
    assert_eq!(poller.cursor(), 150);

    assert_eq!(poller.poll().len(), 1);
    assert_eq!(poller.cursor(), 200);

    let bodies = server.finish();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&bodies[1]).unwrap(),
        serde_json::json!({"fromTimestamp": 150})
    );
}

#[test]
fn boundary_timestamp_repeats_are_delivered_again() {
    // The poller tracks a timestamp cursor, not message identity: a feed
    // that returns the boundary message twice gets it forwarded twice.
    let body = r#"{"messages":[{"nickname":"a","message":"hi","createdAt":100}]}"#.to_string();
    let server = CannedFeedServer::start(vec![(200, body.clone()), (200, body)]);
    let mut poller = poller(&server);

    assert_eq!(poller.poll().len(), 1);
    assert_eq!(poller.cursor(), 100);

    assert_eq!(poller.poll().len(), 1);
    assert_eq!(poller.cursor(), 100);

    server.finish();
}

#[test]
fn empty_and_absent_message_arrays_leave_the_cursor_alone() {
    let server = CannedFeedServer::start(vec![
        (200, r#"{"messages":[]}"#.to_string()),
        (200, r#"{}"#.to_string()),
    ]);
    let mut poller = poller(&server);

    assert!(poller.poll().is_empty());
    assert!(poller.poll().is_empty());
    assert_eq!(poller.cursor(), 0);

    server.finish();
}

#[test]
fn malformed_responses_read_as_no_new_messages() {
    let server = CannedFeedServer::start(vec![
        (200, "this is not json".to_string()),
        (
            200,
            r#"{"messages":[{"nickname":"a","message":"hi","createdAt":7}]}"#.to_string(),
        ),
    ]);
    let mut poller = poller(&server);

    assert!(poller.poll().is_empty());
    assert_eq!(poller.cursor(), 0);

    // The next tick retries from the unchanged cursor.
    assert_eq!(poller.poll().len(), 1);
    assert_eq!(poller.cursor(), 7);

    let bodies = server.finish();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&bodies[1]).unwrap(),
        serde_json::json!({"fromTimestamp": 0})
    );
}

#[test]
fn server_errors_read_as_no_new_messages() {
    let server = CannedFeedServer::start(vec![(500, r#"{"error":"down"}"#.to_string())]);
    let mut poller = poller(&server);

    assert!(poller.poll().is_empty());
    assert_eq!(poller.cursor(), 0);

    server.finish();
}

#[test]
fn unreachable_endpoints_read_as_no_new_messages() {
    // Port 9 is discard; nothing listens there in the test environment.
    let mut poller = ChatSyncPoller::new(FeedClient::new("http://127.0.0.1:9").unwrap());
    assert!(poller.poll().is_empty());
    assert_eq!(poller.cursor(), 0);
}

#[test]
fn send_issues_exactly_one_write_with_the_feed_shape() {
    let server = CannedFeedServer::start(vec![(200, "{}".to_string())]);
    let mut poller = poller(&server);

    assert!(poller.send("bob", "hi").is_empty());
    assert_eq!(poller.cursor(), 0);

    let bodies = server.finish();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&bodies[0]).unwrap(),
        serde_json::json!({"nickname": "bob", "message": "hi"})
    );
}

#[test]
fn send_responses_advance_sync_state_like_a_poll() {
    let server = CannedFeedServer::start(vec![(
        200,
        r#"{"messages":[{"nickname":"bob","message":"hi","createdAt":42}]}"#.to_string(),
    )]);
    let mut poller = poller(&server);

    let delivered = poller.send("bob", "hi");
    assert_eq!(delivered.len(), 1);
    assert_eq!(poller.cursor(), 42);

    server.finish();
}
