mod common;

use async_graphql::http::{WebSocket, WebSocketProtocols, WsMessage};
use async_graphql::Request;
use futures_util::StreamExt;
use serde_json::{json, Value};
use social_api::db::UserRepository;
use social_api::models::Role;
use social_api::server::init_connection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;

use common::{data, TestApp};

const POST_CREATED: &str = "subscription { postCreated { post { text user { username } } } }";

/// Poll once so the resolver runs and registers with the broker
async fn start<S>(app: &TestApp, stream: &mut S, expected_subscribers: usize)
where
    S: futures_util::Stream + Unpin,
{
    let _ = timeout(Duration::from_millis(50), stream.next()).await;
    for _ in 0..50 {
        if app.broker.subscriber_count() == expected_subscribers {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscription never registered");
}

#[tokio::test]
async fn test_only_connected_subscribers_receive_post_created() {
    let app = TestApp::new();
    let alice = app.create_user("alice", Role::User).await;

    let mut early = app
        .schema
        .execute_stream(Request::new(POST_CREATED).data(app.context(None)));
    start(&app, &mut early, 1).await;

    data(
        app.execute(r#"mutation { createPost(text: "breaking news") { id } }"#, Some(&alice))
            .await,
    );

    let event = timeout(Duration::from_secs(1), early.next())
        .await
        .expect("event delivered")
        .expect("stream open");
    assert_eq!(
        data(event),
        json!({ "postCreated": { "post": { "text": "breaking news", "user": { "username": "alice" } } } })
    );

    // Exactly one event
    assert!(timeout(Duration::from_millis(100), early.next()).await.is_err());

    let mut late = app
        .schema
        .execute_stream(Request::new(POST_CREATED).data(app.context(None)));
    start(&app, &mut late, 2).await;
    assert!(timeout(Duration::from_millis(100), late.next()).await.is_err());
}

#[tokio::test]
async fn test_message_created_ignores_post_events() {
    let app = TestApp::new();
    let alice = app.create_user("alice", Role::User).await;

    let mut messages = app.schema.execute_stream(
        Request::new("subscription { messageCreated { message { text } } }").data(app.context(None)),
    );
    start(&app, &mut messages, 1).await;

    data(app.execute(r#"mutation { createPost(text: "a post") { id } }"#, Some(&alice)).await);
    data(app.execute(r#"mutation { createMessage(text: "a message") { id } }"#, Some(&alice)).await);

    let event = timeout(Duration::from_secs(1), messages.next())
        .await
        .expect("event delivered")
        .expect("stream open");
    assert_eq!(
        data(event),
        json!({ "messageCreated": { "message": { "text": "a message" } } })
    );
}

#[tokio::test]
async fn test_connection_events_see_current_user_data() {
    let app = TestApp::new();
    let alice = app.create_user("alice", Role::User).await;

    let session = init_connection(app.state.clone(), Value::Null).await.unwrap();
    let mut events = app
        .schema
        .execute_stream_with_session_data(Request::new(POST_CREATED), Arc::new(session));
    start(&app, &mut events, 1).await;

    data(app.execute(r#"mutation { createPost(text: "one") { id } }"#, Some(&alice)).await);
    let first = timeout(Duration::from_secs(1), events.next())
        .await
        .expect("event delivered")
        .expect("stream open");
    assert_eq!(data(first)["postCreated"]["post"]["user"]["username"], json!("alice"));

    app.repo.update_username(alice.id, "alice2").await.unwrap();
    data(app.execute(r#"mutation { createPost(text: "two") { id } }"#, Some(&alice)).await);
    let second = timeout(Duration::from_secs(1), events.next())
        .await
        .expect("event delivered")
        .expect("stream open");
    assert_eq!(data(second)["postCreated"]["post"]["user"]["username"], json!("alice2"));
}

async fn next_frame<S>(socket: &mut S) -> Value
where
    S: futures_util::Stream<Item = WsMessage> + Unpin,
{
    match timeout(Duration::from_secs(1), socket.next()).await {
        Ok(Some(WsMessage::Text(text))) => serde_json::from_str(&text).unwrap(),
        _ => panic!("expected a text frame"),
    }
}

#[tokio::test]
async fn test_websocket_connection_streams_post_created() {
    let app = TestApp::new();
    let alice = app.create_user("alice", Role::User).await;

    let (client, inbound) = mpsc::unbounded_channel::<String>();
    let state = app.state.clone();
    let mut socket = Box::pin(
        WebSocket::new(
            app.schema.clone(),
            UnboundedReceiverStream::new(inbound),
            WebSocketProtocols::GraphQLWS,
        )
        .on_connection_init(move |payload| init_connection(state, payload)),
    );

    client
        .send(json!({ "type": "connection_init", "payload": {} }).to_string())
        .unwrap();
    assert_eq!(next_frame(&mut socket).await, json!({ "type": "connection_ack" }));

    client
        .send(
            json!({ "type": "subscribe", "id": "1", "payload": { "query": POST_CREATED } })
                .to_string(),
        )
        .unwrap();
    start(&app, &mut socket, 1).await;

    data(app.execute(r#"mutation { createPost(text: "over the socket") { id } }"#, Some(&alice)).await);

    assert_eq!(
        next_frame(&mut socket).await,
        json!({
            "type": "next",
            "id": "1",
            "payload": { "data": { "postCreated": { "post": {
                "text": "over the socket",
                "user": { "username": "alice" }
            } } } }
        })
    );
}
