use serde_json::json;

use super::*;
use crate::channel::{JoinState, PushStatus};
use crate::protocol::{events, phx};
use crate::testing::{accept_join, connected, expect_join, notifier, Recorder};
use crate::RealtimeError;

#[tokio::test]
async fn chat_messages_reach_hooks_and_extra_observers_in_order() {
    let (session, _connector, mut peer) = connected().await;
    let from_hooks = Recorder::default();
    let chat = session
        .join_chat("42", ChatHooks::new().on_message(from_hooks.handler()))
        .unwrap();
    let (done, mut delivered) = notifier();
    chat.on_message(done);

    accept_join(&mut peer, "room:42").await;
    chat.channel().joined().await.unwrap();

    peer.push_event("room:42", events::NEW_MESSAGE, json!({"content": "hi"}));
    assert_eq!(delivered.recv().await.unwrap(), json!({"content": "hi"}));
    assert_eq!(from_hooks.values(), vec![json!({"content": "hi"})]);
}

#[tokio::test]
async fn send_message_pushes_new_message() {
    let (session, _connector, mut peer) = connected().await;
    let chat = session.join_chat("42", ChatHooks::new()).unwrap();
    accept_join(&mut peer, "room:42").await;
    chat.channel().joined().await.unwrap();

    assert_eq!(chat.send_message("hello"), PushStatus::Queued);
    let frame = peer.next_frame().await.unwrap();
    assert_eq!(frame.event, events::NEW_MESSAGE);
    assert_eq!(frame.payload, json!({"content": "hello"}));
}

#[tokio::test]
async fn chat_failure_does_not_affect_signaling() {
    let (session, _connector, mut peer) = connected().await;
    let chat = session.join_chat("42", ChatHooks::new()).unwrap();
    let (offered, mut offers) = notifier();
    let signal = session
        .join_signal("42", SignalHooks::new().on_offer(offered))
        .unwrap();

    let chat_join = expect_join(&mut peer, "room:42").await;
    peer.reply_error(&chat_join, "room closed");
    accept_join(&mut peer, "signal:42").await;

    assert!(chat.channel().joined().await.is_err());
    signal.channel().unwrap().joined().await.unwrap();
    assert_eq!(chat.channel().state(), JoinState::Errored);

    peer.push_event("signal:42", events::OFFER, json!({"sdp": "o"}));
    assert_eq!(offers.recv().await.unwrap(), json!({"sdp": "o"}));
    assert_eq!(signal.start_call(), PushStatus::Queued);
}

#[tokio::test]
async fn one_chat_per_room_at_a_time() {
    let (session, _connector, mut peer) = connected().await;
    let first = session.join_chat("42", ChatHooks::new()).unwrap();
    assert_eq!(
        session.join_chat("42", ChatHooks::new()).err(),
        Some(RealtimeError::ChannelInUse {
            kind: "chat".into(),
            room_id: "42".into()
        })
    );
    accept_join(&mut peer, "room:42").await;
    first.channel().joined().await.unwrap();

    // Different rooms get different channels.
    let other = session.join_chat("43", ChatHooks::new()).unwrap();
    assert!(!other.channel().ptr_eq(first.channel()));
    expect_join(&mut peer, "room:43").await;

    first.leave();
    assert_eq!(peer.next_frame().await.unwrap().event, phx::LEAVE);
    let again = session.join_chat("42", ChatHooks::new()).unwrap();
    assert!(!again.channel().ptr_eq(first.channel()));
    expect_join(&mut peer, "room:42").await;
}

#[tokio::test]
async fn chat_and_typing_share_one_join() {
    let (session, _connector, mut peer) = connected().await;
    let chat = session.join_chat("42", ChatHooks::new()).unwrap();
    let typing = session.join_typing("42").unwrap();
    assert!(chat.channel().ptr_eq(typing.channel()));

    accept_join(&mut peer, "room:42").await;
    typing.channel().joined().await.unwrap();
    assert!(peer.try_next_frame().is_none());

    chat.leave();
    assert_eq!(typing.channel().state(), JoinState::Joined);
    assert!(peer.try_next_frame().is_none());

    typing.teardown();
    let leave = peer.next_frame().await.unwrap();
    assert_eq!(leave.event, phx::LEAVE);
    assert_eq!(leave.topic, "room:42");
    assert!(session.registry().is_empty());
}

#[tokio::test]
async fn release_of_unknown_channel_is_a_no_op() {
    let (session, _connector, mut peer) = connected().await;
    session.release(ChannelKind::Signal, "nowhere");

    let chat = session.join_chat("1", ChatHooks::new()).unwrap();
    expect_join(&mut peer, "room:1").await;
    session.release(ChannelKind::Chat, "1");
    assert_eq!(chat.channel().state(), JoinState::Left);
    assert_eq!(peer.next_frame().await.unwrap().event, phx::LEAVE);
}

#[tokio::test]
async fn custom_topic_prefixes_are_used() {
    let config = RealtimeConfig {
        topics: crate::channel::TopicNames {
            chat: "chat".into(),
            typing: "typing".into(),
            signal: "call".into(),
        },
        ..Default::default()
    };
    let (session, connector) = crate::testing::session_with(config);
    let mut peer = connector.add_peer();
    session.connect("t");

    let _chat = session.join_chat("9", ChatHooks::new()).unwrap();
    let _typing = session.join_typing("9").unwrap();
    let _signal = session.join_signal("9", SignalHooks::new()).unwrap();

    expect_join(&mut peer, "chat:9").await;
    expect_join(&mut peer, "typing:9").await;
    expect_join(&mut peer, "call:9").await;
}
