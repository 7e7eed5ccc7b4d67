use std::time::Duration;

use serde_json::json;
use tokio::time::{sleep, Instant};

use super::*;
use crate::chat::ChatHooks;
use crate::events::Event;
use crate::protocol::phx;
use crate::testing::{accept_join, connected, notifier};

async fn joined_indicator() -> (
    crate::session::RealtimeSession,
    crate::connection::MemoryPeer,
    TypingIndicator,
) {
    let (session, _connector, mut peer) = connected().await;
    let typing = session.join_typing("42").unwrap();
    accept_join(&mut peer, "room:42").await;
    typing.channel().joined().await.unwrap();
    (session, peer, typing)
}

#[tokio::test(start_paused = true)]
async fn burst_sends_one_start_and_one_stop_after_idle() {
    let (_session, mut peer, typing) = joined_indicator().await;
    let started = Instant::now();

    typing.input();
    sleep(Duration::from_millis(1000)).await;
    typing.input();
    sleep(Duration::from_millis(1000)).await;
    typing.input();
    assert!(typing.is_typing());

    let start = peer.next_frame().await.unwrap();
    assert_eq!(start.event, events::TYPING_START);
    assert_eq!(start.topic, "room:42");

    let stop = peer.next_frame().await.unwrap();
    assert_eq!(stop.event, events::TYPING_STOP);
    assert_eq!(started.elapsed(), Duration::from_millis(5000));
    assert!(!typing.is_typing());
    assert!(peer.try_next_frame().is_none());
}

#[tokio::test(start_paused = true)]
async fn blur_stops_immediately() {
    let (_session, mut peer, typing) = joined_indicator().await;

    typing.input();
    typing.blur();
    assert!(!typing.is_typing());

    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_STOP);

    // The cancelled idle timer never produces a second stop.
    sleep(Duration::from_secs(5)).await;
    assert!(peer.try_next_frame().is_none());

    // Blur while idle is a no-op; a new burst starts over.
    typing.blur();
    typing.input();
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_then_leaves() {
    let (_session, mut peer, typing) = joined_indicator().await;

    typing.input();
    typing.teardown();
    typing.teardown();

    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_STOP);
    assert_eq!(peer.next_frame().await.unwrap().event, phx::LEAVE);

    typing.input();
    assert!(!typing.is_typing());
    sleep(Duration::from_secs(10)).await;
    assert!(peer.try_next_frame().is_none());
}

#[tokio::test]
async fn teardown_while_idle_only_leaves() {
    let (_session, mut peer, typing) = joined_indicator().await;

    typing.teardown();
    assert_eq!(peer.next_frame().await.unwrap().event, phx::LEAVE);
}

#[tokio::test]
async fn dropping_the_indicator_tears_it_down() {
    let (_session, mut peer, typing) = joined_indicator().await;

    typing.input();
    drop(typing);

    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_STOP);
    assert_eq!(peer.next_frame().await.unwrap().event, phx::LEAVE);
}

#[tokio::test(start_paused = true)]
async fn input_before_join_is_not_sent() {
    let (session, _connector, mut peer) = connected().await;
    let typing = session.join_typing("42").unwrap();
    let connection = session.connection().unwrap();

    typing.input();
    assert_eq!(connection.stats().pushes_skipped(), 1);
    assert!(!typing.is_typing());

    let join = peer.next_frame().await.unwrap();
    assert_eq!(join.event, phx::JOIN);
    peer.reply_ok(&join);
    typing.channel().joined().await.unwrap();

    // No idle timer was armed, so no lone stop follows the join.
    sleep(Duration::from_millis(3100)).await;
    assert!(peer.try_next_frame().is_none());
    assert!(!typing.is_typing());

    typing.input();
    assert!(typing.is_typing());
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
}

#[tokio::test]
async fn second_indicator_for_a_room_is_refused() {
    let (session, _peer, typing) = joined_indicator().await;

    assert_eq!(
        session.join_typing("42").err(),
        Some(RealtimeError::ChannelInUse {
            kind: "typing".into(),
            room_id: "42".into()
        })
    );

    drop(typing);
    let replacement = session.join_typing("42").unwrap();
    assert_eq!(replacement.room_id(), "42");
}

#[tokio::test]
async fn teardown_keeps_the_room_channel_for_chat() {
    let (session, _connector, mut peer) = connected().await;
    let chat = session.join_chat("42", ChatHooks::new()).unwrap();
    let typing = session.join_typing("42").unwrap();
    assert!(chat.channel().ptr_eq(typing.channel()));
    accept_join(&mut peer, "room:42").await;
    chat.channel().joined().await.unwrap();

    typing.input();
    typing.teardown();
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_START);
    assert_eq!(peer.next_frame().await.unwrap().event, events::TYPING_STOP);
    assert!(peer.try_next_frame().is_none());

    assert_eq!(chat.send_message("still here"), PushStatus::Queued);
    assert_eq!(peer.next_frame().await.unwrap().event, events::NEW_MESSAGE);
}

#[tokio::test]
async fn remote_typing_reaches_handler_and_bus() {
    let (session, peer, typing) = joined_indicator().await;
    let mut bus = session.subscribe();
    let (done, mut seen) = notifier();
    typing.on_remote_typing(move |started, payload| {
        done(&json!({"started": started, "payload": payload}));
    });

    peer.push_event("room:42", events::TYPING_START, json!({"user": "ada"}));
    assert_eq!(
        seen.recv().await.unwrap(),
        json!({"started": true, "payload": {"user": "ada"}})
    );
    assert_eq!(
        bus.recv().await.unwrap(),
        Event::RemoteTyping {
            room_id: "42".into(),
            typing: true,
            payload: json!({"user": "ada"}),
        }
    );

    peer.push_event("room:42", events::TYPING_STOP, json!({"user": "ada"}));
    assert_eq!(seen.recv().await.unwrap()["started"], false);
}

#[tokio::test]
async fn local_typing_is_published() {
    let (session, _peer, typing) = joined_indicator().await;
    let mut bus = session.subscribe();

    typing.input();
    typing.blur();

    assert_eq!(
        bus.recv().await.unwrap(),
        Event::TypingChanged {
            room_id: "42".into(),
            typing: true
        }
    );
    assert_eq!(
        bus.recv().await.unwrap(),
        Event::TypingChanged {
            room_id: "42".into(),
            typing: false
        }
    );
}
