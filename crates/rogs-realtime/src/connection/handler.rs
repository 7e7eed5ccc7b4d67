//! Incoming Phoenix message routing.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::router::Router;
use crate::channel::{ChannelInner, JoinState};
use crate::protocol::{phx, PhoenixMessage};

/// Route one inbound message to the channels on its topic.
///
/// `pending_heartbeat` holds the ref of the last unanswered heartbeat and is
/// cleared when its reply arrives.
pub(crate) fn handle_phoenix_message(
    msg: &PhoenixMessage,
    router: &mut Router,
    pending_heartbeat: &mut Option<String>,
) {
    if msg.topic == phx::SOCKET_TOPIC {
        if msg.event == phx::REPLY && msg.msg_ref.is_some() && msg.msg_ref == *pending_heartbeat {
            trace!("Heartbeat acknowledged");
            *pending_heartbeat = None;
        } else {
            debug!(event = %msg.event, "Unhandled socket message");
        }
        return;
    }

    let members = router.members(&msg.topic);
    if members.is_empty() {
        debug!(topic = %msg.topic, event = %msg.event, "Message for unknown topic");
        return;
    }

    match msg.event.as_str() {
        phx::REPLY => handle_reply(msg, &members),
        phx::ERROR => {
            for channel in addressed(msg, &members) {
                warn!(topic = %msg.topic, "Channel error");
                channel.fail("channel error");
            }
        }
        phx::CLOSE => {
            for channel in addressed(msg, &members) {
                info!(topic = %msg.topic, "Channel closed by server");
                channel.mark_left();
                router.remove(channel);
            }
        }
        event => {
            for channel in addressed(msg, &members) {
                channel.deliver(event, &msg.payload);
            }
        }
    }
}

fn handle_reply(msg: &PhoenixMessage, members: &[Arc<ChannelInner>]) {
    let Some(reply_ref) = msg.msg_ref.as_deref() else {
        debug!(topic = %msg.topic, "Reply without ref");
        return;
    };

    let pending = members.iter().find(|c| {
        c.state() == JoinState::Joining && c.join_ref().as_deref() == Some(reply_ref)
    });
    let Some(channel) = pending else {
        trace!(topic = %msg.topic, reply_ref, "Push acknowledged");
        return;
    };

    match msg.reply_status() {
        Some("ok") => {
            channel.mark_joined(reply_ref);
        }
        status => {
            let reason = msg.reply_reason();
            warn!(topic = %msg.topic, status = ?status, reason = %reason, "Channel join rejected");
            channel.fail_join(reply_ref, &reason);
        }
    }
}

/// Channels a message is meant for: every member when the message carries
/// no `join_ref`, otherwise only the member whose join it matches.
fn addressed<'a>(
    msg: &'a PhoenixMessage,
    members: &'a [Arc<ChannelInner>],
) -> impl Iterator<Item = &'a Arc<ChannelInner>> + 'a {
    members.iter().filter(move |c| match msg.join_ref.as_deref() {
        None => true,
        Some(join_ref) => c.join_ref().as_deref() == Some(join_ref),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heartbeat_reply_clears_pending() {
        let mut router = Router::default();
        let mut pending = Some("5".to_string());
        let reply = PhoenixMessage::new(phx::SOCKET_TOPIC, phx::REPLY, json!({"status": "ok"}))
            .with_ref("5");
        handle_phoenix_message(&reply, &mut router, &mut pending);
        assert_eq!(pending, None);
    }

    #[test]
    fn unrelated_socket_reply_keeps_pending() {
        let mut router = Router::default();
        let mut pending = Some("5".to_string());
        let reply = PhoenixMessage::new(phx::SOCKET_TOPIC, phx::REPLY, json!({"status": "ok"}))
            .with_ref("6");
        handle_phoenix_message(&reply, &mut router, &mut pending);
        assert_eq!(pending.as_deref(), Some("5"));
    }

    #[test]
    fn unknown_topic_is_ignored() {
        let mut router = Router::default();
        let mut pending = None;
        let msg = PhoenixMessage::new("room:nobody", "new_message", json!({}));
        handle_phoenix_message(&msg, &mut router, &mut pending);
        assert_eq!(pending, None);
    }
}
