//! rogs-chat: terminal client for one room.
//!
//! Joins the room's chat, typing and signaling channels on a single socket,
//! prints what arrives, and turns lines from stdin into messages and call
//! commands.

mod cli;
mod commands;
mod settings;

use rogs_common::RogsError;
use rogs_config::RogsConfig;
use rogs_realtime::{
    ChatChannel, ChatHooks, Event, PushStatus, RealtimeSession, SignalHooks, SignalingChannel,
    TypingIndicator,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

struct Room {
    chat: ChatChannel,
    typing: TypingIndicator,
    signal: SignalingChannel,
}

#[tokio::main]
async fn main() -> Result<(), RogsError> {
    let args = cli::parse();

    // An explicit config path must load; the default path falls back to
    // defaults with a warning once logging is up.
    let (config, load_error) = match &args.config {
        Some(path) => (rogs_config::load_config_from(path)?, None),
        None => match rogs_config::load_config() {
            Ok(config) => (config, None),
            Err(e) => (RogsConfig::default(), Some(e)),
        },
    };

    let directive = settings::log_directive(args.log_level.as_deref(), &config.logging);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("rogs-chat v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    let session = RealtimeSession::new(settings::realtime_config(
        &config,
        args.endpoint.as_deref(),
    ));
    session.connect(&args.token);
    tokio::spawn(log_events(session.subscribe()));

    let room = join_room(&session, &args.room)?;
    println!("joined room {} (type /help for commands)", args.room);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&room, &session, &line) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    room.typing.teardown();
    room.signal.destroy();
    room.chat.leave();
    session.disconnect().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn join_room(session: &RealtimeSession, room_id: &str) -> Result<Room, RogsError> {
    let chat = session.join_chat(
        room_id,
        ChatHooks::new().on_message(|payload| {
            let from = payload
                .get("user")
                .and_then(|u| u.as_str())
                .unwrap_or("someone");
            match payload.get("content").and_then(|c| c.as_str()) {
                Some(content) => println!("<{from}> {content}"),
                None => println!("<{from}> {payload}"),
            }
        }),
    )?;

    let typing = session.join_typing(room_id)?;
    typing.on_remote_typing(|started, payload| {
        let who = payload
            .get("user")
            .and_then(|u| u.as_str())
            .unwrap_or("someone");
        if started {
            println!("* {who} is typing");
        } else {
            println!("* {who} stopped typing");
        }
    });

    let signal = session.join_signal(
        room_id,
        SignalHooks::new()
            .on_offer(|payload| println!("[signal] offer {payload}"))
            .on_answer(|payload| println!("[signal] answer {payload}"))
            .on_ice_candidate(|payload| println!("[signal] ice-candidate {payload}")),
    )?;

    Ok(Room {
        chat,
        typing,
        signal,
    })
}

/// Returns false when the user asked to quit.
fn handle_line(room: &Room, session: &RealtimeSession, line: &str) -> bool {
    match commands::parse(line) {
        Command::Say(text) => {
            report("message", room.chat.send_message(&text));
            room.typing.blur();
        }
        Command::Typing => room.typing.input(),
        Command::Blur => room.typing.blur(),
        Command::Call => report("call", room.signal.start_call()),
        Command::Hangup => report("hangup", room.signal.stop_call()),
        Command::Mic => {
            let on = room.signal.toggle_mic();
            println!("microphone {}", if on { "on" } else { "off" });
        }
        Command::Speakers => {
            let on = room.signal.toggle_speakers();
            println!("speakers {}", if on { "on" } else { "off" });
        }
        Command::Status => print_status(room, session),
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => return false,
        Command::Unknown(name) => println!("unknown command /{name} (try /help)"),
        Command::Empty => {}
    }
    true
}

fn report(what: &str, status: PushStatus) {
    if status == PushStatus::Skipped {
        println!("{what} not sent: channel is not joined");
    }
}

fn print_status(room: &Room, session: &RealtimeSession) {
    let controls = room.signal.controls();
    println!(
        "connection: {}  chat: {}  typing: {}  signal: {}",
        session.state(),
        room.chat.channel().state(),
        room.typing.channel().state(),
        room.signal
            .channel()
            .map(|c| c.state().to_string())
            .unwrap_or_else(|| "unavailable".into()),
    );
    println!(
        "call: {}  mic: {}  speakers: {}",
        controls.call_active, controls.mic_enabled, controls.speakers_enabled
    );
    if let Ok(connection) = session.connection() {
        let stats = connection.stats();
        println!(
            "pushes sent: {}  skipped: {}  connect attempts: {}",
            stats.pushes_sent(),
            stats.pushes_skipped(),
            stats.connect_attempts()
        );
    }
}

async fn log_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::ConnectionStateChanged { state, .. }) => {
                tracing::info!(state = %state, "Connection state changed");
            }
            Ok(Event::ChannelStateChanged { topic, kind, state, .. }) => {
                tracing::info!(topic = %topic, kind = %kind, state = %state, "Channel state changed");
            }
            Ok(event) => tracing::debug!(?event, "Realtime event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
