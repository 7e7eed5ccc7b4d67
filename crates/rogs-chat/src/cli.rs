use std::path::PathBuf;

use clap::Parser;

/// rogs-chat: room chat, typing indicators and call signaling from a terminal.
#[derive(Parser, Debug)]
#[command(name = "rogs-chat", version, about)]
pub struct Args {
    /// Room to join.
    #[arg(short, long)]
    pub room: String,

    /// Auth token, sent to the server as `_csrf_token`.
    #[arg(long, env = "ROGS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Socket endpoint override (e.g. wss://chat.example.com/socket).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error) or a full
    /// filter directive.
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
