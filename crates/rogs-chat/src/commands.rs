//! Parsing of lines typed at the prompt.

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a chat message.
    Say(String),
    /// Simulated keystroke for the typing indicator.
    Typing,
    Blur,
    Call,
    Hangup,
    Mic,
    Speakers,
    Status,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    // `//text` sends a message that starts with a slash.
    if command.starts_with('/') {
        return Command::Say(command.to_string());
    }
    match command.split_whitespace().next().unwrap_or_default() {
        "typing" => Command::Typing,
        "blur" => Command::Blur,
        "call" => Command::Call,
        "hangup" => Command::Hangup,
        "mic" => Command::Mic,
        "speakers" => Command::Speakers,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

pub const HELP: &str = "\
commands:
  <text>      send a chat message
  /typing     simulate a keystroke (typing indicator)
  /blur       stop typing now
  /call       announce you are ready for a call
  /hangup     announce you left the call
  /mic        toggle microphone (local)
  /speakers   toggle speakers (local)
  /status     show call controls and connection counters
  /quit       leave the room and exit";
