//! Call signaling for a room: relays offers, answers and ICE candidates to
//! the caller's handlers, and sends call intents (`peer-ready`).

mod hooks;
mod relay;
mod types;

pub use hooks::{SignalHandler, SignalHooks, SignalKind};
pub use relay::SignalingChannel;
pub use types::CallControls;
