//! Topic subscriptions: the channel handle, its lifecycle, the registry, and
//! the leases components hold on registry channels.

mod handle;
mod lease;
mod registry;
mod types;

pub use handle::Channel;
pub(crate) use handle::ChannelInner;
pub(crate) use lease::ChannelLease;
pub use registry::ChannelRegistry;
pub use types::{ChannelKind, JoinState, Observer, ObserverId, PushStatus, TopicNames};
