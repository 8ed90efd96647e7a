//! Chat platform boundary for Vestibule.
//!
//! The room lifecycle engine never talks to a chat platform directly.
//! It sees the platform through two traits defined here:
//!
//! - [`Gateway`]: the commands it issues (create, move, delete, fetch)
//! - [`EventSource`]: the events it consumes (presence changes,
//!   channel deletions)
//!
//! Everything else in this crate is the vocabulary those traits speak:
//! ids, channel snapshots, presence changes, and the gateway error type.

mod error;
mod events;
mod gateway;
mod types;

pub use error::GatewayError;
pub use events::{EventSource, GatewayEvent, PresenceChange, PresenceShape};
pub use gateway::{Gateway, GatewayCapabilities};
pub use types::{
    is_snowflake, ChannelId, ChannelKind, ChannelSnapshot, GuildId, MemberId,
    MemberProfile, Occupant, CHANNEL_NAME_LIMIT,
};
