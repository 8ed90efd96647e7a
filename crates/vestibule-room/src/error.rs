//! Error types for the room layer.

use vestibule_gateway::{ChannelId, ChannelKind, GatewayError, MemberId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The member owns no tracked room.
    #[error("member {0} has no room")]
    NoRoomForMember(MemberId),

    /// A channel the engine tracks as a voice room turned out to be
    /// something else. The room is left untouched when this happens.
    #[error("channel {channel} is a {kind} channel, not voice")]
    WrongChannelKind {
        /// The offending channel.
        channel: ChannelId,
        /// What the platform says it actually is.
        kind: ChannelKind,
    },

    /// The platform call behind an operation failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
