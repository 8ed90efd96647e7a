//! Error type for platform operations.

use crate::{ChannelId, MemberId};

/// Errors reported by a [`Gateway`](crate::Gateway) implementation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The credential behind the gateway lacks a required permission.
    #[error("missing permission: {0}")]
    Forbidden(String),

    /// The platform refused because a limit was hit (channel cap per
    /// guild, a rate limit that exhausted its retries).
    #[error("platform quota exceeded: {0}")]
    QuotaExceeded(String),

    /// No channel with this id exists.
    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    /// The channel was already gone when a delete was attempted.
    /// Callers treat this as success.
    #[error("channel {0} already deleted")]
    AlreadyDeleted(ChannelId),

    /// The member disconnected or left the guild before a move landed.
    #[error("member {0} is no longer connected")]
    MemberGone(MemberId),

    /// Any other platform-side failure.
    #[error("platform error: {0}")]
    Platform(String),
}
