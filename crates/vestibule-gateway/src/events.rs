//! Events the platform pushes at the lifecycle engine, and the stream
//! they arrive on.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

use crate::{ChannelId, ChannelKind, GuildId, MemberProfile};

/// A raw voice-state transition for one member.
///
/// The platform reports presence as a before/after channel pair. The
/// same pair shape also fires for in-place changes (mute, deafen,
/// stream toggles), in which case both sides name the same channel.
/// [`PresenceChange::shape`] collapses the pair into the movement it
/// represents, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceChange {
    /// Guild in which the change happened.
    pub guild_id: GuildId,
    /// Who moved.
    pub member: MemberProfile,
    /// The channel the member was connected to before, if any.
    pub old_channel: Option<ChannelId>,
    /// The channel the member is connected to now, if any.
    pub new_channel: Option<ChannelId>,
}

/// The movement a [`PresenceChange`] encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceShape {
    /// Connected from nowhere.
    Joined(ChannelId),
    /// Disconnected entirely.
    Left(ChannelId),
    /// Switched channels without disconnecting.
    Moved {
        /// Channel the member came from.
        from: ChannelId,
        /// Channel the member went to.
        to: ChannelId,
    },
}

impl PresenceChange {
    /// Classifies this change as a join, a leave, or a move.
    ///
    /// Returns `None` for non-movements: both sides absent, or both
    /// sides the same channel (a mute or similar in-place toggle).
    pub fn shape(&self) -> Option<PresenceShape> {
        match (&self.old_channel, &self.new_channel) {
            (None, Some(to)) => Some(PresenceShape::Joined(to.clone())),
            (Some(from), None) => Some(PresenceShape::Left(from.clone())),
            (Some(from), Some(to)) if from != to => Some(PresenceShape::Moved {
                from: from.clone(),
                to: to.clone(),
            }),
            _ => None,
        }
    }
}

/// An event delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    /// A member's voice presence changed.
    Presence(PresenceChange),

    /// A channel was removed on the platform, by any actor: an admin,
    /// another integration, or the lifecycle engine itself.
    ChannelDeleted {
        /// The deleted channel.
        channel_id: ChannelId,
        /// What kind of channel it was.
        kind: ChannelKind,
    },
}

/// A stream of [`GatewayEvent`]s.
///
/// The lifecycle engine pulls from exactly one of these in a single
/// task, which is what keeps event handling strictly ordered. Blanket
/// implementations exist for Tokio mpsc receivers; anything that can
/// yield events one at a time fits.
pub trait EventSource: Send + 'static {
    /// Waits for the next event.
    ///
    /// Returns `None` once the stream has ended and no further events
    /// will ever arrive.
    ///
    /// Callers may race this future against other work and drop it
    /// before it resolves; an implementation must not lose an event
    /// when that happens. Both mpsc implementations hold that property.
    fn next_event(&mut self) -> impl Future<Output = Option<GatewayEvent>> + Send;
}

impl EventSource for mpsc::Receiver<GatewayEvent> {
    async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.recv().await
    }
}

impl EventSource for mpsc::UnboundedReceiver<GatewayEvent> {
    async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.recv().await
    }
}

// =========================================================================
// Tests
// =========================================================================
