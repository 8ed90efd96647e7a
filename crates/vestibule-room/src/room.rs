//! Room records and their lifecycle phase.

use serde::{Deserialize, Serialize};
use vestibule_gateway::{ChannelId, GuildId, MemberId};

/// Where a room is in its life.
///
/// ```text
/// (untracked) → Active ⇄ Orphaned → (deleted, untracked)
/// ```
///
/// A room starts `Active` when its owner is moved in. It turns
/// `Orphaned` the moment the owner leaves while the room survives, and
/// turns `Active` again if the owner comes back through the same entry
/// channel. Deletion drops the record entirely, from either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// The owner is, as far as events have said, still in the room.
    Active,
    /// The owner has left; guests or bots may still be inside.
    Orphaned,
}

impl RoomPhase {
    /// Returns `true` once the owner is gone.
    pub fn is_orphaned(self) -> bool {
        matches!(self, Self::Orphaned)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Orphaned => write!(f, "Orphaned"),
        }
    }
}

/// One member-owned voice room under management.
///
/// This is the record the tracker keeps, not the channel itself: live
/// occupancy always comes from a fresh gateway snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// The voice channel backing this room.
    pub channel_id: ChannelId,

    /// The member the room was created for.
    pub owner: MemberId,

    /// The entry channel the owner came through.
    pub entry_channel_id: ChannelId,

    /// The guild everything lives in.
    pub guild_id: GuildId,

    /// Lifecycle phase.
    pub phase: RoomPhase,

    /// The name the room was created with.
    pub name: String,
}

impl Room {
    /// Creates an `Active` room record.
    pub fn new(
        channel_id: ChannelId,
        owner: MemberId,
        entry_channel_id: ChannelId,
        guild_id: GuildId,
        name: String,
    ) -> Self {
        Self {
            channel_id,
            owner,
            entry_channel_id,
            guild_id,
            phase: RoomPhase::Active,
            name,
        }
    }

    /// Returns `true` once the owner is gone.
    pub fn is_orphaned(&self) -> bool {
        self.phase.is_orphaned()
    }
}
