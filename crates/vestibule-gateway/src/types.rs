//! Identity and snapshot types for the chat platform boundary.
//!
//! Everything the room lifecycle engine knows about the platform arrives
//! through these types. They are deliberately thin: ids are opaque strings
//! minted by the platform, and snapshots carry only the fields the
//! lifecycle logic actually inspects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum channel name length the platform accepts, in characters.
///
/// The platform API rejects longer names outright, so naming policies
/// truncate their output to fit rather than let a create call fail.
pub const CHANNEL_NAME_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a channel.
///
/// This is a newtype wrapper around the platform's id string. Channel,
/// member, and guild ids all look identical on the wire (strings of
/// decimal digits), and wrapping each in its own type means you cannot
/// hand a `MemberId` to an API that expects a `ChannelId`.
///
/// The `#[serde(transparent)]` attribute keeps the JSON shape flat: a
/// `ChannelId` serializes as `"118933165129315634"`, not `{ "0": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Creates a `ChannelId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a guild member.
///
/// Same newtype pattern as [`ChannelId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    /// Creates a `MemberId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a guild (one community on the platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub String);

impl GuildId {
    /// Creates a `GuildId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns whether `value` has the shape of a platform-minted id.
///
/// Real ids are decimal renderings of a 64-bit timestamp-and-sequence
/// value, which puts them at 17 to 20 digits. This is a shape check
/// only; it cannot tell whether the id refers to anything that exists.
pub fn is_snowflake(value: &str) -> bool {
    (17..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Channel snapshots
// ---------------------------------------------------------------------------

/// What kind of channel an id refers to.
///
/// The lifecycle engine creates and deletes voice channels only, so every
/// channel it is about to touch gets checked against this first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// A voice channel members can connect to.
    Voice,
    /// A text channel.
    Text,
    /// A grouping header that other channels sit under.
    Category,
    /// Anything else the platform may add (threads, stages, forums).
    Other,
}

impl ChannelKind {
    /// Returns `true` for the only kind the lifecycle engine manages.
    pub fn is_voice(self) -> bool {
        matches!(self, ChannelKind::Voice)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Voice => "voice",
            ChannelKind::Text => "text",
            ChannelKind::Category => "category",
            ChannelKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One member currently connected to a voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// The member's id.
    pub member_id: MemberId,
    /// Whether this member is an automated account.
    pub bot: bool,
}

/// A point-in-time view of one channel, fetched from the platform.
///
/// Occupancy is read through a fresh snapshot rather than cached:
/// between two events anything can happen on the platform side, so
/// deletion decisions re-fetch before they commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// The channel's id.
    pub id: ChannelId,
    /// What kind of channel this is.
    pub kind: ChannelKind,
    /// Members currently connected. Meaningful for voice channels only.
    pub occupants: Vec<Occupant>,
}

impl ChannelSnapshot {
    /// Returns `true` when nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Returns `true` when every remaining occupant is a bot.
    ///
    /// Vacuously true for an empty channel.
    pub fn only_bots(&self) -> bool {
        self.occupants.iter().all(|o| o.bot)
    }
}

/// The identity attached to a presence change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// The member's id.
    pub id: MemberId,
    /// The name shown in the guild. Naming policies build on this.
    pub display_name: String,
    /// Whether this member is an automated account.
    pub bot: bool,
}

// =========================================================================
// Tests
// =========================================================================
