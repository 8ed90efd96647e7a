//! Per-entry-channel configuration.

use vestibule_gateway::{ChannelId, GuildId};

use crate::{DeletionPolicy, NamePolicy};

/// Everything the lifecycle engine knows about one entry channel.
///
/// An entry channel is a designated voice channel that acts as a door:
/// a member who connects to it gets a room of their own and is moved
/// there. The config says where those rooms go, what they are called,
/// and when they are reclaimed.
#[derive(Debug, Clone)]
pub struct EntryChannelConfig {
    /// The entry channel itself.
    pub entry_channel_id: ChannelId,

    /// The guild the entry channel belongs to.
    pub guild_id: GuildId,

    /// Category new rooms are created under. `None` puts them at the
    /// guild root.
    pub category_id: Option<ChannelId>,

    /// How new rooms are named.
    pub naming: NamePolicy,

    /// When rooms spawned from this entry get reclaimed.
    pub deletion: DeletionPolicy,
}

impl EntryChannelConfig {
    /// Creates a config with the stock behavior: no category, numbered
    /// names, reclaim when empty.
    pub fn new(entry_channel_id: ChannelId, guild_id: GuildId) -> Self {
        Self {
            entry_channel_id,
            guild_id,
            category_id: None,
            naming: NamePolicy::default(),
            deletion: DeletionPolicy::default(),
        }
    }

    /// Places new rooms under a category.
    pub fn in_category(mut self, category_id: ChannelId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Overrides the naming policy.
    pub fn named_by(mut self, naming: NamePolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Overrides the deletion policy.
    pub fn reclaimed_by(mut self, deletion: DeletionPolicy) -> Self {
        self.deletion = deletion;
        self
    }
}
