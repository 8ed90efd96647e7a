//! The entry registry: which channels act as doors, and under what
//! rules.

use std::collections::HashMap;

use vestibule_gateway::ChannelId;

use crate::{DeletionContext, DeletionPredicate, EntryChannelConfig};

/// Tracks every registered entry channel plus the global deletion
/// predicates that apply across all of them.
///
/// # Concurrency note
///
/// `EntryRegistry` is not thread-safe by itself: plain maps, no locks.
/// It is owned by the lifecycle engine's single event task and reached
/// through that task's command channel, so it never sees concurrent
/// access.
pub struct EntryRegistry {
    /// Registered entry channels, keyed by channel id.
    entries: HashMap<ChannelId, EntryChannelConfig>,

    /// Predicates consulted for every room, regardless of entry.
    global_predicates: Vec<DeletionPredicate>,
}

impl EntryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            global_predicates: Vec::new(),
        }
    }

    /// Registers an entry channel. Registering the same channel again
    /// replaces its configuration in place.
    pub fn register(&mut self, config: EntryChannelConfig) {
        let entry = config.entry_channel_id.clone();
        let replaced = self.entries.insert(entry.clone(), config).is_some();
        if replaced {
            tracing::info!(%entry, "entry channel reconfigured");
        } else {
            tracing::info!(%entry, "entry channel registered");
        }
    }

    /// Removes an entry channel. Returns whether it was registered.
    ///
    /// Rooms already spawned from it are unaffected; they drain under
    /// the global predicates.
    pub fn deregister(&mut self, entry: &ChannelId) -> bool {
        let removed = self.entries.remove(entry).is_some();
        if removed {
            tracing::info!(%entry, "entry channel deregistered");
        }
        removed
    }

    /// Looks up the configuration for an entry channel.
    pub fn lookup(&self, entry: &ChannelId) -> Option<&EntryChannelConfig> {
        self.entries.get(entry)
    }

    /// Returns `true` when `channel` is a registered entry channel.
    pub fn is_entry(&self, channel: &ChannelId) -> bool {
        self.entries.contains_key(channel)
    }

    /// Adds a predicate consulted for every entry channel.
    pub fn add_global_predicate(&mut self, predicate: DeletionPredicate) {
        self.global_predicates.push(predicate);
    }

    /// The predicates that apply to every entry channel.
    pub fn global_predicates(&self) -> &[DeletionPredicate] {
        &self.global_predicates
    }

    /// Decides whether a room spawned from `entry` should be reclaimed.
    ///
    /// The evaluation set is the global predicates plus the entry's own
    /// (when the entry is still registered), and every one of them must
    /// hold. An empty evaluation set never reclaims: a room under no
    /// predicates lives until something outside deletes it.
    pub fn should_reclaim(&self, entry: &ChannelId, ctx: &DeletionContext<'_>) -> bool {
        let entry_predicates = self
            .entries
            .get(entry)
            .map(|c| c.deletion.predicates())
            .unwrap_or(&[]);

        if self.global_predicates.is_empty() && entry_predicates.is_empty() {
            return false;
        }

        self.global_predicates
            .iter()
            .chain(entry_predicates)
            .all(|p| p.holds(ctx))
    }

    /// Returns the number of registered entry channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry channels are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists all registered entry channel ids.
    pub fn entry_ids(&self) -> Vec<ChannelId> {
        self.entries.keys().cloned().collect()
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
