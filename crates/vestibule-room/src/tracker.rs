//! The room tracker: which channels are rooms, and whose.

use std::collections::HashMap;

use vestibule_gateway::{ChannelId, MemberId};

use crate::{Room, RoomPhase};

/// In-memory index of every room the lifecycle engine manages.
///
/// Rooms are stored per entry channel in creation order (naming
/// policies count them), with a flat channel-to-entry index on the
/// side for O(1) answers to "is this channel one of ours?".
///
/// # Concurrency note
///
/// `RoomTracker` is not thread-safe by itself: plain maps, no locks.
/// Like the registry, it is owned by the single event task and never
/// sees concurrent access.
pub struct RoomTracker {
    /// Rooms grouped by the entry channel they were spawned from,
    /// oldest first.
    rooms: HashMap<ChannelId, Vec<Room>>,

    /// Maps each room channel to its entry channel.
    /// Kept in sync with `rooms` on every insert and remove.
    entry_of: HashMap<ChannelId, ChannelId>,
}

impl RoomTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            entry_of: HashMap::new(),
        }
    }

    /// Records a room. A channel id can only ever host one room, so an
    /// existing record under the same id is dropped first.
    pub fn insert(&mut self, room: Room) {
        self.remove(&room.channel_id);
        self.entry_of
            .insert(room.channel_id.clone(), room.entry_channel_id.clone());
        self.rooms
            .entry(room.entry_channel_id.clone())
            .or_default()
            .push(room);
    }

    /// Forgets a room, returning its record.
    pub fn remove(&mut self, channel: &ChannelId) -> Option<Room> {
        let entry = self.entry_of.remove(channel)?;
        let rooms = self.rooms.get_mut(&entry)?;
        let index = rooms.iter().position(|r| &r.channel_id == channel)?;
        let room = rooms.remove(index);
        if rooms.is_empty() {
            self.rooms.remove(&entry);
        }
        Some(room)
    }

    /// Looks up a room by its channel id.
    pub fn get(&self, channel: &ChannelId) -> Option<&Room> {
        let entry = self.entry_of.get(channel)?;
        self.rooms
            .get(entry)?
            .iter()
            .find(|r| &r.channel_id == channel)
    }

    /// Returns `true` when `channel` is a tracked room.
    pub fn is_room(&self, channel: &ChannelId) -> bool {
        self.entry_of.contains_key(channel)
    }

    /// The room `owner` holds under one specific entry channel.
    pub fn owned_by(&self, entry: &ChannelId, owner: &MemberId) -> Option<&Room> {
        self.rooms.get(entry)?.iter().find(|r| &r.owner == owner)
    }

    /// The first room `owner` holds under any entry channel.
    ///
    /// A member can own one room per entry; when they own several, the
    /// choice between them is unspecified.
    pub fn find_by_owner(&self, owner: &MemberId) -> Option<&Room> {
        self.rooms.values().flatten().find(|r| &r.owner == owner)
    }

    /// Rooms spawned from `entry`, oldest first.
    pub fn rooms_for(&self, entry: &ChannelId) -> &[Room] {
        self.rooms.get(entry).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of rooms currently spawned from `entry`.
    pub fn room_count(&self, entry: &ChannelId) -> usize {
        self.rooms.get(entry).map(Vec::len).unwrap_or(0)
    }

    /// Total rooms across all entry channels.
    pub fn total(&self) -> usize {
        self.entry_of.len()
    }

    /// Marks a room as orphaned. Returns `false` for unknown channels.
    pub fn mark_orphaned(&mut self, channel: &ChannelId) -> bool {
        self.set_phase(channel, RoomPhase::Orphaned)
    }

    /// Marks a room as active again. Returns `false` for unknown
    /// channels.
    pub fn mark_active(&mut self, channel: &ChannelId) -> bool {
        self.set_phase(channel, RoomPhase::Active)
    }

    fn set_phase(&mut self, channel: &ChannelId, phase: RoomPhase) -> bool {
        match self.room_mut(channel) {
            Some(room) => {
                room.phase = phase;
                true
            }
            None => false,
        }
    }

    fn room_mut(&mut self, channel: &ChannelId) -> Option<&mut Room> {
        let entry = self.entry_of.get(channel)?;
        self.rooms
            .get_mut(entry)?
            .iter_mut()
            .find(|r| &r.channel_id == channel)
    }
}

impl Default for RoomTracker {
    fn default() -> Self {
        Self::new()
    }
}
