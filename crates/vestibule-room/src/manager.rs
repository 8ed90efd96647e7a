//! The reconciler: applies platform events to tracked room state.

use std::sync::Arc;

use vestibule_gateway::{
    ChannelId, ChannelKind, ChannelSnapshot, Gateway, GatewayError, GatewayEvent, GuildId,
    MemberId, MemberProfile, PresenceChange, PresenceShape,
};
use vestibule_registry::{DeletionContext, DeletionPredicate, EntryChannelConfig, EntryRegistry};

use crate::{Room, RoomError, RoomTracker};

/// Audit log line for creating a room.
fn creation_reason(owner_name: &str) -> String {
    format!("Voice room for {owner_name}")
}

/// Audit log line for moving an owner into their room.
fn move_reason(owner_name: &str) -> String {
    format!("Moving {owner_name} into their voice room")
}

/// Audit log line for reclaiming an idle room.
const RECLAIM_REASON: &str = "Auto-deleted: voice room no longer in use";

/// Verifies that a snapshot describes a voice channel.
///
/// Every code path that is about to treat a channel as a room goes
/// through here, so the kind rule lives in exactly one place.
fn ensure_voice(snapshot: &ChannelSnapshot) -> Result<(), RoomError> {
    if snapshot.kind.is_voice() {
        Ok(())
    } else {
        Err(RoomError::WrongChannelKind {
            channel: snapshot.id.clone(),
            kind: snapshot.kind,
        })
    }
}

/// Owns all lifecycle state and applies events to it, one at a time.
///
/// The manager is single-writer by construction: it is owned by one
/// event task and has exclusive access while an event is handled, so no
/// interleaving is possible between reading state and acting on it.
/// Anything that depends on live platform state (occupancy, channel
/// kind) is re-fetched through the gateway rather than cached.
///
/// Event handling never returns an error. Individual gateway failures
/// are logged and absorbed so one bad event cannot wedge the stream;
/// the state is left wherever it is safe (a room that could not be
/// deleted stays tracked, a room that could not be created is never
/// tracked).
pub struct RoomManager<G: Gateway> {
    gateway: Arc<G>,
    registry: EntryRegistry,
    tracker: RoomTracker,
}

impl<G: Gateway> RoomManager<G> {
    /// Creates a manager with an empty registry and no tracked rooms.
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            registry: EntryRegistry::new(),
            tracker: RoomTracker::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Registry management
    // ---------------------------------------------------------------------

    /// Registers an entry channel, replacing any previous configuration
    /// for the same channel.
    pub fn register_entry(&mut self, config: EntryChannelConfig) {
        self.registry.register(config);
    }

    /// Deregisters an entry channel. Returns whether it was registered.
    ///
    /// Rooms already spawned from it keep draining under the global
    /// deletion predicates.
    pub fn deregister_entry(&mut self, entry: &ChannelId) -> bool {
        self.registry.deregister(entry)
    }

    /// Adds a deletion predicate that applies to every entry channel.
    pub fn add_global_predicate(&mut self, predicate: DeletionPredicate) {
        self.registry.add_global_predicate(predicate);
    }

    /// Read access to the entry registry.
    pub fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// Rooms currently tracked for one entry channel, oldest first.
    pub fn rooms_for(&self, entry: &ChannelId) -> Vec<Room> {
        self.tracker.rooms_for(entry).to_vec()
    }

    /// The room a member currently owns, if any.
    pub fn room_for_member(&self, member: &MemberId) -> Option<Room> {
        self.tracker.find_by_owner(member).cloned()
    }

    /// The entry configuration a tracked room was spawned from, when
    /// that entry is still registered.
    pub fn entry_for_room(&self, channel: &ChannelId) -> Option<&EntryChannelConfig> {
        let room = self.tracker.get(channel)?;
        self.registry.lookup(&room.entry_channel_id)
    }

    /// Total number of tracked rooms across all entries.
    pub fn total_rooms(&self) -> usize {
        self.tracker.total()
    }

    /// Fetches the live channel behind a member's room and verifies it
    /// is still a voice channel.
    pub async fn member_room_channel(
        &self,
        member: &MemberId,
    ) -> Result<ChannelSnapshot, RoomError> {
        let room = self
            .tracker
            .find_by_owner(member)
            .ok_or_else(|| RoomError::NoRoomForMember(member.clone()))?;
        let snapshot = self.gateway.fetch_channel(&room.channel_id).await?;
        ensure_voice(&snapshot)?;
        Ok(snapshot)
    }

    // ---------------------------------------------------------------------
    // Event handling
    // ---------------------------------------------------------------------

    /// Applies one platform event to the tracked state.
    pub async fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Presence(change) => self.handle_presence(change).await,
            GatewayEvent::ChannelDeleted { channel_id, kind } => {
                self.handle_channel_deleted(channel_id, kind);
            }
        }
    }

    /// Applies one presence change.
    pub async fn handle_presence(&mut self, change: PresenceChange) {
        let Some(shape) = change.shape() else {
            // In-place change (mute, deafen, stream): nothing moved.
            return;
        };
        match shape {
            PresenceShape::Joined(to) => {
                self.member_joined(&change.guild_id, &change.member, &to).await;
            }
            PresenceShape::Left(from) => {
                self.member_left(&change.member, &from).await;
            }
            PresenceShape::Moved { from, to } => {
                // A move is a departure then an arrival. The arrival
                // runs against whatever state the departure left, so a
                // member hopping from their dying room into an entry
                // channel gets a fresh room.
                self.member_left(&change.member, &from).await;
                self.member_joined(&change.guild_id, &change.member, &to).await;
            }
        }
    }

    /// Reconciles a channel that disappeared on the platform.
    ///
    /// Fires for every deletion, including ones the manager issued
    /// itself; those find no tracked state left and fall through.
    pub fn handle_channel_deleted(&mut self, channel_id: ChannelId, kind: ChannelKind) {
        if !kind.is_voice() {
            // Categories, text channels, threads: never lifecycle state.
            return;
        }

        if self.registry.deregister(&channel_id) {
            // The door is gone. Rooms spawned from it stay tracked and
            // drain under the global predicates.
            tracing::info!(entry = %channel_id, "entry channel deleted on platform");
            return;
        }

        if let Some(room) = self.tracker.remove(&channel_id) {
            // Deleted out from under us by an admin or another
            // integration. Nothing left to undo on the platform.
            tracing::info!(
                room = %channel_id,
                owner = %room.owner,
                "room deleted on platform, dropped from tracking"
            );
        }
    }

    /// A member arrived in `channel` from nowhere or from elsewhere.
    async fn member_joined(
        &mut self,
        guild: &GuildId,
        member: &MemberProfile,
        channel: &ChannelId,
    ) {
        if !self.registry.is_entry(channel) {
            // Joining a room as a guest, or an unmanaged channel:
            // no ceremony either way.
            return;
        }

        // An owner coming back through the door keeps their room.
        if let Some(room) = self.tracker.owned_by(channel, &member.id) {
            let room_id = room.channel_id.clone();
            self.tracker.mark_active(&room_id);
            tracing::info!(
                entry = %channel,
                owner = %member.id,
                room = %room_id,
                "owner returned, reusing their room"
            );
            if let Err(error) = self
                .gateway
                .move_member(guild, &member.id, &room_id, &move_reason(&member.display_name))
                .await
            {
                tracing::warn!(
                    room = %room_id,
                    member = %member.id,
                    %error,
                    "failed to move owner into existing room"
                );
            }
            return;
        }

        let (name, category) = match self.registry.lookup(channel) {
            Some(config) => (
                config
                    .naming
                    .render(&member.display_name, self.tracker.room_count(channel)),
                config.category_id.clone(),
            ),
            None => return,
        };

        let room_id = match self
            .gateway
            .create_voice_channel(
                guild,
                &name,
                category.as_ref(),
                &creation_reason(&member.display_name),
            )
            .await
        {
            Ok(id) => id,
            Err(error) => {
                // Nothing was tracked, so nothing needs undoing.
                tracing::warn!(
                    entry = %channel,
                    member = %member.id,
                    %error,
                    "room creation failed"
                );
                return;
            }
        };

        // Record before moving: if the move fails the room still
        // exists on the platform and must stay visible to deletion.
        self.tracker.insert(Room::new(
            room_id.clone(),
            member.id.clone(),
            channel.clone(),
            guild.clone(),
            name.clone(),
        ));
        tracing::info!(
            room = %room_id,
            owner = %member.id,
            entry = %channel,
            %name,
            "room created"
        );

        if let Err(error) = self
            .gateway
            .move_member(guild, &member.id, &room_id, &move_reason(&member.display_name))
            .await
        {
            tracing::warn!(
                room = %room_id,
                member = %member.id,
                %error,
                "failed to move owner into new room"
            );
        }
    }

    /// A member departed from `channel`, by disconnecting or by moving
    /// elsewhere.
    async fn member_left(&mut self, member: &MemberProfile, channel: &ChannelId) {
        let (entry, owner, was_orphaned) = match self.tracker.get(channel) {
            Some(room) => (
                room.entry_channel_id.clone(),
                room.owner.clone(),
                room.is_orphaned(),
            ),
            // Leaving an entry channel or an unmanaged channel.
            None => return,
        };

        let owner_leaving = owner == member.id;
        if owner_leaving {
            self.tracker.mark_orphaned(channel);
            tracing::debug!(room = %channel, owner = %member.id, "owner left their room");
        }
        let orphaned = was_orphaned || owner_leaving;

        // Deletion decisions run against live occupancy, not whatever
        // the last event implied.
        let snapshot = match self.gateway.fetch_channel(channel).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(room = %channel, %error, "occupancy check failed, keeping room");
                return;
            }
        };

        if let Err(error) = ensure_voice(&snapshot) {
            tracing::warn!(room = %channel, %error, "tracked room failed the voice check");
            return;
        }

        let ctx = DeletionContext {
            owner_leaving,
            orphaned,
            occupants: &snapshot.occupants,
        };
        if !self.registry.should_reclaim(&entry, &ctx) {
            return;
        }

        // Forget the room before touching the platform, so the deletion
        // event that echoes back finds nothing to reconcile.
        let Some(room) = self.tracker.remove(channel) else {
            return;
        };
        tracing::info!(
            room = %channel,
            owner = %room.owner,
            entry = %entry,
            "reclaiming room"
        );

        match self.gateway.delete_channel(channel, RECLAIM_REASON).await {
            Ok(()) => {}
            Err(GatewayError::AlreadyDeleted(_)) => {
                tracing::debug!(room = %channel, "room was already gone");
            }
            Err(error) => {
                // The channel may linger on the platform. A later
                // manual delete will be reconciled like any other.
                tracing::warn!(room = %channel, %error, "failed to delete reclaimed room");
            }
        }
    }
}
