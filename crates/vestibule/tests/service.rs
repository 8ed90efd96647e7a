//! Integration tests for the room service task, handle, and event wiring.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use vestibule::{
    ChannelId, ChannelKind, ChannelSnapshot, ConfigError, DeletionPredicate,
    EntryChannelConfig, Gateway, GatewayCapabilities, GatewayError, GatewayEvent,
    GuildId, MemberId, MemberProfile, Occupant, PresenceChange, ResolvedConfig,
    RoomError, RoomService, RoomServiceHandle, VestibuleError,
};

// =========================================================================
// Mock gateway
// =========================================================================

struct MemoryGateway {
    channels: Mutex<HashMap<ChannelId, ChannelSnapshot>>,
    created: Mutex<Vec<(ChannelId, String)>>,
    deleted: Mutex<Vec<ChannelId>>,
    next_id: AtomicU64,
    capabilities: GatewayCapabilities,
}

impl MemoryGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            capabilities: GatewayCapabilities::all(),
        })
    }

    fn deaf() -> Arc<Self> {
        let mut gateway = Self {
            channels: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            capabilities: GatewayCapabilities::all(),
        };
        gateway.capabilities.voice_presence_events = false;
        Arc::new(gateway)
    }

    fn created(&self) -> Vec<(ChannelId, String)> {
        self.created.lock().unwrap().clone()
    }

    fn deleted(&self) -> Vec<ChannelId> {
        self.deleted.lock().unwrap().clone()
    }

    fn set_occupants(&self, channel: &ChannelId, occupants: Vec<Occupant>) {
        let mut channels = self.channels.lock().unwrap();
        if let Some(snapshot) = channels.get_mut(channel) {
            snapshot.occupants = occupants;
        }
    }
}

impl Gateway for MemoryGateway {
    async fn create_voice_channel(
        &self,
        _guild: &GuildId,
        name: &str,
        _category: Option<&ChannelId>,
        _reason: &str,
    ) -> Result<ChannelId, GatewayError> {
        let id = ChannelId::new(format!(
            "room-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        self.channels.lock().unwrap().insert(
            id.clone(),
            ChannelSnapshot {
                id: id.clone(),
                kind: ChannelKind::Voice,
                occupants: vec![],
            },
        );
        self.created
            .lock()
            .unwrap()
            .push((id.clone(), name.to_string()));
        Ok(id)
    }

    async fn move_member(
        &self,
        _guild: &GuildId,
        _member: &MemberId,
        _channel: &ChannelId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn delete_channel(
        &self,
        channel: &ChannelId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        self.deleted.lock().unwrap().push(channel.clone());
        self.channels.lock().unwrap().remove(channel);
        Ok(())
    }

    async fn fetch_channel(
        &self,
        channel: &ChannelId,
    ) -> Result<ChannelSnapshot, GatewayError> {
        self.channels
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .ok_or_else(|| GatewayError::ChannelNotFound(channel.clone()))
    }

    fn capabilities(&self) -> GatewayCapabilities {
        self.capabilities
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn gid() -> GuildId {
    GuildId::new("guild-1")
}

fn cid(id: &str) -> ChannelId {
    ChannelId::new(id)
}

fn profile(id: &str) -> MemberProfile {
    MemberProfile {
        id: MemberId::new(id),
        display_name: id.to_string(),
        bot: false,
    }
}

fn join_event(member: &str, to: &str) -> GatewayEvent {
    GatewayEvent::Presence(PresenceChange {
        guild_id: gid(),
        member: profile(member),
        old_channel: None,
        new_channel: Some(cid(to)),
    })
}

fn leave_event(member: &str, from: &str) -> GatewayEvent {
    GatewayEvent::Presence(PresenceChange {
        guild_id: gid(),
        member: profile(member),
        old_channel: Some(cid(from)),
        new_channel: None,
    })
}

/// Starts a service with one stock entry channel called `lobby`.
fn start(
    gateway: Arc<MemoryGateway>,
) -> (RoomServiceHandle, mpsc::Sender<GatewayEvent>) {
    let service = RoomService::<MemoryGateway>::builder()
        .entry(EntryChannelConfig::new(cid("lobby"), gid()))
        .build(gateway)
        .expect("service should build");

    let (events_tx, events_rx) = mpsc::channel(16);
    let handle = service.run(events_rx);
    (handle, events_tx)
}

/// Lets the service task catch up on queued events.
async fn drain() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_event_creates_room() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway.clone());

    events.send(join_event("maria", "lobby")).await.unwrap();
    drain().await;

    assert_eq!(handle.total_rooms().await.unwrap(), 1);
    assert_eq!(gateway.created(), vec![(cid("room-1"), "#1 maria".into())]);

    let room = handle
        .find_room_for_member(MemberId::new("maria"))
        .await
        .unwrap()
        .expect("maria should own a room");
    assert_eq!(room.channel_id, cid("room-1"));
}

#[tokio::test]
async fn test_leave_event_reclaims_room() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway.clone());

    events.send(join_event("maria", "lobby")).await.unwrap();
    events.send(leave_event("maria", "room-1")).await.unwrap();
    drain().await;

    assert_eq!(handle.total_rooms().await.unwrap(), 0);
    assert_eq!(gateway.deleted(), vec![cid("room-1")]);
}

#[tokio::test]
async fn test_channel_deleted_event_retires_entry() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway.clone());

    events
        .send(GatewayEvent::ChannelDeleted {
            channel_id: cid("lobby"),
            kind: ChannelKind::Voice,
        })
        .await
        .unwrap();
    // A join after the entry is gone finds nothing to react to.
    events.send(join_event("maria", "lobby")).await.unwrap();
    drain().await;

    assert_eq!(handle.total_rooms().await.unwrap(), 0);
    assert!(gateway.created().is_empty());
}

#[tokio::test]
async fn test_register_entry_through_handle() {
    let gateway = MemoryGateway::new();
    let service = RoomService::<MemoryGateway>::builder()
        .build(gateway.clone())
        .expect("service should build");
    let (events_tx, events_rx) = mpsc::channel(16);
    let handle = service.run(events_rx);

    handle
        .register_entry(EntryChannelConfig::new(cid("lobby"), gid()))
        .await
        .unwrap();
    events_tx.send(join_event("maria", "lobby")).await.unwrap();
    drain().await;

    assert_eq!(handle.total_rooms().await.unwrap(), 1);
}

#[tokio::test]
async fn test_deregister_entry_through_handle() {
    let gateway = MemoryGateway::new();
    let (handle, _events) = start(gateway);

    assert!(handle.deregister_entry(cid("lobby")).await.unwrap());
    assert!(!handle.deregister_entry(cid("lobby")).await.unwrap());
}

#[tokio::test]
async fn test_global_predicate_vetoes_reclaim() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway.clone());

    handle
        .add_global_predicate(DeletionPredicate::custom(|_| false))
        .await
        .unwrap();

    events.send(join_event("maria", "lobby")).await.unwrap();
    events.send(leave_event("maria", "room-1")).await.unwrap();
    drain().await;

    // Every predicate must agree before a room goes away.
    assert_eq!(handle.total_rooms().await.unwrap(), 1);
    assert!(gateway.deleted().is_empty());
}

#[tokio::test]
async fn test_list_rooms_through_handle() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway);

    events.send(join_event("maria", "lobby")).await.unwrap();
    events.send(join_event("bob", "lobby")).await.unwrap();
    drain().await;

    let rooms = handle.list_rooms(cid("lobby")).await.unwrap();
    let names: Vec<_> = rooms.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["#1 maria", "#2 bob"]);
}

#[tokio::test]
async fn test_member_room_channel_through_handle() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway.clone());

    events.send(join_event("maria", "lobby")).await.unwrap();
    drain().await;
    gateway.set_occupants(
        &cid("room-1"),
        vec![Occupant {
            member_id: MemberId::new("maria"),
            bot: false,
        }],
    );

    let snapshot = handle
        .member_room_channel(MemberId::new("maria"))
        .await
        .unwrap();
    assert_eq!(snapshot.id, cid("room-1"));
    assert_eq!(snapshot.occupants.len(), 1);

    let missing = handle.member_room_channel(MemberId::new("bob")).await;
    assert!(matches!(
        missing,
        Err(VestibuleError::Room(RoomError::NoRoomForMember(_)))
    ));
}

#[tokio::test]
async fn test_shutdown_stops_the_service() {
    let gateway = MemoryGateway::new();
    let (handle, _events) = start(gateway);

    handle.shutdown().await.unwrap();
    drain().await;

    assert!(matches!(
        handle.total_rooms().await,
        Err(VestibuleError::ServiceClosed)
    ));
}

#[tokio::test]
async fn test_event_stream_ending_stops_the_service() {
    let gateway = MemoryGateway::new();
    let (handle, events) = start(gateway);

    drop(events);
    drain().await;

    assert!(matches!(
        handle.total_rooms().await,
        Err(VestibuleError::ServiceClosed)
    ));
}

#[tokio::test]
async fn test_build_rejects_deaf_gateway() {
    let result = RoomService::<MemoryGateway>::builder().build(MemoryGateway::deaf());
    assert!(matches!(result, Err(ConfigError::MissingCapability(_))));
}

#[tokio::test]
async fn test_config_document_end_to_end() {
    let gateway = MemoryGateway::new();
    let config = ResolvedConfig::from_json(
        r#"{
            "guild_id": "414159265358979323",
            "entries": [{
                "entry_channel_id": "561803398874989484",
                "naming": "owner-call"
            }]
        }"#,
    )
    .unwrap();

    let service = RoomService::<MemoryGateway>::builder()
        .with_config(config)
        .unwrap()
        .build(gateway.clone())
        .expect("service should build");
    let (events_tx, events_rx) = mpsc::channel(16);
    let handle = service.run(events_rx);

    events_tx
        .send(join_event("maria", "561803398874989484"))
        .await
        .unwrap();
    drain().await;

    assert_eq!(handle.total_rooms().await.unwrap(), 1);
    assert_eq!(
        gateway.created(),
        vec![(cid("room-1"), "maria's call".into())]
    );
}
