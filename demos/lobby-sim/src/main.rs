//! Lobby simulation: the room service wired to an in-memory platform.
//!
//! `SimGateway` plays the part of the chat platform. It keeps channel
//! and member state in a mutex, and every mutation it performs is echoed
//! back on the event stream, whether the service asked for it or one of
//! the scripted "users" below did. A real gateway connection echoes the
//! service's own actions the same way.
//!
//! Run it with logging to watch the reconciler work:
//!
//! ```text
//! RUST_LOG=info cargo run -p lobby-sim
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use vestibule::{
    ChannelId, ChannelKind, ChannelSnapshot, Gateway, GatewayError, GatewayEvent,
    GuildId, MemberId, MemberProfile, Occupant, PresenceChange, ResolvedConfig,
    RoomService,
};

const GUILD: &str = "992345678901234567";
const LOBBY: &str = "981234567890123456";
const CATEGORY: &str = "974321098765432109";

const CONFIG_DOC: &str = r#"{
    "guild_id": "992345678901234567",
    "entries": [
        {
            "entry_channel_id": "981234567890123456",
            "category_id": "974321098765432109",
            "naming": "numbered",
            "deletion": ["when-empty"]
        }
    ]
}"#;

// =========================================================================
// Simulated platform
// =========================================================================

#[derive(Default)]
struct SimState {
    channels: HashMap<ChannelId, ChannelSnapshot>,
    locations: HashMap<MemberId, Option<ChannelId>>,
    profiles: HashMap<MemberId, MemberProfile>,
}

impl SimState {
    /// Moves a member between channels and returns the presence event a
    /// real platform would broadcast for it.
    fn relocate(
        &mut self,
        guild: &GuildId,
        member: &MemberId,
        to: Option<ChannelId>,
    ) -> Option<PresenceChange> {
        let profile = self.profiles.get(member)?.clone();
        let old = self.locations.get(member).cloned().flatten();
        if old == to {
            return None;
        }

        if let Some(old_id) = &old {
            if let Some(snapshot) = self.channels.get_mut(old_id) {
                snapshot.occupants.retain(|o| o.member_id != *member);
            }
        }
        if let Some(new_id) = &to {
            if let Some(snapshot) = self.channels.get_mut(new_id) {
                snapshot.occupants.push(Occupant {
                    member_id: member.clone(),
                    bot: profile.bot,
                });
            }
        }
        self.locations.insert(member.clone(), to.clone());

        Some(PresenceChange {
            guild_id: guild.clone(),
            member: profile,
            old_channel: old,
            new_channel: to,
        })
    }
}

struct SimGateway {
    guild: GuildId,
    state: Mutex<SimState>,
    events: mpsc::UnboundedSender<GatewayEvent>,
}

impl SimGateway {
    fn new(guild: GuildId, events: mpsc::UnboundedSender<GatewayEvent>) -> Arc<Self> {
        Arc::new(Self {
            guild,
            state: Mutex::new(SimState::default()),
            events,
        })
    }

    /// Seeds a pre-existing channel, like the ops-created lobby.
    fn add_channel(&self, id: &str, kind: ChannelKind) {
        let id = ChannelId::new(id);
        self.state.lock().unwrap().channels.insert(
            id.clone(),
            ChannelSnapshot {
                id,
                kind,
                occupants: vec![],
            },
        );
    }

    /// A user connects to a voice channel.
    fn user_joins(&self, member_id: &str, display_name: &str, channel: &str) {
        let member = MemberId::new(member_id);
        let event = {
            let mut state = self.state.lock().unwrap();
            state.profiles.insert(
                member.clone(),
                MemberProfile {
                    id: member.clone(),
                    display_name: display_name.to_string(),
                    bot: false,
                },
            );
            state.relocate(&self.guild, &member, Some(ChannelId::new(channel)))
        };
        if let Some(change) = event {
            let _ = self.events.send(GatewayEvent::Presence(change));
        }
    }

    /// A user drops off voice entirely.
    fn user_disconnects(&self, member_id: &str) {
        let member = MemberId::new(member_id);
        let event = {
            let mut state = self.state.lock().unwrap();
            state.relocate(&self.guild, &member, None)
        };
        if let Some(change) = event {
            let _ = self.events.send(GatewayEvent::Presence(change));
        }
    }

    fn channel_count(&self) -> usize {
        self.state.lock().unwrap().channels.len()
    }

    fn mint_id() -> ChannelId {
        let mut rng = rand::rng();
        let id: u64 = rng.random_range(100_000_000_000_000_000..=999_999_999_999_999_999);
        ChannelId::new(id.to_string())
    }
}

impl Gateway for SimGateway {
    async fn create_voice_channel(
        &self,
        _guild: &GuildId,
        name: &str,
        _category: Option<&ChannelId>,
        _reason: &str,
    ) -> Result<ChannelId, GatewayError> {
        let id = Self::mint_id();
        self.state.lock().unwrap().channels.insert(
            id.clone(),
            ChannelSnapshot {
                id: id.clone(),
                kind: ChannelKind::Voice,
                occupants: vec![],
            },
        );
        tracing::info!(channel = %id, name, "sim: voice channel created");
        Ok(id)
    }

    async fn move_member(
        &self,
        _guild: &GuildId,
        member: &MemberId,
        channel: &ChannelId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        let event = {
            let mut state = self.state.lock().unwrap();
            if !state.profiles.contains_key(member) {
                return Err(GatewayError::MemberGone(member.clone()));
            }
            state.relocate(&self.guild, member, Some(channel.clone()))
        };
        tracing::info!(%member, channel = %channel, "sim: member moved");
        if let Some(change) = event {
            let _ = self.events.send(GatewayEvent::Presence(change));
        }
        Ok(())
    }

    async fn delete_channel(
        &self,
        channel: &ChannelId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        let (kind, kicked) = {
            let mut state = self.state.lock().unwrap();
            let Some(snapshot) = state.channels.remove(channel) else {
                return Err(GatewayError::AlreadyDeleted(channel.clone()));
            };
            let mut kicked = Vec::new();
            for occupant in &snapshot.occupants {
                kicked.push(state.relocate(&self.guild, &occupant.member_id, None));
            }
            (snapshot.kind, kicked)
        };
        tracing::info!(channel = %channel, "sim: channel deleted");
        for change in kicked.into_iter().flatten() {
            let _ = self.events.send(GatewayEvent::Presence(change));
        }
        let _ = self.events.send(GatewayEvent::ChannelDeleted {
            channel_id: channel.clone(),
            kind,
        });
        Ok(())
    }

    async fn fetch_channel(
        &self,
        channel: &ChannelId,
    ) -> Result<ChannelSnapshot, GatewayError> {
        self.state
            .lock()
            .unwrap()
            .channels
            .get(channel)
            .cloned()
            .ok_or_else(|| GatewayError::ChannelNotFound(channel.clone()))
    }
}

// =========================================================================
// Script
// =========================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vestibule::init_tracing();

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let gateway = SimGateway::new(GuildId::new(GUILD), events_tx);
    gateway.add_channel(CATEGORY, ChannelKind::Category);
    gateway.add_channel(LOBBY, ChannelKind::Voice);

    let config = ResolvedConfig::from_json(CONFIG_DOC)?;
    let service = RoomService::<SimGateway>::builder()
        .with_config(config)?
        .build(gateway.clone())?;
    let handle = service.run(events_rx);

    tracing::info!("alice and bob wander into the lobby");
    gateway.user_joins("910000000000000001", "alice", LOBBY);
    tokio::time::sleep(Duration::from_millis(50)).await;
    gateway.user_joins("910000000000000002", "bob", LOBBY);
    tokio::time::sleep(Duration::from_millis(50)).await;

    for room in handle.list_rooms(ChannelId::new(LOBBY)).await? {
        tracing::info!(
            room = %room.channel_id,
            name = %room.name,
            owner = %room.owner,
            "room is up"
        );
    }

    tracing::info!("alice hangs up");
    gateway.user_disconnects("910000000000000001");
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!("bob hangs up");
    gateway.user_disconnects("910000000000000002");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let remaining = handle.total_rooms().await?;
    tracing::info!(
        rooms = remaining,
        channels = gateway.channel_count(),
        "all quiet, rooms reclaimed"
    );

    handle.shutdown().await?;
    Ok(())
}
